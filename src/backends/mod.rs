// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Backend implementations for the kiln engine.
//!
//! The engine only talks to the traits in [`crate::traits`]; backends supply
//! the concrete devices and workloads behind them.
//!
//! # Available Backends
//!
//! ## Software Backend
//! An in-process graphics instance whose devices rasterize on the CPU:
//! - **Devices**: configurable names, UUIDs, device types and submit latency
//! - **Synchronization**: fences with bounded waits, like a real driver
//! - **Use Case**: running the engine without a GPU, testing device selection
//!
//! ## Local Backend
//! Built-in workloads registered by name:
//! - **Clear**: clears the render target and reads it back every frame
//! - **Null**: reports its lifecycle and renders nothing
//! - **SlowLoad**: reports loading progress across many frames
//!
//! ## Stub Backend (Test-Only)
//! Workloads that record their calls or fail on purpose. Only available in
//! test builds.
//!
//! # Architecture
//!
//! ```text
//! InstanceProvider → GraphicsInstance → PhysicalDevice → LogicalDevice
//! WorkloadRegistry → Workload (renders through a LogicalDevice)
//! ```
//!
//! # Examples
//!
//! ```rust
//! use kiln::backends::local::LocalWorkloadFactory;
//! use kiln::traits::Workload;
//!
//! let registry = LocalWorkloadFactory::registry();
//! let workload = registry.instantiate("Clear").expect("Clear is built in");
//! assert_eq!(workload.name(), "Clear");
//! assert!(registry.instantiate("Mandelbrot").is_none());
//! ```

pub mod local;
pub mod software;
#[cfg(test)]
pub mod stub;
