// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! All diagnostic output goes through the message types in [`messages`].
//! Nothing in the crate calls `tracing::info!` with an ad-hoc string, so
//! every log line has a single definition with typed fields.
//!
//! Installing a subscriber is left to the binary; the library only emits.
//!
//! # Usage
//!
//! ```rust
//! use kiln::observability::messages::device::NoMatchingDevice;
//! use kiln::observability::messages::StructuredLog;
//! use kiln::engine::DeviceSelection;
//!
//! let selection = DeviceSelection::new("Missing Adapter");
//! NoMatchingDevice {
//!     selection: &selection,
//! }
//! .log();
//! ```

pub mod messages;
