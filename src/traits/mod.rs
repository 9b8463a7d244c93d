// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod device;
pub mod service;
pub mod workload;

pub use device::{GraphicsInstance, InstanceProvider, LogicalDevice, PhysicalDevice};
pub use service::ExperimentService;
pub use workload::{Workload, WorkloadContext};
