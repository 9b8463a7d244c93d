// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod device;
mod engine;
mod preferences;
mod workload;

pub use config::ConfigError;
pub use device::DeviceError;
pub use engine::EngineError;
pub use preferences::PreferencesError;
pub use workload::WorkloadError;
