// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod registry;

pub mod consts;

pub use loader::{load_and_validate_config, load_config, parse_config, validate, EngineConfig};
pub use registry::{WorkloadConstructor, WorkloadRegistry};
