// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{ClearWorkload, NullWorkload, SlowLoadWorkload};
use crate::config::WorkloadRegistry;

/// Factory for the built-in (in-process) workloads
///
/// - "Clear" -> ClearWorkload (device clear + readback)
/// - "Null" -> NullWorkload (lifecycle only)
/// - "SlowLoad" -> SlowLoadWorkload (progress simulation)
pub struct LocalWorkloadFactory;

impl LocalWorkloadFactory {
    pub const CLEAR: &'static str = "Clear";
    pub const NULL: &'static str = "Null";
    pub const SLOW_LOAD: &'static str = "SlowLoad";

    /// A registry holding every built-in workload.
    pub fn registry() -> WorkloadRegistry {
        WorkloadRegistry::new()
            .with(Self::CLEAR, || Box::new(ClearWorkload::new()))
            .with(Self::NULL, || Box::new(NullWorkload::new()))
            .with(Self::SLOW_LOAD, || Box::new(SlowLoadWorkload::new()))
    }
}
