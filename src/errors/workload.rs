// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by workloads during their lifecycle.

use crate::errors::DeviceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkloadError {
    /// A device operation failed underneath the workload.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// The workload was asked to render or resize before it was started.
    #[error("Workload '{workload}' used before start")]
    NotStarted { workload: String },

    /// The output buffer handed to render does not match the viewport.
    #[error("Workload '{workload}' got a {actual} byte output buffer, expected {expected}")]
    OutputSize {
        workload: String,
        expected: usize,
        actual: usize,
    },

    /// Any other workload-specific failure.
    #[error("Workload '{workload}' failed: {reason}")]
    Failed { workload: String, reason: String },
}
