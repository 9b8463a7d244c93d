// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by the graphics capability (instances, devices, fences).

use std::time::Duration;
use thiserror::Error;

/// Failures of the graphics binding the engine drives.
///
/// These reach callers only through the futures of `list_devices` and
/// `set_device`, or wrapped in a [`WorkloadError`](crate::errors::WorkloadError)
/// when a workload trips over them while rendering.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The underlying instance could not be created.
    #[error("Failed to create graphics instance: {0}")]
    InstanceCreation(String),

    /// A bounded device-synchronization wait expired.
    #[error("Device synchronization timed out after {0:?}")]
    Timeout(Duration),

    /// A fence was waited on that this device never issued.
    #[error("Unknown fence {0}")]
    UnknownFence(u64),

    /// A readback destination does not match the render target size.
    #[error("Readback buffer is {actual} bytes, render target needs {expected}")]
    ReadbackSize { expected: usize, actual: usize },

    /// Work was submitted before a render target was configured.
    #[error("Device '{0}' has no configured render target")]
    NoRenderTarget(String),
}
