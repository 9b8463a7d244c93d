// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors delivered through command futures.

use crate::errors::{DeviceError, PreferencesError, WorkloadError};
use std::sync::Arc;
use thiserror::Error;

/// The failure side of every engine command.
///
/// A command's error is only ever observed through that command's own
/// future; the execution loop keeps running regardless.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine stopped before the command could run.
    #[error("Engine is shutting down")]
    ShuttingDown,

    /// A workload was selected before the engine had somewhere to run it.
    #[error("Cannot start a workload without a {missing}")]
    NotReady { missing: &'static str },

    /// The requested viewport has no pixels or is too large to allocate.
    #[error("Invalid viewport size {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },

    /// The command panicked on the worker thread.
    #[error("Command panicked: {0}")]
    CommandPanicked(String),

    #[error(transparent)]
    Device(#[from] DeviceError),

    /// A workload failed while starting; the same error is also published
    /// on the event stream.
    #[error(transparent)]
    Workload(#[from] Arc<WorkloadError>),

    /// The preferences store could not be opened at startup.
    #[error(transparent)]
    Preferences(#[from] PreferencesError),

    /// The worker thread could not be spawned.
    #[error("Failed to spawn engine worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}
