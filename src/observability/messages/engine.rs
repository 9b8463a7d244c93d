// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the engine worker and its command queue.
//!
//! This module contains message types for logging events related to:
//! * Worker thread start and teardown
//! * Commands that completed with an error
//! * Viewport, device and frame changes applied by the worker

use crate::engine::DeviceSelection;
use crate::errors::EngineError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// The worker thread entered its loop.
///
/// # Log Level
/// `info!` - Important operational event
pub struct WorkerStarted<'a> {
    pub thread_name: &'a str,
    pub idle_wait: Duration,
}

impl Display for WorkerStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Engine worker '{}' started: idle_wait={:?}",
            self.thread_name, self.idle_wait
        )
    }
}

impl StructuredLog for WorkerStarted<'_> {
    fn log(&self) {
        tracing::info!(
            thread_name = self.thread_name,
            idle_wait_ms = self.idle_wait.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "engine_worker",
            span_name = name,
            thread_name = self.thread_name,
        )
    }
}

/// The stop flag was seen and the queue closed.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use kiln::observability::messages::engine::WorkerStopping;
///
/// let msg = WorkerStopping { abandoned: 2 };
///
/// assert_eq!(msg.to_string(), "Engine worker stopping: 2 queued commands abandoned");
/// ```
pub struct WorkerStopping {
    pub abandoned: usize,
}

impl Display for WorkerStopping {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Engine worker stopping: {} queued commands abandoned",
            self.abandoned
        )
    }
}

impl StructuredLog for WorkerStopping {
    fn log(&self) {
        tracing::info!(abandoned = self.abandoned, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("worker_stopping", span_name = name, abandoned = self.abandoned)
    }
}

/// Teardown finished; every resource the worker held is released.
pub struct WorkerStopped;

impl Display for WorkerStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Engine worker stopped")
    }
}

impl StructuredLog for WorkerStopped {
    fn log(&self) {
        tracing::info!("{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("worker_stopped", span_name = name)
    }
}

/// A caller asked the engine to stop.
pub struct EngineShutdownRequested;

impl Display for EngineShutdownRequested {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Engine shutdown requested")
    }
}

impl StructuredLog for EngineShutdownRequested {
    fn log(&self) {
        tracing::info!("{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("engine_shutdown", span_name = name)
    }
}

/// A queued command completed with an error.
///
/// # Log Level
/// `warn!` - The caller receives the error; the engine keeps running
pub struct CommandFailed<'a> {
    pub command: &'static str,
    pub error: &'a EngineError,
}

impl Display for CommandFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Command '{}' failed: {}", self.command, self.error)
    }
}

impl StructuredLog for CommandFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            command = self.command,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "command_failed",
            span_name = name,
            command = self.command,
            error = %self.error,
        )
    }
}

/// A new viewport buffer replaced the previous one.
///
/// # Log Level
/// `debug!` - Frequent while a window is being dragged
pub struct ViewportResized {
    pub width: u32,
    pub height: u32,
}

impl Display for ViewportResized {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Viewport resized to {}x{}", self.width, self.height)
    }
}

impl StructuredLog for ViewportResized {
    fn log(&self) {
        tracing::debug!(width = self.width, height = self.height, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "viewport_resized",
            span_name = name,
            width = self.width,
            height = self.height,
        )
    }
}

/// A device selection was resolved and became current.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DeviceApplied<'a> {
    pub requested: &'a DeviceSelection,
    pub applied: &'a DeviceSelection,
}

impl Display for DeviceApplied<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Device '{}' applied for requested '{}'",
            self.applied.name, self.requested.name
        )
    }
}

impl StructuredLog for DeviceApplied<'_> {
    fn log(&self) {
        tracing::info!(
            requested = %self.requested.name,
            applied = %self.applied.name,
            uuid = ?self.applied.uuid,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "device_applied",
            span_name = name,
            applied = %self.applied.name,
        )
    }
}

/// The persisted device selection is being replayed at startup.
pub struct DeviceSelectionReplayed<'a> {
    pub selection: &'a DeviceSelection,
}

impl Display for DeviceSelectionReplayed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Replaying saved device selection '{}'", self.selection.name)
    }
}

impl StructuredLog for DeviceSelectionReplayed<'_> {
    fn log(&self) {
        tracing::info!(
            device = %self.selection.name,
            uuid = ?self.selection.uuid,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "device_replay",
            span_name = name,
            device = %self.selection.name,
        )
    }
}

/// One render tick completed.
///
/// # Log Level
/// `trace!` - Emitted every frame
pub struct FrameRendered {
    pub elapsed: Duration,
}

impl Display for FrameRendered {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Frame rendered in {:?}", self.elapsed)
    }
}

impl StructuredLog for FrameRendered {
    fn log(&self) {
        tracing::trace!(elapsed_us = self.elapsed.as_micros() as u64, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "frame",
            span_name = name,
            elapsed_us = self.elapsed.as_micros() as u64,
        )
    }
}
