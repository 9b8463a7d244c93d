// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for workload lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Selecting, starting and closing workloads
//! * Workload failures in any stage
//! * Render target setup inside built-in workloads

use crate::errors::WorkloadError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A selection named a workload that is not registered.
///
/// # Log Level
/// `warn!` - The request is a no-op
pub struct UnknownWorkload<'a> {
    pub workload: &'a str,
}

impl Display for UnknownWorkload<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "No workload registered as '{}'", self.workload)
    }
}

impl StructuredLog for UnknownWorkload<'_> {
    fn log(&self) {
        tracing::warn!(workload = self.workload, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("unknown_workload", span_name = name, workload = self.workload)
    }
}

/// A workload started and now occupies the slot.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use kiln::observability::messages::workload::WorkloadStarted;
///
/// let msg = WorkloadStarted {
///     workload: "Clear",
///     width: 640,
///     height: 480,
/// };
///
/// assert_eq!(msg.to_string(), "Workload 'Clear' started at 640x480");
/// ```
pub struct WorkloadStarted<'a> {
    pub workload: &'a str,
    pub width: u32,
    pub height: u32,
}

impl Display for WorkloadStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Workload '{}' started at {}x{}",
            self.workload, self.width, self.height
        )
    }
}

impl StructuredLog for WorkloadStarted<'_> {
    fn log(&self) {
        tracing::info!(
            workload = self.workload,
            width = self.width,
            height = self.height,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "workload",
            span_name = name,
            workload = self.workload,
            width = self.width,
            height = self.height,
        )
    }
}

/// A workload released its resources.
pub struct WorkloadClosed<'a> {
    pub workload: &'a str,
}

impl Display for WorkloadClosed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Workload '{}' closed", self.workload)
    }
}

impl StructuredLog for WorkloadClosed<'_> {
    fn log(&self) {
        tracing::info!(workload = self.workload, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("workload_closed", span_name = name, workload = self.workload)
    }
}

/// Closing a workload failed. The slot is cleared regardless.
///
/// # Log Level
/// `warn!` - Resources may have leaked but the engine continues
pub struct WorkloadCloseFailed<'a> {
    pub workload: &'a str,
    pub reason: &'a str,
}

impl Display for WorkloadCloseFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Workload '{}' failed to close: {}", self.workload, self.reason)
    }
}

impl StructuredLog for WorkloadCloseFailed<'_> {
    fn log(&self) {
        tracing::warn!(workload = self.workload, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "workload_close_failed",
            span_name = name,
            workload = self.workload,
            reason = self.reason,
        )
    }
}

/// A workload failed during `stage` and will not render again.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct WorkloadFailed<'a> {
    pub workload: &'a str,
    pub stage: &'static str,
    pub error: &'a WorkloadError,
}

impl Display for WorkloadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Workload '{}' failed during {}: {}",
            self.workload, self.stage, self.error
        )
    }
}

impl StructuredLog for WorkloadFailed<'_> {
    fn log(&self) {
        tracing::error!(
            workload = self.workload,
            stage = self.stage,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "workload_failed",
            span_name = name,
            workload = self.workload,
            stage = self.stage,
            error = %self.error,
        )
    }
}

/// A workload sized its render target.
///
/// # Log Level
/// `debug!` - Detail within a start or resize
pub struct RenderTargetConfigured<'a> {
    pub workload: &'a str,
    pub width: u32,
    pub height: u32,
}

impl Display for RenderTargetConfigured<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Workload '{}' configured a {}x{} render target",
            self.workload, self.width, self.height
        )
    }
}

impl StructuredLog for RenderTargetConfigured<'_> {
    fn log(&self) {
        tracing::debug!(
            workload = self.workload,
            width = self.width,
            height = self.height,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "render_target",
            span_name = name,
            workload = self.workload,
        )
    }
}
