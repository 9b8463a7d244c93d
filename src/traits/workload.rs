// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use crate::engine::events::EventBus;
use crate::engine::surface::BYTES_PER_PIXEL;
use crate::errors::WorkloadError;
use crate::traits::device::PhysicalDevice;

/// Where a workload is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStatus {
    Initialized,
    Loading,
    Started,
    Running,
    Stopped,
}

/// Events emitted on a workload's own stream.
#[derive(Debug, Clone)]
pub enum WorkloadEvent {
    Lifecycle {
        status: LifecycleStatus,
        /// Always within `[0, 1]`.
        progress: f64,
        message: String,
    },
    Error(Arc<WorkloadError>),
}

impl WorkloadEvent {
    /// Build a lifecycle event, clamping progress into `[0, 1]`.
    pub fn lifecycle(status: LifecycleStatus, progress: f64, message: impl Into<String>) -> Self {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        WorkloadEvent::Lifecycle {
            status,
            progress,
            message: message.into(),
        }
    }
}

impl EventBus<WorkloadEvent> {
    /// Publish a lifecycle event with an empty message.
    pub fn lifecycle(&self, status: LifecycleStatus, progress: f64) {
        self.publish(WorkloadEvent::lifecycle(status, progress, ""));
    }
}

/// What a workload can see of the engine while it runs.
pub struct WorkloadContext<'a> {
    device: &'a Arc<dyn PhysicalDevice>,
    width: u32,
    height: u32,
    sync_timeout: Duration,
}

impl<'a> WorkloadContext<'a> {
    pub fn new(
        device: &'a Arc<dyn PhysicalDevice>,
        width: u32,
        height: u32,
        sync_timeout: Duration,
    ) -> Self {
        Self {
            device,
            width,
            height,
            sync_timeout,
        }
    }

    pub fn device(&self) -> &Arc<dyn PhysicalDevice> {
        self.device
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Upper bound for any single device-synchronization wait.
    pub fn sync_timeout(&self) -> Duration {
        self.sync_timeout
    }

    /// Size in bytes of the output buffer handed to `render`.
    pub fn buffer_len(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }
}

/// A pluggable unit of device work.
///
/// Workloads are driven exclusively from the engine worker thread. Failure
/// bookkeeping (the failed flag, Error events, ignoring calls after a
/// failure) is done by the engine around these calls, so implementations
/// just return errors.
pub trait Workload: Send {
    fn name(&self) -> &str;

    /// The workload's own event stream.
    fn events(&self) -> &EventBus<WorkloadEvent>;

    fn start(&mut self, context: &WorkloadContext<'_>) -> Result<(), WorkloadError>;

    /// Called after the viewport was replaced, before the next render.
    fn on_resize(&mut self, context: &WorkloadContext<'_>) -> Result<(), WorkloadError>;

    /// Render one frame into `output` (`context.buffer_len()` BGRA bytes).
    fn render(&mut self, context: &WorkloadContext<'_>, output: &mut [u8])
        -> Result<(), WorkloadError>;

    /// Release everything the workload holds. Called exactly once.
    fn close(&mut self) -> Result<(), WorkloadError>;
}
