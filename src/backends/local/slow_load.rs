// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::events::EventBus;
use crate::engine::surface::BYTES_PER_PIXEL;
use crate::errors::WorkloadError;
use crate::traits::workload::{LifecycleStatus, Workload, WorkloadContext, WorkloadEvent};

/// Progress added per rendered frame.
pub const PROGRESS_STEP: f64 = 0.002;

/// Simulates a long asset load.
///
/// Each frame advances progress by [`PROGRESS_STEP`] and reports it as
/// `Loading`. The frame after progress reaches 1.0 reports `Running` once;
/// after that no lifecycle events are emitted. The output is painted with a
/// blue channel proportional to progress.
pub struct SlowLoadWorkload {
    events: EventBus<WorkloadEvent>,
    progress: f64,
    announced_running: bool,
}

impl SlowLoadWorkload {
    pub fn new() -> Self {
        Self {
            events: EventBus::new(),
            progress: 0.0,
            announced_running: false,
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    fn advance(&mut self) {
        if self.progress >= 1.0 {
            if !self.announced_running {
                self.announced_running = true;
                self.events.lifecycle(LifecycleStatus::Running, 1.0);
            }
        } else {
            self.progress = (self.progress + PROGRESS_STEP).min(1.0);
            self.events.lifecycle(LifecycleStatus::Loading, self.progress);
        }
    }
}

impl Default for SlowLoadWorkload {
    fn default() -> Self {
        Self::new()
    }
}

impl Workload for SlowLoadWorkload {
    fn name(&self) -> &str {
        super::LocalWorkloadFactory::SLOW_LOAD
    }

    fn events(&self) -> &EventBus<WorkloadEvent> {
        &self.events
    }

    fn start(&mut self, _context: &WorkloadContext<'_>) -> Result<(), WorkloadError> {
        self.progress = 0.0;
        self.announced_running = false;
        self.events.lifecycle(LifecycleStatus::Initialized, 0.0);
        self.events.lifecycle(LifecycleStatus::Started, 1.0);
        Ok(())
    }

    fn on_resize(&mut self, _context: &WorkloadContext<'_>) -> Result<(), WorkloadError> {
        Ok(())
    }

    fn render(
        &mut self,
        _context: &WorkloadContext<'_>,
        output: &mut [u8],
    ) -> Result<(), WorkloadError> {
        self.advance();

        let blue = (self.progress * 255.0) as u8;
        for pixel in output.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel.copy_from_slice(&[blue, 0x00, 0x00, 0xFF]);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), WorkloadError> {
        self.events.lifecycle(LifecycleStatus::Stopped, 1.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::software::SoftwareInstanceProvider;
    use crate::traits::device::{InstanceProvider, PhysicalDevice};
    use std::sync::Arc;
    use std::time::Duration;

    fn lifecycle(events: Vec<WorkloadEvent>) -> Vec<(LifecycleStatus, f64)> {
        events
            .into_iter()
            .filter_map(|event| match event {
                WorkloadEvent::Lifecycle {
                    status, progress, ..
                } => Some((status, progress)),
                WorkloadEvent::Error(_) => None,
            })
            .collect()
    }

    fn device() -> Arc<dyn PhysicalDevice> {
        SoftwareInstanceProvider::default()
            .create_instance()
            .unwrap()
            .enumerate_devices()
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_progress_advances_then_running_is_announced_once() {
        let device = device();
        let context = WorkloadContext::new(&device, 1, 1, Duration::from_millis(10));
        let mut workload = SlowLoadWorkload::new();
        workload.start(&context).unwrap();
        let mut stream = workload.events().subscribe();
        let mut output = [0u8; 4];

        for _ in 0..600 {
            workload.render(&context, &mut output).unwrap();
        }

        let events = lifecycle(stream.drain());
        let loading: Vec<f64> = events
            .iter()
            .filter(|(status, _)| *status == LifecycleStatus::Loading)
            .map(|(_, progress)| *progress)
            .collect();
        assert!(loading.windows(2).all(|pair| pair[1] > pair[0]));
        assert_eq!(loading.last().copied(), Some(1.0));

        let running: Vec<_> = events
            .iter()
            .filter(|(status, _)| *status == LifecycleStatus::Running)
            .collect();
        assert_eq!(running, vec![&(LifecycleStatus::Running, 1.0)]);
        assert_eq!(events.last(), Some(&(LifecycleStatus::Running, 1.0)));
        assert_eq!(output, [0xFF, 0x00, 0x00, 0xFF]);
    }

    #[test]
    fn test_blue_channel_tracks_progress() {
        let device = device();
        let context = WorkloadContext::new(&device, 2, 1, Duration::from_millis(10));
        let mut workload = SlowLoadWorkload::new();
        workload.start(&context).unwrap();
        let mut output = [0u8; 8];

        for _ in 0..250 {
            workload.render(&context, &mut output).unwrap();
        }

        let expected = (workload.progress() * 255.0) as u8;
        assert_eq!(output, [expected, 0, 0, 0xFF, expected, 0, 0, 0xFF]);
        assert!((workload.progress() - 0.5).abs() < 1e-9);
    }
}
