// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::events::EventBus;
use crate::errors::WorkloadError;
use crate::traits::workload::{LifecycleStatus, Workload, WorkloadContext, WorkloadEvent};

/// A workload that touches nothing and leaves the output as it found it.
pub struct NullWorkload {
    events: EventBus<WorkloadEvent>,
}

impl NullWorkload {
    pub fn new() -> Self {
        Self {
            events: EventBus::new(),
        }
    }
}

impl Default for NullWorkload {
    fn default() -> Self {
        Self::new()
    }
}

impl Workload for NullWorkload {
    fn name(&self) -> &str {
        super::LocalWorkloadFactory::NULL
    }

    fn events(&self) -> &EventBus<WorkloadEvent> {
        &self.events
    }

    fn start(&mut self, _context: &WorkloadContext<'_>) -> Result<(), WorkloadError> {
        self.events.lifecycle(LifecycleStatus::Initialized, 0.0);
        self.events.lifecycle(LifecycleStatus::Started, 1.0);
        self.events.lifecycle(LifecycleStatus::Running, 1.0);
        Ok(())
    }

    fn on_resize(&mut self, _context: &WorkloadContext<'_>) -> Result<(), WorkloadError> {
        Ok(())
    }

    fn render(
        &mut self,
        _context: &WorkloadContext<'_>,
        _output: &mut [u8],
    ) -> Result<(), WorkloadError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), WorkloadError> {
        self.events.lifecycle(LifecycleStatus::Stopped, 1.0);
        Ok(())
    }
}
