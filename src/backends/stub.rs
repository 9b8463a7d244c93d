// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex};

use crate::engine::events::EventBus;
use crate::errors::WorkloadError;
use crate::traits::workload::{LifecycleStatus, Workload, WorkloadContext, WorkloadEvent};

/// Shared, ordered record of workload calls ("A.start", "A.close", ...).
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

/// A workload that records every call in a [`Journal`]
pub struct RecordingWorkload {
    name: String,
    journal: Journal,
    events: EventBus<WorkloadEvent>,
}

impl RecordingWorkload {
    pub fn new(name: &str, journal: Journal) -> Self {
        Self {
            name: name.to_string(),
            journal,
            events: EventBus::new(),
        }
    }

    fn record(&self, call: &str) {
        self.journal.record(format!("{}.{}", self.name, call));
    }
}

impl Workload for RecordingWorkload {
    fn name(&self) -> &str {
        &self.name
    }

    fn events(&self) -> &EventBus<WorkloadEvent> {
        &self.events
    }

    fn start(&mut self, _context: &WorkloadContext<'_>) -> Result<(), WorkloadError> {
        self.record("start");
        self.events.lifecycle(LifecycleStatus::Started, 1.0);
        Ok(())
    }

    fn on_resize(&mut self, context: &WorkloadContext<'_>) -> Result<(), WorkloadError> {
        self.record(&format!("resize({}x{})", context.width(), context.height()));
        Ok(())
    }

    fn render(
        &mut self,
        _context: &WorkloadContext<'_>,
        _output: &mut [u8],
    ) -> Result<(), WorkloadError> {
        self.record("render");
        Ok(())
    }

    fn close(&mut self) -> Result<(), WorkloadError> {
        self.record("close");
        self.events.lifecycle(LifecycleStatus::Stopped, 1.0);
        Ok(())
    }
}

fn simulated(workload: &str, reason: &str) -> WorkloadError {
    WorkloadError::Failed {
        workload: workload.to_string(),
        reason: reason.to_string(),
    }
}

/// A workload whose start always fails
pub struct FailingStartWorkload {
    events: EventBus<WorkloadEvent>,
}

impl FailingStartWorkload {
    pub fn new() -> Self {
        Self {
            events: EventBus::new(),
        }
    }
}

impl Workload for FailingStartWorkload {
    fn name(&self) -> &str {
        "BadStart"
    }

    fn events(&self) -> &EventBus<WorkloadEvent> {
        &self.events
    }

    fn start(&mut self, _context: &WorkloadContext<'_>) -> Result<(), WorkloadError> {
        Err(simulated(self.name(), "simulated start failure"))
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
        Ok(())
    }
}

/// A workload that renders a marker byte once, then fails every render.
pub struct FailingRenderWorkload {
    events: EventBus<WorkloadEvent>,
    frames: usize,
    fail_after: usize,
}

impl FailingRenderWorkload {
    pub fn new() -> Self {
        Self::failing_after(0)
    }

    /// Succeed for `frames` renders, then fail.
    pub fn failing_after(frames: usize) -> Self {
        Self {
            events: EventBus::new(),
            frames: 0,
            fail_after: frames,
        }
    }
}

impl Workload for FailingRenderWorkload {
    fn name(&self) -> &str {
        "BadRender"
    }

    fn events(&self) -> &EventBus<WorkloadEvent> {
        &self.events
    }

    fn start(&mut self, _context: &WorkloadContext<'_>) -> Result<(), WorkloadError> {
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
        if self.frames >= self.fail_after {
            return Err(simulated(self.name(), "simulated render failure"));
        }
        self.frames += 1;
        if let Some(first) = output.first_mut() {
            *first = self.frames as u8;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), WorkloadError> {
        Ok(())
    }
}

/// A workload whose close always fails
pub struct FailingCloseWorkload {
    events: EventBus<WorkloadEvent>,
}

impl FailingCloseWorkload {
    pub fn new() -> Self {
        Self {
            events: EventBus::new(),
        }
    }
}

impl Workload for FailingCloseWorkload {
    fn name(&self) -> &str {
        "BadClose"
    }

    fn events(&self) -> &EventBus<WorkloadEvent> {
        &self.events
    }

    fn start(&mut self, _context: &WorkloadContext<'_>) -> Result<(), WorkloadError> {
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
        Err(simulated(self.name(), "simulated close failure"))
    }
}

/// A workload whose resize hook always fails
pub struct FailingResizeWorkload {
    events: EventBus<WorkloadEvent>,
}

impl FailingResizeWorkload {
    pub fn new() -> Self {
        Self {
            events: EventBus::new(),
        }
    }
}

impl Workload for FailingResizeWorkload {
    fn name(&self) -> &str {
        "BadResize"
    }

    fn events(&self) -> &EventBus<WorkloadEvent> {
        &self.events
    }

    fn start(&mut self, _context: &WorkloadContext<'_>) -> Result<(), WorkloadError> {
        Ok(())
    }

    fn on_resize(&mut self, _context: &WorkloadContext<'_>) -> Result<(), WorkloadError> {
        Err(simulated(self.name(), "simulated resize failure"))
    }

    fn render(
        &mut self,
        _context: &WorkloadContext<'_>,
        _output: &mut [u8],
    ) -> Result<(), WorkloadError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), WorkloadError> {
        Ok(())
    }
}
