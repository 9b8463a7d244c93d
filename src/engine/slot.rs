// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The single active-workload slot.
//!
//! At most one workload is live at a time. Switching always closes the
//! previous instance before the next one is constructed, and every
//! workload call is guarded here: an error or panic marks the workload
//! failed, publishes an Error event on its stream, and turns later
//! `on_resize`/`render` calls into no-ops.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::config::WorkloadRegistry;
use crate::engine::channel::panic_message;
use crate::engine::events::{EngineEvent, EventBus, Subscription};
use crate::errors::{EngineError, WorkloadError};
use crate::observability::messages::workload::{
    UnknownWorkload, WorkloadCloseFailed, WorkloadClosed, WorkloadFailed, WorkloadStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::workload::{Workload, WorkloadContext, WorkloadEvent};

#[derive(Debug, Clone, Copy)]
enum Stage {
    Start,
    Resize,
    Render,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::Resize => "resize",
            Stage::Render => "render",
        }
    }
}

struct ActiveWorkload {
    workload: Box<dyn Workload>,
    subscription: Option<Subscription>,
    failed: bool,
}

impl ActiveWorkload {
    fn name(&self) -> &str {
        self.workload.name()
    }

    fn guarded<F>(&mut self, stage: Stage, call: F) -> Result<(), Arc<WorkloadError>>
    where
        F: FnOnce(&mut dyn Workload) -> Result<(), WorkloadError>,
    {
        let workload = self.workload.as_mut();
        let error = match panic::catch_unwind(AssertUnwindSafe(|| call(workload))) {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(error)) => error,
            Err(payload) => WorkloadError::Failed {
                workload: self.name().to_string(),
                reason: format!("panicked during {}: {}", stage.as_str(), panic_message(payload.as_ref())),
            },
        };

        self.failed = true;
        let error = Arc::new(error);
        WorkloadFailed {
            workload: self.name(),
            stage: stage.as_str(),
            error: error.as_ref(),
        }
        .log();
        self.workload
            .events()
            .publish(WorkloadEvent::Error(Arc::clone(&error)));
        Err(error)
    }

    fn start(&mut self, context: &WorkloadContext<'_>) -> Result<(), Arc<WorkloadError>> {
        self.guarded(Stage::Start, |workload| workload.start(context))
    }

    fn resize(&mut self, context: &WorkloadContext<'_>) -> Result<(), Arc<WorkloadError>> {
        if self.failed {
            return Ok(());
        }
        self.guarded(Stage::Resize, |workload| workload.on_resize(context))
    }

    fn render(
        &mut self,
        context: &WorkloadContext<'_>,
        output: &mut [u8],
    ) -> Result<(), Arc<WorkloadError>> {
        if self.failed {
            return Ok(());
        }
        self.guarded(Stage::Render, |workload| workload.render(context, output))
    }

    /// Stop forwarding events, then release the workload.
    fn close(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }

        let workload = self.workload.as_mut();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| workload.close()));
        match outcome {
            Ok(Ok(())) => WorkloadClosed {
                workload: self.name(),
            }
            .log(),
            Ok(Err(error)) => WorkloadCloseFailed {
                workload: self.name(),
                reason: &error.to_string(),
            }
            .log(),
            Err(payload) => WorkloadCloseFailed {
                workload: self.name(),
                reason: &panic_message(payload.as_ref()),
            }
            .log(),
        }
    }
}

/// Holds the active workload, if any, and the registry it was built from.
pub struct WorkloadSlot {
    registry: Arc<WorkloadRegistry>,
    active: Option<ActiveWorkload>,
}

impl WorkloadSlot {
    pub fn new(registry: Arc<WorkloadRegistry>) -> Self {
        Self {
            registry,
            active: None,
        }
    }

    /// Switch to the workload registered as `name`.
    ///
    /// The current workload is always closed first. An unknown name leaves
    /// the slot empty and returns `Ok(false)`. `context` is only consulted
    /// for a known name; its error is returned as-is. A workload whose
    /// start fails is closed again and the slot stays empty.
    pub fn select(
        &mut self,
        name: &str,
        context: Result<WorkloadContext<'_>, EngineError>,
        events: &EventBus<EngineEvent>,
    ) -> Result<bool, EngineError> {
        self.close_active();

        if !self.registry.contains(name) {
            UnknownWorkload { workload: name }.log();
            return Ok(false);
        }
        let context = context?;
        let Some(workload) = self.registry.instantiate(name) else {
            return Ok(false);
        };

        let forward = events.clone();
        let subscription = workload
            .events()
            .subscribe_with(move |event: &WorkloadEvent| {
                forward.publish(EngineEvent::from(event.clone()));
                true
            });

        let mut active = ActiveWorkload {
            workload,
            subscription: Some(subscription),
            failed: false,
        };

        if let Err(error) = active.start(&context) {
            active.close();
            return Err(EngineError::Workload(error));
        }

        WorkloadStarted {
            workload: active.name(),
            width: context.width(),
            height: context.height(),
        }
        .log();
        events.publish(EngineEvent::WorkloadSelected(active.name().to_string()));
        self.active = Some(active);
        Ok(true)
    }

    pub fn close_active(&mut self) {
        if let Some(active) = self.active.take() {
            active.close();
        }
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_ref().map(ActiveWorkload::name)
    }

    /// True when a workload is present and has not failed.
    pub fn can_render(&self) -> bool {
        self.active.as_ref().is_some_and(|active| !active.failed)
    }

    pub fn is_failed(&self) -> bool {
        self.active.as_ref().is_some_and(|active| active.failed)
    }

    /// Notify the active workload of a new viewport.
    pub fn resize(&mut self, context: &WorkloadContext<'_>) -> Result<(), Arc<WorkloadError>> {
        match self.active.as_mut() {
            Some(active) => active.resize(context),
            None => Ok(()),
        }
    }

    /// Render one frame into `output`.
    pub fn render(
        &mut self,
        context: &WorkloadContext<'_>,
        output: &mut [u8],
    ) -> Result<(), Arc<WorkloadError>> {
        match self.active.as_mut() {
            Some(active) => active.render(context, output),
            None => Ok(()),
        }
    }
}

impl Drop for WorkloadSlot {
    fn drop(&mut self) {
        self.close_active();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::software::SoftwareInstanceProvider;
    use crate::backends::stub::{
        FailingCloseWorkload, FailingRenderWorkload, FailingStartWorkload, Journal,
        RecordingWorkload,
    };
    use crate::traits::device::{InstanceProvider, PhysicalDevice};
    use std::time::Duration;

    fn device() -> Arc<dyn PhysicalDevice> {
        let instance = SoftwareInstanceProvider::default().create_instance().unwrap();
        instance.enumerate_devices().unwrap().remove(0)
    }

    fn slot_with(journal: &Journal) -> WorkloadSlot {
        let registry = WorkloadRegistry::new()
            .with("A", {
                let journal = journal.clone();
                move || Box::new(RecordingWorkload::new("A", journal.clone()))
            })
            .with("B", {
                let journal = journal.clone();
                move || Box::new(RecordingWorkload::new("B", journal.clone()))
            })
            .with("BadStart", || Box::new(FailingStartWorkload::new()))
            .with("BadRender", || Box::new(FailingRenderWorkload::new()))
            .with("BadClose", || Box::new(FailingCloseWorkload::new()));
        WorkloadSlot::new(Arc::new(registry))
    }

    fn context(device: &Arc<dyn PhysicalDevice>) -> WorkloadContext<'_> {
        WorkloadContext::new(device, 2, 2, Duration::from_millis(50))
    }

    #[test]
    fn test_switch_closes_previous_before_starting_next() {
        let journal = Journal::default();
        let mut slot = slot_with(&journal);
        let device = device();
        let events = EventBus::new();

        assert!(slot.select("A", Ok(context(&device)), &events).unwrap());
        assert!(slot.select("B", Ok(context(&device)), &events).unwrap());

        assert_eq!(journal.entries(), vec!["A.start", "A.close", "B.start"]);
        assert_eq!(slot.active_name(), Some("B"));
    }

    #[test]
    fn test_unknown_name_closes_current_and_leaves_slot_empty() {
        let journal = Journal::default();
        let mut slot = slot_with(&journal);
        let device = device();
        let events = EventBus::new();
        slot.select("A", Ok(context(&device)), &events).unwrap();

        assert!(!slot.select("Nope", Ok(context(&device)), &events).unwrap());
        assert_eq!(journal.entries(), vec!["A.start", "A.close"]);
        assert_eq!(slot.active_name(), None);
    }

    #[test]
    fn test_missing_context_is_reported_after_closing() {
        let journal = Journal::default();
        let mut slot = slot_with(&journal);
        let device = device();
        let events = EventBus::new();
        slot.select("A", Ok(context(&device)), &events).unwrap();

        let result = slot.select("B", Err(EngineError::NotReady { missing: "viewport" }), &events);

        assert!(matches!(result, Err(EngineError::NotReady { missing: "viewport" })));
        assert_eq!(journal.entries(), vec!["A.start", "A.close"]);
    }

    #[test]
    fn test_failed_start_is_closed_and_reported() {
        let mut slot = slot_with(&Journal::default());
        let device = device();
        let events = EventBus::new();
        let mut stream = events.subscribe();

        let result = slot.select("BadStart", Ok(context(&device)), &events);

        assert!(matches!(result, Err(EngineError::Workload(_))));
        assert_eq!(slot.active_name(), None);
        let received = stream.drain();
        assert!(received
            .iter()
            .any(|event| matches!(event, EngineEvent::WorkloadError(_))));
        assert!(!received
            .iter()
            .any(|event| matches!(event, EngineEvent::WorkloadSelected(_))));
    }

    #[test]
    fn test_render_failure_freezes_workload() {
        let mut slot = slot_with(&Journal::default());
        let device = device();
        let events = EventBus::new();
        let mut stream = events.subscribe();
        slot.select("BadRender", Ok(context(&device)), &events).unwrap();
        let mut output = vec![0u8; 16];

        assert!(slot.render(&context(&device), &mut output).is_err());
        assert!(slot.is_failed());
        assert!(!slot.can_render());

        assert!(slot.render(&context(&device), &mut output).is_ok());
        assert!(slot.resize(&context(&device)).is_ok());

        let errors = stream
            .drain()
            .into_iter()
            .filter(|event| matches!(event, EngineEvent::WorkloadError(_)))
            .count();
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_close_failure_is_swallowed() {
        let journal = Journal::default();
        let mut slot = slot_with(&journal);
        let device = device();
        let events = EventBus::new();
        slot.select("BadClose", Ok(context(&device)), &events).unwrap();

        assert!(slot.select("A", Ok(context(&device)), &events).unwrap());
        assert_eq!(slot.active_name(), Some("A"));
    }

    #[test]
    fn test_events_after_close_are_not_forwarded() {
        let journal = Journal::default();
        let mut slot = slot_with(&journal);
        let device = device();
        let events = EventBus::new();
        slot.select("A", Ok(context(&device)), &events).unwrap();
        let mut stream = events.subscribe();

        slot.close_active();

        // RecordingWorkload announces Stopped from close(); nobody hears it.
        assert!(stream.drain().is_empty());
    }
}
