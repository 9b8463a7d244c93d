// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::backends::local::LocalWorkloadFactory;
use crate::backends::software::{SoftwareDeviceConfig, SoftwareInstanceProvider, DEFAULT_DEVICE_NAME};
use crate::backends::stub::{
    FailingRenderWorkload, FailingResizeWorkload, FailingStartWorkload, Journal, RecordingWorkload,
};
use crate::config::{EngineConfig, WorkloadRegistry};
use crate::engine::execution::{ExecutionLoop, LoopState, TurnOutcome};
use crate::engine::{DeviceSelection, Engine, EngineBuilder, EngineEvent};
use crate::errors::{DeviceError, EngineError};
use crate::preferences::{MemoryPreferences, Preferences, PreferencesStore};
use crate::traits::device::{GraphicsInstance, InstanceProvider};
use crate::traits::workload::LifecycleStatus;
use crate::traits::ExperimentService;

/// Integration tests driving the whole engine, either turn by turn on the
/// test thread or through a real worker thread.
#[cfg(test)]
mod tests {
    use super::*;

    fn config(frame_budget_ms: u64) -> EngineConfig {
        EngineConfig {
            frame_budget_ms,
            device_sync_timeout_ms: 100,
            ..Default::default()
        }
    }

    fn detached(builder: EngineBuilder) -> (Engine, ExecutionLoop) {
        builder.assemble().unwrap()
    }

    fn turns(execution: &mut ExecutionLoop, count: usize) {
        for _ in 0..count {
            execution.turn();
        }
    }

    fn recording_registry(journal: &Journal) -> WorkloadRegistry {
        let a = journal.clone();
        let b = journal.clone();
        WorkloadRegistry::new()
            .with("A", move || Box::new(RecordingWorkload::new("A", a.clone())))
            .with("B", move || Box::new(RecordingWorkload::new("B", b.clone())))
            .with("BadStart", || Box::new(FailingStartWorkload::new()))
            .with("BadRender", || Box::new(FailingRenderWorkload::failing_after(1)))
            .with("BadResize", || Box::new(FailingResizeWorkload::new()))
    }

    /// Device and 4x4 viewport applied, nothing selected yet.
    fn ready(builder: EngineBuilder) -> (Engine, ExecutionLoop) {
        let (engine, mut execution) = detached(builder);
        let mut device = engine.set_device(DeviceSelection::new(DEFAULT_DEVICE_NAME));
        let mut size = engine.set_viewport_size(4, 4);
        turns(&mut execution, 2);
        assert!(device.try_result().unwrap().unwrap().is_some());
        assert!(size.try_result().unwrap().is_ok());
        (engine, execution)
    }

    #[test]
    fn test_commands_complete_in_submission_order() {
        let (engine, mut execution) = detached(Engine::builder().with_config(config(0)));
        let mut events = engine.events();

        let futures: Vec<_> = [(10, 10), (20, 20), (30, 30)]
            .into_iter()
            .map(|(w, h)| engine.set_viewport_size(w, h))
            .collect();

        assert_eq!(execution.turn(), TurnOutcome::Busy);
        assert_eq!(execution.turn(), TurnOutcome::Busy);
        assert_eq!(execution.turn(), TurnOutcome::Busy);
        assert_eq!(execution.turn(), TurnOutcome::Idle);

        for mut future in futures {
            assert!(future.try_result().unwrap().is_ok());
        }
        let widths: Vec<u32> = events
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::SizeChanged { width, .. } => Some(width),
                _ => None,
            })
            .collect();
        assert_eq!(widths, vec![10, 20, 30]);
    }

    #[test]
    fn test_switch_closes_previous_workload_before_starting_next() {
        let journal = Journal::default();
        let (engine, mut execution) = ready(
            Engine::builder()
                .with_config(config(0))
                .with_registry(recording_registry(&journal)),
        );
        let mut events = engine.events();

        let mut first = engine.select_workload("A");
        let mut second = engine.select_workload("B");
        turns(&mut execution, 2);

        assert!(first.try_result().unwrap().unwrap());
        assert!(second.try_result().unwrap().unwrap());

        let entries = journal.entries();
        let close_a = entries.iter().position(|e| e == "A.close").unwrap();
        let start_b = entries.iter().position(|e| e == "B.start").unwrap();
        assert!(close_a < start_b);
        assert_eq!(execution.state().active_workload(), Some("B"));

        let selected: Vec<String> = events
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::WorkloadSelected(name) => Some(name),
                _ => None,
            })
            .collect();
        assert_eq!(selected, vec!["A", "B"]);
    }

    #[test]
    fn test_unknown_workload_closes_current_and_starts_nothing() {
        let journal = Journal::default();
        let (engine, mut execution) = ready(
            Engine::builder()
                .with_config(config(0))
                .with_registry(recording_registry(&journal)),
        );

        let mut known = engine.select_workload("A");
        let mut unknown = engine.select_workload("Nope");
        turns(&mut execution, 2);

        assert!(known.try_result().unwrap().unwrap());
        assert!(!unknown.try_result().unwrap().unwrap());
        assert_eq!(execution.state().active_workload(), None);
        assert!(journal.entries().contains(&"A.close".to_string()));
        assert_eq!(execution.turn(), TurnOutcome::Idle);
    }

    #[test]
    fn test_viewport_800x600_is_announced_before_it_is_rendered() {
        let (engine, mut execution) = detached(Engine::builder().with_config(config(0)));
        let mut device = engine.set_device(DeviceSelection::new(DEFAULT_DEVICE_NAME));
        let mut size = engine.set_viewport_size(1, 1);
        turns(&mut execution, 2);
        assert!(device.try_result().unwrap().is_ok());
        assert!(size.try_result().unwrap().is_ok());
        let mut select = engine.select_workload(LocalWorkloadFactory::SLOW_LOAD);
        execution.turn();
        assert!(select.try_result().unwrap().unwrap());

        let mut events = engine.events();
        let mut resize = engine.set_viewport_size(800, 600);
        turns(&mut execution, 2);
        assert!(resize.try_result().unwrap().is_ok());

        let received = events.drain();
        let sizes: Vec<usize> = received
            .iter()
            .enumerate()
            .filter_map(|(index, event)| match event {
                EngineEvent::SizeChanged { buffer, .. } => {
                    assert_eq!(buffer.len(), 800 * 600 * 4);
                    Some(index)
                }
                _ => None,
            })
            .collect();
        assert_eq!(sizes.len(), 1);

        let first_frame_on_new_buffer = received
            .iter()
            .position(|event| {
                matches!(event, EngineEvent::BufferReady { buffer, .. } if buffer.width() == 800)
            })
            .unwrap();
        assert!(sizes[0] < first_frame_on_new_buffer);
    }

    #[test]
    fn test_fresh_viewport_is_opaque_black() {
        let (engine, mut execution) = detached(Engine::builder().with_config(config(0)));
        let mut events = engine.events();

        let mut resize = engine.set_viewport_size(800, 600);
        execution.turn();
        assert!(resize.try_result().unwrap().is_ok());

        match events.drain().as_slice() {
            [EngineEvent::SizeChanged {
                width: 800,
                height: 600,
                buffer,
            }] => buffer.with_pixels(|pixels| {
                assert_eq!(pixels.len(), 800 * 600 * 4);
                assert!(pixels.iter().skip(3).step_by(4).all(|alpha| *alpha == 0xFF));
            }),
            other => panic!("expected exactly one SizeChanged, got {:?}", other),
        }
    }

    #[test]
    fn test_slow_load_reports_progress_each_tick() {
        let (engine, mut execution) = ready(Engine::builder().with_config(config(0)));
        let mut events = engine.events();

        let mut select = engine.select_workload(LocalWorkloadFactory::SLOW_LOAD);
        // The selecting turn renders the first tick.
        turns(&mut execution, 10);
        assert!(select.try_result().unwrap().unwrap());

        let loading: Vec<f64> = events
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::WorkloadLifecycle {
                    status: LifecycleStatus::Loading,
                    progress,
                    ..
                } => Some(progress),
                _ => None,
            })
            .collect();

        assert_eq!(loading.len(), 10);
        let mut previous = 0.0;
        for progress in loading {
            assert!((progress - previous - 0.002).abs() < 1e-9);
            previous = progress;
        }
    }

    #[test]
    fn test_render_failure_freezes_output_and_keeps_loop_alive() {
        let (engine, mut execution) = ready(
            Engine::builder()
                .with_config(config(0))
                .with_registry(recording_registry(&Journal::default())),
        );
        let mut events = engine.events();

        let mut select = engine.select_workload("BadRender");
        turns(&mut execution, 2);
        assert!(select.try_result().unwrap().unwrap());

        let received = events.drain();
        let frames: Vec<_> = received
            .iter()
            .filter_map(|event| match event {
                EngineEvent::BufferReady { buffer, .. } => Some(Arc::clone(buffer)),
                _ => None,
            })
            .collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(
            received
                .iter()
                .filter(|event| matches!(event, EngineEvent::WorkloadError(_)))
                .count(),
            1
        );
        assert_eq!(frames[0].pixel(0, 0).map(|bgra| bgra[0]), Some(1));

        assert_eq!(execution.turn(), TurnOutcome::Idle);
        assert!(events.drain().is_empty());
        assert_eq!(frames[0].pixel(0, 0).map(|bgra| bgra[0]), Some(1));

        let mut resize = engine.set_viewport_size(8, 8);
        execution.turn();
        assert!(resize.try_result().unwrap().is_ok());
    }

    #[test]
    fn test_resize_reaches_workload_before_next_render() {
        let journal = Journal::default();
        let (engine, mut execution) = ready(
            Engine::builder()
                .with_config(config(0))
                .with_registry(recording_registry(&journal)),
        );

        let mut select = engine.select_workload("A");
        execution.turn();
        assert!(select.try_result().unwrap().unwrap());

        let mut resize = engine.set_viewport_size(8, 8);
        execution.turn();
        assert!(resize.try_result().unwrap().is_ok());

        assert_eq!(
            journal.entries(),
            vec!["A.start", "A.render", "A.resize(8x8)", "A.render"]
        );
    }

    #[test]
    fn test_failing_resize_hook_is_an_event_not_a_command_error() {
        let (engine, mut execution) = ready(
            Engine::builder()
                .with_config(config(0))
                .with_registry(recording_registry(&Journal::default())),
        );
        let mut select = engine.select_workload("BadResize");
        execution.turn();
        assert!(select.try_result().unwrap().unwrap());

        let mut events = engine.events();
        let mut resize = engine.set_viewport_size(8, 8);
        execution.turn();
        assert!(matches!(resize.try_result(), Some(Ok(()))));

        let received = events.drain();
        let error = received
            .iter()
            .position(|event| matches!(event, EngineEvent::WorkloadError(_)))
            .unwrap();
        let size_changed = received
            .iter()
            .position(|event| {
                matches!(event, EngineEvent::SizeChanged { width: 8, height: 8, .. })
            })
            .unwrap();
        assert!(error < size_changed);
        assert!(!received
            .iter()
            .any(|event| matches!(event, EngineEvent::BufferReady { .. })));

        assert_eq!(execution.state().active_workload(), Some("BadResize"));
        assert_eq!(execution.turn(), TurnOutcome::Idle);
    }

    #[test]
    fn test_failed_start_is_reported_and_slot_left_empty() {
        let (engine, mut execution) = ready(
            Engine::builder()
                .with_config(config(0))
                .with_registry(recording_registry(&Journal::default())),
        );

        let mut select = engine.select_workload("BadStart");
        execution.turn();

        assert!(matches!(
            select.try_result(),
            Some(Err(EngineError::Workload(_)))
        ));
        assert_eq!(execution.state().active_workload(), None);
        assert_eq!(execution.turn(), TurnOutcome::Idle);
    }

    #[test]
    fn test_select_before_device_is_not_ready() {
        let (engine, mut execution) = detached(Engine::builder().with_config(config(0)));

        let mut select = engine.select_workload(LocalWorkloadFactory::NULL);
        execution.turn();

        assert!(matches!(
            select.try_result(),
            Some(Err(EngineError::NotReady { missing: "device" }))
        ));
    }

    #[test]
    fn test_stop_abandons_queued_commands() {
        let (engine, mut execution) = detached(Engine::builder().with_config(config(0)));

        let mut first = engine.set_viewport_size(2, 2);
        let mut second = engine.set_viewport_size(3, 3);
        let mut third = engine.list_devices();
        engine.request_stop();

        assert_eq!(execution.turn(), TurnOutcome::Stopped);
        assert_eq!(engine.loop_state(), LoopState::Stopped);

        assert!(matches!(first.try_result(), Some(Ok(()))));
        assert!(matches!(second.try_result(), Some(Err(EngineError::ShuttingDown))));
        assert!(matches!(third.try_result(), Some(Err(EngineError::ShuttingDown))));

        let mut late = engine.set_viewport_size(4, 4);
        assert!(matches!(late.try_result(), Some(Err(EngineError::ShuttingDown))));
        assert_eq!(execution.turn(), TurnOutcome::Stopped);
    }

    #[test]
    fn test_stop_closes_active_workload() {
        let journal = Journal::default();
        let (engine, mut execution) = ready(
            Engine::builder()
                .with_config(config(0))
                .with_registry(recording_registry(&journal)),
        );
        let mut select = engine.select_workload("A");
        execution.turn();
        assert!(select.try_result().unwrap().unwrap());

        engine.request_stop();
        assert_eq!(execution.turn(), TurnOutcome::Stopped);

        assert_eq!(journal.entries().last().map(String::as_str), Some("A.close"));
    }

    #[test]
    fn test_preferred_device_is_replayed_on_startup() {
        let preferred = DeviceSelection::new("Second").with_uuid(Uuid::from_u128(2));
        let preferences = Arc::new(MemoryPreferences::new(Preferences {
            debugging_enabled: false,
            device_selection: Some(preferred.clone()),
        }));
        let provider = SoftwareInstanceProvider::new(vec![
            SoftwareDeviceConfig::new("First").with_uuid(Uuid::from_u128(1)),
            SoftwareDeviceConfig::new("Second").with_uuid(Uuid::from_u128(2)),
        ]);

        let (engine, mut execution) = detached(
            Engine::builder()
                .with_config(config(0))
                .with_instance_provider(provider)
                .with_preferences(preferences),
        );
        assert_eq!(engine.device_selection_snapshot(), None);

        execution.turn();
        assert_eq!(engine.device_selection_snapshot(), Some(preferred));
    }

    #[test]
    fn test_applied_device_is_persisted() {
        let preferences = Arc::new(MemoryPreferences::default());
        let (engine, mut execution) = detached(
            Engine::builder()
                .with_config(config(0))
                .with_preferences(preferences.clone()),
        );

        let mut device = engine.set_device(DeviceSelection::new(DEFAULT_DEVICE_NAME));
        execution.turn();

        let properties = device.try_result().unwrap().unwrap().unwrap();
        assert_eq!(
            preferences.preferences().device_selection,
            Some(DeviceSelection::from(&properties))
        );
    }

    #[test]
    fn test_allow_list_limits_workloads() {
        let (engine, _execution) = detached(Engine::builder().with_config(EngineConfig {
            workloads: Some(vec![LocalWorkloadFactory::SLOW_LOAD.to_string()]),
            ..config(0)
        }));

        assert_eq!(engine.list_workloads(), vec![LocalWorkloadFactory::SLOW_LOAD]);
    }

    struct BrokenProvider;

    impl InstanceProvider for BrokenProvider {
        fn create_instance(&self) -> Result<Box<dyn GraphicsInstance>, DeviceError> {
            Err(DeviceError::InstanceCreation("driver missing".to_string()))
        }
    }

    #[tokio::test]
    async fn test_device_failure_reaches_only_its_future() {
        let engine = Engine::builder()
            .with_config(config(0))
            .with_instance_provider(BrokenProvider)
            .start()
            .unwrap();

        let listed = engine.list_devices().await;
        assert!(matches!(
            listed,
            Err(EngineError::Device(DeviceError::InstanceCreation(_)))
        ));

        engine.set_viewport_size(2, 2).await.unwrap();
        assert_eq!(engine.loop_state(), LoopState::Running);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_worker_renders_and_shuts_down() {
        let engine = Engine::builder().with_config(config(5)).start().unwrap();
        let service: &dyn ExperimentService = &engine;
        let mut events = service.events();

        let devices = service.list_devices().await.unwrap();
        service
            .set_device(DeviceSelection::from(&devices[0]))
            .await
            .unwrap();
        service.set_viewport_size(16, 16).await.unwrap();
        assert!(service
            .select_workload(LocalWorkloadFactory::CLEAR)
            .await
            .unwrap());

        let frame = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match events.recv().await {
                    Some(EngineEvent::BufferReady { buffer, .. }) => return buffer,
                    Some(_) => continue,
                    None => panic!("event bus closed"),
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(frame.pixel(15, 15), Some([0x00, 0xFF, 0x00, 0xFF]));
        assert!(service.frame_time_snapshot() > Duration::ZERO);

        service.shutdown().await;
        assert_eq!(engine.loop_state(), LoopState::Stopped);
        assert!(matches!(
            service.set_viewport_size(1, 1).await,
            Err(EngineError::ShuttingDown)
        ));
    }

    #[test]
    fn test_blocking_callers_can_drive_the_worker() {
        let engine = Engine::builder().with_config(config(1)).start().unwrap();

        let devices = engine.list_devices().wait().unwrap();
        assert_eq!(devices[0].name, DEFAULT_DEVICE_NAME);

        let submitters: Vec<_> = (1..=4)
            .map(|n| {
                let future = engine.set_viewport_size(n, n);
                std::thread::spawn(move || future.wait())
            })
            .collect();
        for submitter in submitters {
            assert!(submitter.join().unwrap().is_ok());
        }

        engine.shutdown_blocking();
        assert_eq!(engine.loop_state(), LoopState::Stopped);
    }
}
