// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Everything the engine worker owns, and the operations commands run on it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;

use crate::config::WorkloadRegistry;
use crate::engine::devices::{DeviceRegistry, DeviceSelection};
use crate::engine::events::{EngineEvent, EventBus};
use crate::engine::slot::WorkloadSlot;
use crate::engine::surface::ImageSurface;
use crate::errors::EngineError;
use crate::observability::messages::engine::{DeviceApplied, FrameRendered, ViewportResized};
use crate::observability::messages::preferences::PreferencesSaveFailed;
use crate::observability::messages::StructuredLog;
use crate::preferences::{Preferences, PreferencesStore};
use crate::traits::device::{DeviceProperties, InstanceProvider};
use crate::traits::workload::WorkloadContext;

/// Latest-known values readable from any thread.
///
/// Written only by the engine worker.
#[derive(Debug, Default)]
pub struct Snapshots {
    device: ArcSwapOption<DeviceSelection>,
    frame_time_nanos: AtomicU64,
}

impl Snapshots {
    pub fn device_selection(&self) -> Option<DeviceSelection> {
        self.device.load_full().map(|selection| selection.as_ref().clone())
    }

    pub fn frame_time(&self) -> Duration {
        Duration::from_nanos(self.frame_time_nanos.load(Ordering::Acquire))
    }

    fn set_device_selection(&self, selection: DeviceSelection) {
        self.device.store(Some(Arc::new(selection)));
    }

    fn set_frame_time(&self, frame_time: Duration) {
        let nanos = u64::try_from(frame_time.as_nanos()).unwrap_or(u64::MAX);
        self.frame_time_nanos.store(nanos, Ordering::Release);
    }
}

/// Worker-owned engine state.
pub struct EngineState {
    devices: DeviceRegistry,
    surface: ImageSurface,
    slot: WorkloadSlot,
    /// Render destination. Copied into the viewport buffer after a
    /// successful render so readers never wait on a render in progress.
    frame: Vec<u8>,
    events: EventBus<EngineEvent>,
    snapshots: Arc<Snapshots>,
    preferences: Arc<dyn PreferencesStore>,
    frame_budget: Duration,
    sync_timeout: Duration,
}

impl EngineState {
    pub fn new(
        provider: Box<dyn InstanceProvider>,
        registry: Arc<WorkloadRegistry>,
        preferences: Arc<dyn PreferencesStore>,
        frame_budget: Duration,
        sync_timeout: Duration,
    ) -> Self {
        Self {
            devices: DeviceRegistry::new(provider),
            surface: ImageSurface::new(),
            slot: WorkloadSlot::new(registry),
            frame: Vec::new(),
            events: EventBus::new(),
            snapshots: Arc::new(Snapshots::default()),
            preferences,
            frame_budget,
            sync_timeout,
        }
    }

    pub fn events(&self) -> &EventBus<EngineEvent> {
        &self.events
    }

    pub fn snapshots(&self) -> &Arc<Snapshots> {
        &self.snapshots
    }

    pub fn active_workload(&self) -> Option<&str> {
        self.slot.active_name()
    }

    /// Replace the viewport, let the workload adapt, then announce it.
    pub fn set_viewport_size(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        let viewport = self.surface.resize(width, height)?;
        self.frame = viewport.buffer.snapshot();
        ViewportResized { width, height }.log();

        if let Some(device) = self.devices.current() {
            let context = WorkloadContext::new(device, width, height, self.sync_timeout);
            // A failing resize hook freezes the workload and is reported as an event.
            let _ = self.slot.resize(&context);
        }

        self.events.publish(EngineEvent::SizeChanged {
            width,
            height,
            buffer: viewport.buffer,
        });
        Ok(())
    }

    /// Make the first device matching `selection` current.
    ///
    /// The applied selection carries the matched device's own name and UUID.
    /// A running workload keeps the device it was started on.
    pub fn set_device(
        &mut self,
        selection: DeviceSelection,
    ) -> Result<Option<DeviceProperties>, EngineError> {
        let Some(properties) = self.devices.select(&selection)? else {
            return Ok(None);
        };

        let applied = DeviceSelection::from(&properties);
        DeviceApplied {
            requested: &selection,
            applied: &applied,
        }
        .log();
        self.snapshots.set_device_selection(applied.clone());
        self.events.publish(EngineEvent::DeviceChanged(applied.clone()));

        let stored = self.preferences.update(&|preferences: &mut Preferences| {
            preferences.device_selection = Some(applied.clone());
        });
        if let Err(error) = stored {
            PreferencesSaveFailed { error: &error }.log();
        }

        Ok(Some(properties))
    }

    /// Close the active workload and start the one registered as `name`.
    ///
    /// Unknown names yield `Ok(false)`. For a registered name without a
    /// current device or a viewport nothing is started: the active workload is
    /// still closed and the command fails with `NotReady` naming what is
    /// missing, instead of starting against a partial context.
    pub fn select_workload(&mut self, name: &str) -> Result<bool, EngineError> {
        let context = match (self.devices.current(), self.surface.current()) {
            (None, _) => Err(EngineError::NotReady { missing: "device" }),
            (_, None) => Err(EngineError::NotReady { missing: "viewport" }),
            (Some(device), Some(viewport)) => Ok(WorkloadContext::new(
                device,
                viewport.width,
                viewport.height,
                self.sync_timeout,
            )),
        };
        self.slot.select(name, context, &self.events)
    }

    pub fn list_devices(&mut self) -> Result<Vec<DeviceProperties>, EngineError> {
        Ok(self.devices.list_devices()?)
    }

    /// Render one frame if a device, a healthy workload and a viewport exist,
    /// then sleep off the rest of the frame budget.
    ///
    /// Returns whether a render was attempted.
    pub fn render_tick(&mut self) -> bool {
        if !self.slot.can_render() {
            return false;
        }
        let (Some(device), Some(viewport)) = (self.devices.current(), self.surface.current())
        else {
            return false;
        };
        let context = WorkloadContext::new(
            device,
            viewport.width,
            viewport.height,
            self.sync_timeout,
        );

        let started = Instant::now();
        let rendered = self.slot.render(&context, &mut self.frame);
        let elapsed = started.elapsed();

        if rendered.is_err() {
            // The previous frame stays in the buffer.
            return true;
        }
        let frame = &self.frame;
        viewport.buffer.write(|pixels| {
            if pixels.len() == frame.len() {
                pixels.copy_from_slice(frame);
            }
        });

        if let Some(remaining) = self.frame_budget.checked_sub(elapsed) {
            if !remaining.is_zero() {
                thread::sleep(remaining);
            }
        }

        FrameRendered { elapsed }.log();
        self.snapshots.set_frame_time(elapsed);
        self.events.publish(EngineEvent::BufferReady {
            frame_time: elapsed,
            buffer: Arc::clone(&viewport.buffer),
        });
        true
    }

    /// Release owned resources in reverse acquisition order.
    pub fn release(&mut self) {
        self.slot.close_active();
        self.surface.release();
        self.frame = Vec::new();
        self.devices.release();
    }
}
