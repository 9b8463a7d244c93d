// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The engine as seen from outside the worker thread.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::backends::local::LocalWorkloadFactory;
use crate::backends::software::SoftwareInstanceProvider;
use crate::config::{EngineConfig, WorkloadRegistry};
use crate::engine::channel::{channel, CommandFuture, CommandSender};
use crate::engine::devices::DeviceSelection;
use crate::engine::events::{EngineEvent, EventBus, EventStream};
use crate::engine::execution::{ExecutionLoop, LoopState};
use crate::engine::state::{EngineState, Snapshots};
use crate::errors::EngineError;
use crate::observability::messages::engine::{DeviceSelectionReplayed, EngineShutdownRequested};
use crate::observability::messages::StructuredLog;
use crate::preferences::{FilePreferences, MemoryPreferences, PreferencesStore};
use crate::traits::device::{DeviceProperties, InstanceProvider};
use crate::traits::service::ExperimentService;

/// Assembles an [`Engine`].
///
/// Anything not supplied falls back to the config: the software backend
/// built from `software_devices`, the built-in workloads filtered by the
/// `workloads` allow-list, and file or in-memory preferences depending on
/// `preferences_file`.
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    provider: Option<Box<dyn InstanceProvider>>,
    registry: Option<WorkloadRegistry>,
    preferences: Option<Arc<dyn PreferencesStore>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_instance_provider(mut self, provider: impl InstanceProvider + 'static) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    pub fn with_registry(mut self, registry: WorkloadRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_preferences(mut self, preferences: Arc<dyn PreferencesStore>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Spawn the worker thread and return the running engine.
    ///
    /// A device selection found in the preferences is submitted as the
    /// first command.
    pub fn start(self) -> Result<Engine, EngineError> {
        let thread_name = self.config.worker_thread_name.clone();
        let (mut engine, execution) = self.assemble()?;

        let worker = thread::Builder::new()
            .name(thread_name)
            .spawn(move || execution.run())
            .map_err(EngineError::WorkerSpawn)?;

        engine.commands = engine.commands.clone().with_waker(worker.thread().clone());
        engine.commands.wake();
        engine.worker = Mutex::new(Some(worker));
        Ok(engine)
    }

    /// Build the engine and its loop without starting a thread.
    pub(crate) fn assemble(self) -> Result<(Engine, ExecutionLoop), EngineError> {
        let config = self.config;

        let provider = self.provider.unwrap_or_else(|| {
            Box::new(SoftwareInstanceProvider::from_configs(&config.software_devices))
        });

        let mut registry = self.registry.unwrap_or_else(LocalWorkloadFactory::registry);
        if let Some(allowed) = &config.workloads {
            registry.retain_only(allowed);
        }
        let registry = Arc::new(registry);

        let preferences: Arc<dyn PreferencesStore> = match (self.preferences, &config.preferences_file) {
            (Some(preferences), _) => preferences,
            (None, Some(path)) => Arc::new(FilePreferences::open_or_default(path)?),
            (None, None) => Arc::new(MemoryPreferences::default()),
        };
        let replay = preferences.preferences().device_selection;

        let state = EngineState::new(
            provider,
            Arc::clone(&registry),
            preferences,
            config.frame_budget(),
            config.device_sync_timeout(),
        );
        let events = state.events().clone();
        let snapshots = Arc::clone(state.snapshots());

        let (commands, receiver) = channel();
        let (status_tx, status) = watch::channel(LoopState::Running);
        let stop = CancellationToken::new();

        let idle_wait = config.frame_budget().max(Duration::from_millis(1));
        let execution = ExecutionLoop::new(
            state,
            receiver,
            stop.clone(),
            status_tx,
            idle_wait,
            config.worker_thread_name.clone(),
        );

        let engine = Engine {
            commands,
            events,
            snapshots,
            registry,
            stop,
            status,
            worker: Mutex::new(None),
        };

        if let Some(selection) = replay {
            DeviceSelectionReplayed {
                selection: &selection,
            }
            .log();
            // Failures are logged by the worker; there is no caller to report to.
            drop(engine.set_device(selection));
        }

        Ok((engine, execution))
    }
}

/// A running engine.
///
/// Mutating operations are queued to the worker thread and answered through
/// a [`CommandFuture`], which can be awaited or waited on. Snapshots and
/// event subscriptions are served directly without going through the queue.
pub struct Engine {
    commands: CommandSender<EngineState>,
    events: EventBus<EngineEvent>,
    snapshots: Arc<Snapshots>,
    registry: Arc<WorkloadRegistry>,
    stop: CancellationToken,
    status: watch::Receiver<LoopState>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Subscribe to events published from now on.
    pub fn events(&self) -> EventStream<EngineEvent> {
        self.events.subscribe()
    }

    pub fn list_workloads(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn frame_time_snapshot(&self) -> Duration {
        self.snapshots.frame_time()
    }

    pub fn device_selection_snapshot(&self) -> Option<DeviceSelection> {
        self.snapshots.device_selection()
    }

    pub fn loop_state(&self) -> LoopState {
        *self.status.borrow()
    }

    pub fn set_viewport_size(&self, width: u32, height: u32) -> CommandFuture<()> {
        self.commands.submit("set_viewport_size", move |state: &mut EngineState| {
            state.set_viewport_size(width, height)
        })
    }

    pub fn set_device(&self, selection: DeviceSelection) -> CommandFuture<Option<DeviceProperties>> {
        self.commands.submit("set_device", move |state: &mut EngineState| {
            state.set_device(selection)
        })
    }

    pub fn select_workload(&self, name: impl Into<String>) -> CommandFuture<bool> {
        let name = name.into();
        self.commands.submit("select_workload", move |state: &mut EngineState| {
            state.select_workload(&name)
        })
    }

    pub fn list_devices(&self) -> CommandFuture<Vec<DeviceProperties>> {
        self.commands
            .submit("list_devices", |state: &mut EngineState| state.list_devices())
    }

    /// Ask the worker to stop. Returns immediately.
    pub fn request_stop(&self) {
        if !self.stop.is_cancelled() {
            EngineShutdownRequested.log();
            self.stop.cancel();
        }
        self.commands.wake();
    }

    /// Stop the worker and wait until it has released everything.
    pub async fn shutdown(&self) {
        self.request_stop();

        let mut status = self.status.clone();
        // An error means the worker is gone, which is just as final.
        let _ = status.wait_for(|state| *state == LoopState::Stopped).await;

        if let Some(worker) = self.take_worker() {
            let _ = tokio::task::spawn_blocking(move || worker.join()).await;
        }
    }

    /// [`shutdown`](Self::shutdown) for callers outside an async runtime.
    pub fn shutdown_blocking(&self) {
        self.request_stop();
        if let Some(worker) = self.take_worker() {
            let _ = worker.join();
        }
    }

    fn take_worker(&self) -> Option<JoinHandle<()>> {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown_blocking();
    }
}

#[async_trait]
impl ExperimentService for Engine {
    fn events(&self) -> EventStream<EngineEvent> {
        Engine::events(self)
    }

    fn list_workloads(&self) -> Vec<String> {
        Engine::list_workloads(self)
    }

    fn frame_time_snapshot(&self) -> Duration {
        Engine::frame_time_snapshot(self)
    }

    fn device_selection_snapshot(&self) -> Option<DeviceSelection> {
        Engine::device_selection_snapshot(self)
    }

    async fn set_viewport_size(&self, width: u32, height: u32) -> Result<(), EngineError> {
        Engine::set_viewport_size(self, width, height).await
    }

    async fn set_device(
        &self,
        selection: DeviceSelection,
    ) -> Result<Option<DeviceProperties>, EngineError> {
        Engine::set_device(self, selection).await
    }

    async fn select_workload(&self, name: &str) -> Result<bool, EngineError> {
        Engine::select_workload(self, name).await
    }

    async fn list_devices(&self) -> Result<Vec<DeviceProperties>, EngineError> {
        Engine::list_devices(self).await
    }

    async fn shutdown(&self) {
        Engine::shutdown(self).await
    }
}
