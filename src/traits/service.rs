// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::time::Duration;

use crate::engine::{DeviceSelection, EngineEvent, EventStream};
use crate::errors::EngineError;
use crate::traits::device::DeviceProperties;

/// The engine surface consumed by a UI or any other front end.
///
/// Every mutating call is answered by the engine worker on its own schedule;
/// callers await the result and are never blocked on engine internals.
#[async_trait]
pub trait ExperimentService: Send + Sync {
    /// Subscribe to engine events published from now on.
    fn events(&self) -> EventStream<EngineEvent>;

    /// Names of the registered workloads, sorted.
    fn list_workloads(&self) -> Vec<String>;

    /// Duration of the most recent render (excluding pacing sleep).
    fn frame_time_snapshot(&self) -> Duration;

    /// The most recently applied device selection.
    fn device_selection_snapshot(&self) -> Option<DeviceSelection>;

    async fn set_viewport_size(&self, width: u32, height: u32) -> Result<(), EngineError>;

    /// Returns the properties of the matched device, or `None` when nothing matched.
    async fn set_device(
        &self,
        selection: DeviceSelection,
    ) -> Result<Option<DeviceProperties>, EngineError>;

    /// Returns `false` when no workload with that name is registered.
    async fn select_workload(&self, name: &str) -> Result<bool, EngineError>;

    async fn list_devices(&self) -> Result<Vec<DeviceProperties>, EngineError>;

    /// Stop the engine and wait for teardown to finish.
    async fn shutdown(&self);
}
