// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::events::EventBus;
use crate::errors::WorkloadError;
use crate::observability::messages::workload::RenderTargetConfigured;
use crate::observability::messages::StructuredLog;
use crate::traits::device::{CommandList, LogicalDevice};
use crate::traits::workload::{LifecycleStatus, Workload, WorkloadContext, WorkloadEvent};

pub const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
pub const GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];

/// Clears the render target on the device and reads the result back.
///
/// The recorded command list clears to red, clears again to green across
/// the whole target, then copies to the readback buffer, so every frame
/// comes back solid green. Each frame waits on its fence for at most the
/// engine's sync timeout.
pub struct ClearWorkload {
    events: EventBus<WorkloadEvent>,
    device: Option<Box<dyn LogicalDevice>>,
    commands: CommandList,
}

impl ClearWorkload {
    pub fn new() -> Self {
        Self {
            events: EventBus::new(),
            device: None,
            commands: CommandList::new(),
        }
    }

    fn device_mut(&mut self) -> Result<&mut Box<dyn LogicalDevice>, WorkloadError> {
        self.device.as_mut().ok_or_else(|| WorkloadError::NotStarted {
            workload: super::LocalWorkloadFactory::CLEAR.to_string(),
        })
    }

    fn configure(&mut self, context: &WorkloadContext<'_>) -> Result<(), WorkloadError> {
        self.device_mut()?
            .configure_target(context.width(), context.height())?;
        self.commands = CommandList::new()
            .clear(RED)
            .clear(GREEN)
            .copy_to_readback();
        RenderTargetConfigured {
            workload: self.name(),
            width: context.width(),
            height: context.height(),
        }
        .log();
        Ok(())
    }
}

impl Default for ClearWorkload {
    fn default() -> Self {
        Self::new()
    }
}

impl Workload for ClearWorkload {
    fn name(&self) -> &str {
        super::LocalWorkloadFactory::CLEAR
    }

    fn events(&self) -> &EventBus<WorkloadEvent> {
        &self.events
    }

    fn start(&mut self, context: &WorkloadContext<'_>) -> Result<(), WorkloadError> {
        self.events.lifecycle(LifecycleStatus::Initialized, 0.0);
        self.events.lifecycle(LifecycleStatus::Loading, 0.0);

        self.device = Some(context.device().open()?);
        self.configure(context)?;

        self.events.lifecycle(LifecycleStatus::Loading, 1.0);
        self.events.lifecycle(LifecycleStatus::Started, 1.0);
        self.events.lifecycle(LifecycleStatus::Running, 1.0);
        Ok(())
    }

    fn on_resize(&mut self, context: &WorkloadContext<'_>) -> Result<(), WorkloadError> {
        self.device_mut()?.wait_idle()?;
        self.configure(context)
    }

    fn render(
        &mut self,
        context: &WorkloadContext<'_>,
        output: &mut [u8],
    ) -> Result<(), WorkloadError> {
        if output.len() != context.buffer_len() {
            return Err(WorkloadError::OutputSize {
                workload: self.name().to_string(),
                expected: context.buffer_len(),
                actual: output.len(),
            });
        }

        let commands = &self.commands;
        let device = self.device.as_mut().ok_or_else(|| WorkloadError::NotStarted {
            workload: super::LocalWorkloadFactory::CLEAR.to_string(),
        })?;
        let fence = device.submit(commands)?;
        device.wait_for_fence(fence, context.sync_timeout())?;
        device.read_back(output)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), WorkloadError> {
        let idle = match self.device.take() {
            Some(mut device) => device.wait_idle(),
            None => Ok(()),
        };
        self.events.lifecycle(LifecycleStatus::Stopped, 1.0);
        idle.map_err(WorkloadError::from)
    }
}
