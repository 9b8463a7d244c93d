// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The graphics capability the engine drives.
//!
//! The engine never talks to a graphics API directly. It holds an
//! [`InstanceProvider`], lazily creates one [`GraphicsInstance`] from it, and
//! enumerates [`PhysicalDevice`]s from that instance. Workloads open a
//! [`LogicalDevice`] on the resolved physical device, record a
//! [`CommandList`], submit it and wait on the returned [`Fence`].
//!
//! ```text
//! InstanceProvider → GraphicsInstance → PhysicalDevice → LogicalDevice
//!   (engine owns)      (created once)     (enumerated)     (workload owns)
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DeviceError;

/// Broad class of a device as reported by the binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    IntegratedGpu,
    #[default]
    DiscreteGpu,
    VirtualGpu,
    Cpu,
    Other,
}

/// Driver identification, when the binding exposes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverInfo {
    pub name: String,
    pub info: String,
}

/// The immutable properties of a device.
///
/// This is the record returned by `list_devices` and the one matched against
/// a [`DeviceSelection`](crate::engine::DeviceSelection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceProperties {
    pub name: String,
    pub uuid: Option<Uuid>,
    pub vendor_id: u32,
    pub device_id: u32,
    pub device_type: DeviceType,
    pub driver: Option<DriverInfo>,
}

/// A single recorded device operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// Clear the render target to an RGBA color with components in `[0, 1]`.
    ClearColor([f32; 4]),
    /// Copy the render target into the host-visible readback buffer.
    CopyToReadback,
}

/// An ordered list of device operations, recorded once and submitted many times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandList {
    commands: Vec<DeviceCommand>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(mut self, color: [f32; 4]) -> Self {
        self.commands.push(DeviceCommand::ClearColor(color));
        self
    }

    pub fn copy_to_readback(mut self) -> Self {
        self.commands.push(DeviceCommand::CopyToReadback);
        self
    }

    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Completion token for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fence(pub u64);

/// A device opened for work. Owned by exactly one workload.
pub trait LogicalDevice: Send {
    /// (Re)create the render target and readback buffer for a size.
    fn configure_target(&mut self, width: u32, height: u32) -> Result<(), DeviceError>;

    /// Submit a command list; the returned fence signals on completion.
    fn submit(&mut self, commands: &CommandList) -> Result<Fence, DeviceError>;

    /// Block until `fence` signals or `timeout` expires.
    ///
    /// Expiry is reported as [`DeviceError::Timeout`].
    fn wait_for_fence(&mut self, fence: Fence, timeout: Duration) -> Result<(), DeviceError>;

    /// Copy the readback buffer into `output` (BGRA, row-major).
    fn read_back(&self, output: &mut [u8]) -> Result<(), DeviceError>;

    /// Block until every submitted command list has completed.
    fn wait_idle(&mut self) -> Result<(), DeviceError>;
}

/// A graphics-capable device discovered by enumeration.
pub trait PhysicalDevice: Send + Sync + fmt::Debug {
    fn properties(&self) -> &DeviceProperties;

    fn open(&self) -> Result<Box<dyn LogicalDevice>, DeviceError>;
}

/// A live instance of the graphics binding.
pub trait GraphicsInstance: Send {
    /// Enumerate the devices visible to this instance, in a stable order.
    fn enumerate_devices(&self) -> Result<Vec<Arc<dyn PhysicalDevice>>, DeviceError>;
}

/// Creates graphics instances. The engine calls this at most once.
pub trait InstanceProvider: Send {
    fn create_instance(&self) -> Result<Box<dyn GraphicsInstance>, DeviceError>;
}
