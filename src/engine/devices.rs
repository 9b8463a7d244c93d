// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Device discovery and selection.
//!
//! The registry creates its graphics instance lazily, on the first request
//! that needs one, and keeps it for the engine's lifetime.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DeviceError;
use crate::observability::messages::device::{
    DeviceSelected, EnumerationFailed, InstanceCreated, NoMatchingDevice,
};
use crate::observability::messages::StructuredLog;
use crate::traits::device::{DeviceProperties, GraphicsInstance, InstanceProvider, PhysicalDevice};

/// Identifies a device by name and, when known, by UUID.
///
/// When both sides of a comparison carry a UUID the UUID decides and the
/// names are ignored; otherwise the names must be identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSelection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
}

impl DeviceSelection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uuid: None,
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    pub fn matches(&self, properties: &DeviceProperties) -> bool {
        match (self.uuid, properties.uuid) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => self.name == properties.name,
        }
    }
}

impl From<&DeviceProperties> for DeviceSelection {
    fn from(properties: &DeviceProperties) -> Self {
        Self {
            name: properties.name.clone(),
            uuid: properties.uuid,
        }
    }
}

/// First device in enumeration order matching `selection`.
pub fn find_device<'a>(
    devices: &'a [Arc<dyn PhysicalDevice>],
    selection: &DeviceSelection,
) -> Option<&'a Arc<dyn PhysicalDevice>> {
    devices
        .iter()
        .find(|device| selection.matches(device.properties()))
}

/// Owns the graphics instance and the currently selected device.
pub struct DeviceRegistry {
    provider: Box<dyn InstanceProvider>,
    instance: Option<Box<dyn GraphicsInstance>>,
    current: Option<Arc<dyn PhysicalDevice>>,
}

impl DeviceRegistry {
    pub fn new(provider: Box<dyn InstanceProvider>) -> Self {
        Self {
            provider,
            instance: None,
            current: None,
        }
    }

    fn instance(&mut self) -> Result<&dyn GraphicsInstance, DeviceError> {
        let instance = match self.instance.take() {
            Some(instance) => instance,
            None => {
                let instance = self.provider.create_instance()?;
                InstanceCreated.log();
                instance
            }
        };
        Ok(&**self.instance.insert(instance))
    }

    fn enumerate(&mut self) -> Result<Vec<Arc<dyn PhysicalDevice>>, DeviceError> {
        let result = self
            .instance()
            .and_then(|instance| instance.enumerate_devices());
        if let Err(error) = &result {
            EnumerationFailed { error }.log();
        }
        result
    }

    /// Enumerate and return the first device matching `selection`.
    pub fn resolve(
        &mut self,
        selection: &DeviceSelection,
    ) -> Result<Option<Arc<dyn PhysicalDevice>>, DeviceError> {
        let devices = self.enumerate()?;
        Ok(find_device(&devices, selection).cloned())
    }

    /// Resolve `selection` and make the match the current device.
    ///
    /// When nothing matches the current device is left as it was and `None`
    /// is returned.
    pub fn select(
        &mut self,
        selection: &DeviceSelection,
    ) -> Result<Option<DeviceProperties>, DeviceError> {
        match self.resolve(selection)? {
            Some(device) => {
                let properties = device.properties().clone();
                DeviceSelected {
                    name: &properties.name,
                    uuid: properties.uuid,
                }
                .log();
                self.current = Some(device);
                Ok(Some(properties))
            }
            None => {
                NoMatchingDevice { selection }.log();
                Ok(None)
            }
        }
    }

    /// Properties of every visible device, in enumeration order.
    pub fn list_devices(&mut self) -> Result<Vec<DeviceProperties>, DeviceError> {
        Ok(self
            .enumerate()?
            .iter()
            .map(|device| device.properties().clone())
            .collect())
    }

    pub fn current(&self) -> Option<&Arc<dyn PhysicalDevice>> {
        self.current.as_ref()
    }

    /// Drop the current device and then the instance.
    pub fn release(&mut self) {
        self.current = None;
        self.instance = None;
    }
}
