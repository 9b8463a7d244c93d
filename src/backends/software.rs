// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A CPU-executed graphics backend.
//!
//! Devices are simulated adapters described by [`SoftwareDeviceConfig`]s,
//! usually from the `software_devices` section of the engine config. Command
//! lists execute on the CPU at submit time; the returned fence signals after
//! the device's configured latency, which makes bounded device waits (and
//! their expiry) observable without real hardware.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;
use uuid::Uuid;

use crate::engine::surface::BYTES_PER_PIXEL;
use crate::errors::DeviceError;
use crate::traits::device::{
    CommandList, DeviceCommand, DeviceProperties, DeviceType, DriverInfo, Fence, GraphicsInstance,
    InstanceProvider, LogicalDevice, PhysicalDevice,
};

pub const DEFAULT_DEVICE_NAME: &str = "Software Rasterizer";
pub const DEFAULT_DEVICE_UUID: Uuid = Uuid::from_u128(0x6b69_6c6e_0000_4000_8000_0000_0000_0001);

/// Description of one simulated adapter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SoftwareDeviceConfig {
    pub name: String,
    #[serde(default)]
    pub uuid: Option<Uuid>,
    #[serde(default)]
    pub vendor_id: u32,
    #[serde(default)]
    pub device_id: u32,
    #[serde(default)]
    pub device_type: DeviceType,
    #[serde(default)]
    pub driver: Option<DriverInfo>,
    /// Time from submit until the fence signals.
    #[serde(default)]
    pub latency_ms: u64,
}

impl SoftwareDeviceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uuid: None,
            vendor_id: 0,
            device_id: 0,
            device_type: DeviceType::default(),
            driver: None,
            latency_ms: 0,
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    pub fn with_device_id(mut self, device_id: u32) -> Self {
        self.device_id = device_id;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency_ms = latency.as_millis() as u64;
        self
    }

    fn properties(&self) -> DeviceProperties {
        DeviceProperties {
            name: self.name.clone(),
            uuid: self.uuid,
            vendor_id: self.vendor_id,
            device_id: self.device_id,
            device_type: self.device_type,
            driver: self.driver.clone(),
        }
    }
}

/// Hands out instances enumerating a fixed set of simulated devices.
#[derive(Debug, Clone)]
pub struct SoftwareInstanceProvider {
    devices: Vec<SoftwareDeviceConfig>,
}

impl SoftwareInstanceProvider {
    pub fn new(devices: Vec<SoftwareDeviceConfig>) -> Self {
        Self { devices }
    }

    /// Use the configured devices, or the single default device if none are.
    pub fn from_configs(devices: &[SoftwareDeviceConfig]) -> Self {
        if devices.is_empty() {
            Self::default()
        } else {
            Self::new(devices.to_vec())
        }
    }
}

impl Default for SoftwareInstanceProvider {
    fn default() -> Self {
        Self::new(vec![SoftwareDeviceConfig {
            name: DEFAULT_DEVICE_NAME.to_string(),
            uuid: Some(DEFAULT_DEVICE_UUID),
            vendor_id: 0x10005,
            device_id: 0,
            device_type: DeviceType::Cpu,
            driver: Some(DriverInfo {
                name: "kiln-software".to_string(),
                info: env!("CARGO_PKG_VERSION").to_string(),
            }),
            latency_ms: 0,
        }])
    }
}

impl InstanceProvider for SoftwareInstanceProvider {
    fn create_instance(&self) -> Result<Box<dyn GraphicsInstance>, DeviceError> {
        let devices = self
            .devices
            .iter()
            .map(|device| {
                Arc::new(SoftwarePhysicalDevice {
                    properties: device.properties(),
                    latency: Duration::from_millis(device.latency_ms),
                }) as Arc<dyn PhysicalDevice>
            })
            .collect();
        Ok(Box::new(SoftwareInstance { devices }))
    }
}

struct SoftwareInstance {
    devices: Vec<Arc<dyn PhysicalDevice>>,
}

impl GraphicsInstance for SoftwareInstance {
    fn enumerate_devices(&self) -> Result<Vec<Arc<dyn PhysicalDevice>>, DeviceError> {
        Ok(self.devices.clone())
    }
}

#[derive(Debug)]
struct SoftwarePhysicalDevice {
    properties: DeviceProperties,
    latency: Duration,
}

impl PhysicalDevice for SoftwarePhysicalDevice {
    fn properties(&self) -> &DeviceProperties {
        &self.properties
    }

    fn open(&self) -> Result<Box<dyn LogicalDevice>, DeviceError> {
        Ok(Box::new(SoftwareLogicalDevice {
            name: self.properties.name.clone(),
            latency: self.latency,
            target: None,
            next_fence: 0,
            in_flight: BTreeMap::new(),
        }))
    }
}

struct RenderTarget {
    color: Vec<u8>,
    readback: Vec<u8>,
}

struct SoftwareLogicalDevice {
    name: String,
    latency: Duration,
    target: Option<RenderTarget>,
    next_fence: u64,
    /// Fence id to the instant it signals.
    in_flight: BTreeMap<u64, Instant>,
}

/// Convert normalized RGBA to a BGRA pixel.
fn bgra(color: [f32; 4]) -> [u8; 4] {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [channel(color[2]), channel(color[1]), channel(color[0]), channel(color[3])]
}

impl SoftwareLogicalDevice {
    fn target_mut(&mut self) -> Result<&mut RenderTarget, DeviceError> {
        let name = &self.name;
        self.target
            .as_mut()
            .ok_or_else(|| DeviceError::NoRenderTarget(name.clone()))
    }

    fn retire_through(&mut self, fence: u64) {
        self.in_flight.retain(|&id, _| id > fence);
    }
}

impl LogicalDevice for SoftwareLogicalDevice {
    fn configure_target(&mut self, width: u32, height: u32) -> Result<(), DeviceError> {
        let len = width as usize * height as usize * BYTES_PER_PIXEL;
        self.target = Some(RenderTarget {
            color: vec![0; len],
            readback: vec![0; len],
        });
        Ok(())
    }

    fn submit(&mut self, commands: &CommandList) -> Result<Fence, DeviceError> {
        let target = self.target_mut()?;
        for command in commands.commands() {
            match command {
                DeviceCommand::ClearColor(color) => {
                    let pixel = bgra(*color);
                    for chunk in target.color.chunks_exact_mut(BYTES_PER_PIXEL) {
                        chunk.copy_from_slice(&pixel);
                    }
                }
                DeviceCommand::CopyToReadback => target.readback.copy_from_slice(&target.color),
            }
        }

        let fence = self.next_fence;
        self.next_fence += 1;
        self.in_flight.insert(fence, Instant::now() + self.latency);
        Ok(Fence(fence))
    }

    fn wait_for_fence(&mut self, fence: Fence, timeout: Duration) -> Result<(), DeviceError> {
        let Some(&signals_at) = self.in_flight.get(&fence.0) else {
            return if fence.0 < self.next_fence {
                Ok(())
            } else {
                Err(DeviceError::UnknownFence(fence.0))
            };
        };

        let remaining = signals_at.saturating_duration_since(Instant::now());
        if remaining > timeout {
            thread::sleep(timeout);
            return Err(DeviceError::Timeout(timeout));
        }
        thread::sleep(remaining);
        self.retire_through(fence.0);
        Ok(())
    }

    fn read_back(&self, output: &mut [u8]) -> Result<(), DeviceError> {
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| DeviceError::NoRenderTarget(self.name.clone()))?;
        if output.len() != target.readback.len() {
            return Err(DeviceError::ReadbackSize {
                expected: target.readback.len(),
                actual: output.len(),
            });
        }
        output.copy_from_slice(&target.readback);
        Ok(())
    }

    fn wait_idle(&mut self) -> Result<(), DeviceError> {
        if let Some(&last) = self.in_flight.values().max() {
            thread::sleep(last.saturating_duration_since(Instant::now()));
        }
        self.in_flight.clear();
        Ok(())
    }
}
