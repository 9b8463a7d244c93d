// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::local::LocalWorkloadFactory;
use crate::backends::software::SoftwareDeviceConfig;
use crate::config::consts::{
    DEFAULT_DEVICE_SYNC_TIMEOUT_MS, DEFAULT_FRAME_BUDGET_MS, DEFAULT_WORKER_THREAD_NAME,
};
use crate::errors::ConfigError;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Engine configuration.
///
/// Every field is optional; an empty document yields the defaults.
///
/// # Fields
/// * `frame_budget_ms` - Target duration of a render tick; the loop sleeps off the remainder
/// * `device_sync_timeout_ms` - Bound on each device-synchronization wait inside a render
/// * `worker_thread_name` - Name of the engine worker thread
/// * `preferences_file` - TOML file for persisted preferences (in-memory if absent)
/// * `software_devices` - Simulated adapters for the software backend
/// * `workloads` - Allow-list over the built-in workloads (all if absent)
///
/// # Example
/// ```yaml
/// frame_budget_ms: 16
/// device_sync_timeout_ms: 1000
/// preferences_file: /tmp/kiln/preferences.toml
/// software_devices:
///   - name: Software Rasterizer
///     uuid: 6b696c6e-0000-4000-8000-000000000001
///     device_type: cpu
///   - name: Slow Adapter
///     latency_ms: 40
/// workloads: [Clear, SlowLoad]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub frame_budget_ms: u64,
    pub device_sync_timeout_ms: u64,
    pub worker_thread_name: String,
    pub preferences_file: Option<PathBuf>,
    pub software_devices: Vec<SoftwareDeviceConfig>,
    pub workloads: Option<Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_budget_ms: DEFAULT_FRAME_BUDGET_MS,
            device_sync_timeout_ms: DEFAULT_DEVICE_SYNC_TIMEOUT_MS,
            worker_thread_name: DEFAULT_WORKER_THREAD_NAME.to_string(),
            preferences_file: None,
            software_devices: Vec::new(),
            workloads: None,
        }
    }
}

impl EngineConfig {
    pub fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }

    pub fn device_sync_timeout(&self) -> Duration {
        Duration::from_millis(self.device_sync_timeout_ms)
    }
}

/// Parse a config from YAML text without validating it
pub fn parse_config(yaml: &str) -> Result<EngineConfig, ConfigError> {
    // serde_yaml rejects an empty document; treat it as "all defaults".
    if yaml.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

/// Load a config from a YAML file without validating it
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Load and validate a config from a YAML file
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let cfg = load_config(path)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Check the rules serde cannot express
///
/// * the device sync timeout is non-zero
/// * software device names are unique
/// * every allow-listed workload is a built-in one
pub fn validate(cfg: &EngineConfig) -> Result<(), ConfigError> {
    if cfg.device_sync_timeout_ms == 0 {
        return Err(ConfigError::ZeroSyncTimeout);
    }

    let mut seen = HashSet::new();
    for device in &cfg.software_devices {
        if !seen.insert(device.name.as_str()) {
            return Err(ConfigError::DuplicateDeviceName(device.name.clone()));
        }
    }

    if let Some(workloads) = &cfg.workloads {
        let built_in = LocalWorkloadFactory::registry();
        if let Some(unknown) = workloads.iter().find(|name| !built_in.contains(name.as_str())) {
            return Err(ConfigError::UnknownWorkload(unknown.clone()));
        }
    }

    Ok(())
}
