// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating engine configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The device synchronization timeout must allow at least one wait
    #[error("device_sync_timeout_ms must be greater than zero")]
    ZeroSyncTimeout,

    /// Two software devices share a name, making name-based selection ambiguous
    #[error("Duplicate software device name: '{0}'")]
    DuplicateDeviceName(String),

    /// The workload allow-list names a workload that is not built in
    #[error("Unknown workload in allow-list: '{0}'")]
    UnknownWorkload(String),
}
