// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Operator preferences that outlive a session.
//!
//! The engine reads the stored device selection once at startup and writes
//! it back whenever `set_device` applies a new one. Two stores are provided:
//! [`MemoryPreferences`] for tests and embedding, and [`FilePreferences`]
//! for a TOML file on disk.

mod file;
mod memory;

pub use file::FilePreferences;
pub use memory::MemoryPreferences;

use crate::engine::DeviceSelection;
use crate::errors::PreferencesError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub debugging_enabled: bool,
    pub device_selection: Option<DeviceSelection>,
}

/// Somewhere preferences live.
pub trait PreferencesStore: Send + Sync {
    /// The current preferences.
    fn preferences(&self) -> Preferences;

    /// Replace the stored preferences.
    fn save(&self, preferences: Preferences) -> Result<(), PreferencesError>;

    /// Read, modify and save in one step.
    fn update(&self, change: &dyn Fn(&mut Preferences)) -> Result<(), PreferencesError> {
        let mut preferences = self.preferences();
        change(&mut preferences);
        self.save(preferences)
    }
}
