// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use arc_swap::ArcSwap;

use super::{Preferences, PreferencesStore};
use crate::errors::PreferencesError;

/// Preferences held in memory only.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    current: ArcSwap<Preferences>,
}

impl MemoryPreferences {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            current: ArcSwap::from_pointee(preferences),
        }
    }
}

impl PreferencesStore for MemoryPreferences {
    fn preferences(&self) -> Preferences {
        self.current.load().as_ref().clone()
    }

    fn save(&self, preferences: Preferences) -> Result<(), PreferencesError> {
        self.current.store(preferences.into());
        Ok(())
    }
}
