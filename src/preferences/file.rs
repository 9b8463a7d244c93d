// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Preferences, PreferencesStore};
use crate::engine::DeviceSelection;
use crate::errors::PreferencesError;
use crate::observability::messages::preferences::{
    PreferencesFileMissing, PreferencesLoaded, PreferencesSaved,
};
use crate::observability::messages::StructuredLog;

/// On-disk layout.
///
/// ```toml
/// debugging = false
///
/// [device]
/// name = "Software Rasterizer"
/// uuid = "6b696c6e-0000-4000-8000-000000000001"
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferencesDocument {
    #[serde(default)]
    debugging: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    device: Option<DeviceEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DeviceEntry {
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uuid: Option<Uuid>,
}

impl From<PreferencesDocument> for Preferences {
    fn from(document: PreferencesDocument) -> Self {
        // An empty name means no selection; a nil UUID means "match by name".
        let device_selection = document
            .device
            .filter(|device| !device.name.is_empty())
            .map(|device| DeviceSelection {
                name: device.name,
                uuid: device.uuid.filter(|uuid| !uuid.is_nil()),
            });
        Preferences {
            debugging_enabled: document.debugging,
            device_selection,
        }
    }
}

impl From<&Preferences> for PreferencesDocument {
    fn from(preferences: &Preferences) -> Self {
        PreferencesDocument {
            debugging: preferences.debugging_enabled,
            device: preferences
                .device_selection
                .as_ref()
                .map(|selection| DeviceEntry {
                    name: selection.name.clone(),
                    uuid: selection.uuid,
                }),
        }
    }
}

/// Preferences persisted to a TOML file.
///
/// Saves go to a uniquely named sibling file which is then renamed over the
/// target, so a crash mid-save never leaves a truncated file behind.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    current: ArcSwap<Preferences>,
    writer: Mutex<()>,
}

impl FilePreferences {
    /// Load preferences from `path`, or start from defaults if it does not exist.
    pub fn open_or_default(path: impl Into<PathBuf>) -> Result<Self, PreferencesError> {
        let path = path.into();
        let preferences = match fs::read_to_string(&path) {
            Ok(text) => {
                let document: PreferencesDocument = toml::from_str(&text)?;
                let preferences = Preferences::from(document);
                PreferencesLoaded {
                    path: &path,
                    has_device: preferences.device_selection.is_some(),
                }
                .log();
                preferences
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                PreferencesFileMissing { path: &path }.log();
                Preferences::default()
            }
            Err(source) => return Err(PreferencesError::Io { path, source }),
        };

        Ok(Self {
            path,
            current: ArcSwap::from_pointee(preferences),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist then publish. Callers hold `writer`.
    fn commit(&self, preferences: Preferences) -> Result<(), PreferencesError> {
        self.write(&preferences)?;
        self.current.store(preferences.into());
        PreferencesSaved { path: &self.path }.log();
        Ok(())
    }

    fn write(&self, preferences: &Preferences) -> Result<(), PreferencesError> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| PreferencesError::Io { path, source }
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        let text = toml::to_string(&PreferencesDocument::from(preferences))?;
        let staging = self.path.with_file_name(format!("{}.toml", Uuid::new_v4()));
        if let Err(source) = fs::write(&staging, text) {
            let _ = fs::remove_file(&staging);
            return Err(PreferencesError::Io {
                path: staging,
                source,
            });
        }
        fs::rename(&staging, &self.path).map_err(|source| {
            let _ = fs::remove_file(&staging);
            PreferencesError::Io {
                path: self.path.clone(),
                source,
            }
        })
    }
}

impl PreferencesStore for FilePreferences {
    fn preferences(&self) -> Preferences {
        self.current.load().as_ref().clone()
    }

    fn save(&self, preferences: Preferences) -> Result<(), PreferencesError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.commit(preferences)
    }

    /// Holds the writer lock across the read so concurrent updates never
    /// overwrite each other.
    fn update(&self, change: &dyn Fn(&mut Preferences)) -> Result<(), PreferencesError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut preferences = self.preferences();
        change(&mut preferences);
        self.commit(preferences)
    }
}
