// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for preference persistence.

use crate::errors::PreferencesError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// Preferences were read from disk.
pub struct PreferencesLoaded<'a> {
    pub path: &'a Path,
    pub has_device: bool,
}

impl Display for PreferencesLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded preferences from {} (device saved: {})",
            self.path.display(),
            self.has_device
        )
    }
}

impl StructuredLog for PreferencesLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            path = %self.path.display(),
            has_device = self.has_device,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "preferences_loaded",
            span_name = name,
            path = %self.path.display(),
        )
    }
}

/// No preferences file exists yet; defaults are used.
///
/// # Log Level
/// `debug!` - Expected on first run
pub struct PreferencesFileMissing<'a> {
    pub path: &'a Path,
}

impl Display for PreferencesFileMissing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "No preferences at {}, using defaults",
            self.path.display()
        )
    }
}

impl StructuredLog for PreferencesFileMissing<'_> {
    fn log(&self) {
        tracing::debug!(path = %self.path.display(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "preferences_missing",
            span_name = name,
            path = %self.path.display(),
        )
    }
}

pub struct PreferencesSaved<'a> {
    pub path: &'a Path,
}

impl Display for PreferencesSaved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Saved preferences to {}", self.path.display())
    }
}

impl StructuredLog for PreferencesSaved<'_> {
    fn log(&self) {
        tracing::debug!(path = %self.path.display(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "preferences_saved",
            span_name = name,
            path = %self.path.display(),
        )
    }
}

/// Persisting preferences failed. The in-memory change still applies.
///
/// # Log Level
/// `warn!` - The engine continues with unsaved preferences
pub struct PreferencesSaveFailed<'a> {
    pub error: &'a PreferencesError,
}

impl Display for PreferencesSaveFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to save preferences: {}", self.error)
    }
}

impl StructuredLog for PreferencesSaveFailed<'_> {
    fn log(&self) {
        tracing::warn!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("preferences_save_failed", span_name = name, error = %self.error)
    }
}
