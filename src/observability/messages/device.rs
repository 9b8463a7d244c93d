// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for graphics instance and device events.

use crate::engine::DeviceSelection;
use crate::errors::DeviceError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;
use uuid::Uuid;

/// The graphics instance was created on first use.
///
/// # Log Level
/// `info!` - Happens once per engine
pub struct InstanceCreated;

impl Display for InstanceCreated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Graphics instance created")
    }
}

impl StructuredLog for InstanceCreated {
    fn log(&self) {
        tracing::info!("{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("instance_created", span_name = name)
    }
}

/// Creating the instance or enumerating its devices failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct EnumerationFailed<'a> {
    pub error: &'a DeviceError,
}

impl Display for EnumerationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Device enumeration failed: {}", self.error)
    }
}

impl StructuredLog for EnumerationFailed<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("enumeration_failed", span_name = name, error = %self.error)
    }
}

/// A device matched the requested selection.
///
/// # Log Level
/// `debug!` - Detail behind the engine-level `DeviceApplied`
pub struct DeviceSelected<'a> {
    pub name: &'a str,
    pub uuid: Option<Uuid>,
}

impl Display for DeviceSelected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.uuid {
            Some(uuid) => write!(f, "Selected device '{}' ({})", self.name, uuid),
            None => write!(f, "Selected device '{}'", self.name),
        }
    }
}

impl StructuredLog for DeviceSelected<'_> {
    fn log(&self) {
        tracing::debug!(device = self.name, uuid = ?self.uuid, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("device_selected", span_name = name, device = self.name)
    }
}

/// No visible device matched the requested selection.
///
/// # Log Level
/// `warn!` - The request is ignored and the current device kept
///
/// # Example
/// ```
/// use kiln::engine::DeviceSelection;
/// use kiln::observability::messages::device::NoMatchingDevice;
///
/// let selection = DeviceSelection::new("Gone");
/// let msg = NoMatchingDevice { selection: &selection };
///
/// assert_eq!(msg.to_string(), "No device matches 'Gone'");
/// ```
pub struct NoMatchingDevice<'a> {
    pub selection: &'a DeviceSelection,
}

impl Display for NoMatchingDevice<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "No device matches '{}'", self.selection.name)
    }
}

impl StructuredLog for NoMatchingDevice<'_> {
    fn log(&self) {
        tracing::warn!(
            device = %self.selection.name,
            uuid = ?self.selection.uuid,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "no_matching_device",
            span_name = name,
            device = %self.selection.name,
        )
    }
}
