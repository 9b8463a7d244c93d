// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message is a small struct borrowing the values it reports. `Display`
//! renders the human-readable line; [`StructuredLog`] emits it at the right
//! level with every field attached as a structured tracing field.
//!
//! # Organization
//!
//! * `engine` - worker lifecycle, command outcomes, viewport and frame events
//! * `device` - instance creation, enumeration and device selection
//! * `workload` - workload start, failure and close
//! * `preferences` - loading and persisting user preferences
//!
//! # Usage Pattern
//!
//! ```rust
//! use kiln::observability::messages::engine::ViewportResized;
//! use kiln::observability::messages::StructuredLog;
//!
//! ViewportResized {
//!     width: 800,
//!     height: 600,
//! }
//! .log();
//! ```

use tracing::Span;

pub mod device;
pub mod engine;
pub mod preferences;
pub mod workload;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
