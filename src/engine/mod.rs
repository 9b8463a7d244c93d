// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The workload execution engine.
//!
//! One dedicated worker thread owns the graphics device, the output image
//! and the active workload. Callers on any thread talk to it through an
//! [`Engine`]: mutating operations are queued as commands and answered
//! through [`CommandFuture`]s, while notifications flow back out through an
//! [`EventBus`].
//!
//! ```text
//!  callers ──submit──▶ CommandChannel ──FIFO──▶ ExecutionLoop (worker)
//!     ▲                                          │  DeviceRegistry
//!     │                                          │  ImageSurface
//!     └──────────── EventBus ◀───── publish ─────┘  WorkloadSlot
//! ```
//!
//! # Example
//! ```no_run
//! use kiln::engine::{DeviceSelection, Engine};
//!
//! let engine = Engine::builder().start()?;
//! let devices = engine.list_devices().wait()?;
//! engine.set_device(DeviceSelection::from(&devices[0])).wait()?;
//! engine.set_viewport_size(640, 480).wait()?;
//! engine.select_workload("Clear").wait()?;
//! engine.shutdown_blocking();
//! # Ok::<(), kiln::errors::EngineError>(())
//! ```

pub mod channel;
pub mod devices;
pub mod events;
pub mod execution;
pub mod handle;
pub mod slot;
pub mod state;
pub mod surface;

#[cfg(test)]
mod integration_tests;

pub use channel::CommandFuture;
pub use devices::{find_device, DeviceRegistry, DeviceSelection};
pub use events::{EngineEvent, EventBus, EventStream, Subscription};
pub use execution::LoopState;
pub use handle::{Engine, EngineBuilder};
pub use slot::WorkloadSlot;
pub use state::{EngineState, Snapshots};
pub use surface::{ImageSurface, PixelBuffer, Viewport, BYTES_PER_PIXEL};
