// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The engine worker's loop.
//!
//! Each turn pops at most one command and runs it, then attempts one render
//! tick, then checks the stop flag. Commands and render ticks therefore never
//! overlap, and a command submitted before another always runs first.
//!
//! ```text
//!   Running ──stop flag──▶ Stopping ──resources released──▶ Stopped
//! ```
//!
//! Entering `Stopping` closes the command queue: everything still queued is
//! completed with [`EngineError::ShuttingDown`](crate::errors::EngineError::ShuttingDown)
//! and nothing new is accepted.

use std::thread;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::engine::channel::CommandReceiver;
use crate::engine::state::EngineState;
use crate::observability::messages::engine::{WorkerStarted, WorkerStopped, WorkerStopping};
use crate::observability::messages::StructuredLog;

/// Lifecycle of the execution loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopping,
    Stopped,
}

/// What a single [`ExecutionLoop::turn`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TurnOutcome {
    /// No command was waiting and nothing could render.
    Idle,
    /// A command ran or a frame was rendered.
    Busy,
    /// The loop has torn down; further turns do nothing.
    Stopped,
}

pub(crate) struct ExecutionLoop {
    state: EngineState,
    commands: CommandReceiver<EngineState>,
    stop: CancellationToken,
    status: watch::Sender<LoopState>,
    idle_wait: Duration,
    thread_name: String,
}

impl ExecutionLoop {
    pub fn new(
        state: EngineState,
        commands: CommandReceiver<EngineState>,
        stop: CancellationToken,
        status: watch::Sender<LoopState>,
        idle_wait: Duration,
        thread_name: String,
    ) -> Self {
        Self {
            state,
            commands,
            stop,
            status,
            idle_wait,
            thread_name,
        }
    }

    pub fn loop_state(&self) -> LoopState {
        *self.status.borrow()
    }

    /// Run one iteration.
    pub fn turn(&mut self) -> TurnOutcome {
        if self.loop_state() == LoopState::Stopped {
            return TurnOutcome::Stopped;
        }

        let mut busy = false;
        if let Some(command) = self.commands.try_next() {
            command.execute(&mut self.state);
            busy = true;
        }

        if self.state.render_tick() {
            busy = true;
        }

        if self.stop.is_cancelled() {
            self.teardown();
            return TurnOutcome::Stopped;
        }

        if busy {
            TurnOutcome::Busy
        } else {
            TurnOutcome::Idle
        }
    }

    /// Turn until stopped. Idle turns park the thread for up to `idle_wait`;
    /// submissions and stop requests unpark it.
    pub fn run(mut self) {
        let started = WorkerStarted {
            thread_name: &self.thread_name,
            idle_wait: self.idle_wait,
        };
        let span = started.span("engine_worker");
        let _guard = span.enter();
        started.log();

        loop {
            match self.turn() {
                TurnOutcome::Stopped => break,
                TurnOutcome::Idle => thread::park_timeout(self.idle_wait),
                TurnOutcome::Busy => {}
            }
        }
    }

    fn teardown(&mut self) {
        self.status.send_replace(LoopState::Stopping);
        let abandoned = self.commands.close_and_abandon();
        WorkerStopping { abandoned }.log();

        self.state.release();

        self.status.send_replace(LoopState::Stopped);
        WorkerStopped.log();
    }

    #[cfg(test)]
    pub fn state(&self) -> &EngineState {
        &self.state
    }
}

impl Drop for ExecutionLoop {
    fn drop(&mut self) {
        // Covers a loop dropped without ever seeing the stop flag.
        if self.loop_state() != LoopState::Stopped {
            self.teardown();
        }
    }
}
