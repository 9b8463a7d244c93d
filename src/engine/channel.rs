// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Many-producer, single-consumer command queue with one-shot results.
//!
//! Any thread may [`submit`](CommandSender::submit) an operation and get a
//! [`CommandFuture`] back. The single consumer pops commands in strict FIFO
//! order and either executes them against its state or abandons them. Every
//! future resolves exactly once: with the operation's outcome, or with
//! [`EngineError::ShuttingDown`] when the command never ran.
//!
//! The queue is unbounded; there is no backpressure.

use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread::Thread;

use tokio::sync::{mpsc, oneshot};

use crate::errors::EngineError;
use crate::observability::messages::engine::CommandFailed;
use crate::observability::messages::StructuredLog;

/// A queued unit of work against state `S`.
pub(crate) trait Operation<S>: Send {
    /// Run against the state and complete the caller's future.
    fn execute(self: Box<Self>, state: &mut S);

    /// Complete the caller's future without running.
    fn abandon(self: Box<Self>);
}

pub(crate) type Command<S> = Box<dyn Operation<S>>;

struct Pending<S, T, F> {
    label: &'static str,
    op: F,
    reply: oneshot::Sender<Result<T, EngineError>>,
    _state: PhantomData<fn(&mut S)>,
}

impl<S, T, F> Operation<S> for Pending<S, T, F>
where
    F: FnOnce(&mut S) -> Result<T, EngineError> + Send + 'static,
    T: Send + 'static,
{
    fn execute(self: Box<Self>, state: &mut S) {
        let Pending {
            label, op, reply, ..
        } = *self;

        let result = panic::catch_unwind(AssertUnwindSafe(|| op(state)))
            .unwrap_or_else(|payload| Err(EngineError::CommandPanicked(panic_message(payload.as_ref()))));

        if let Err(error) = &result {
            CommandFailed {
                command: label,
                error,
            }
            .log();
        }

        // The caller may have dropped its future; the outcome is then discarded.
        let _ = reply.send(result);
    }

    fn abandon(self: Box<Self>) {
        let _ = self.reply.send(Err(EngineError::ShuttingDown));
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Create a connected sender/receiver pair.
pub(crate) fn channel<S>() -> (CommandSender<S>, CommandReceiver<S>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        CommandSender { tx, waker: None },
        CommandReceiver { rx },
    )
}

/// Producer side. Cheap to clone.
pub(crate) struct CommandSender<S> {
    tx: mpsc::UnboundedSender<Command<S>>,
    waker: Option<Thread>,
}

impl<S> Clone for CommandSender<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            waker: self.waker.clone(),
        }
    }
}

impl<S: 'static> CommandSender<S> {
    /// Unpark `thread` after every submission.
    pub fn with_waker(mut self, thread: Thread) -> Self {
        self.waker = Some(thread);
        self
    }

    pub fn submit<T, F>(&self, label: &'static str, op: F) -> CommandFuture<T>
    where
        F: FnOnce(&mut S) -> Result<T, EngineError> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, receiver) = oneshot::channel();
        let command: Command<S> = Box::new(Pending {
            label,
            op,
            reply,
            _state: PhantomData,
        });

        match self.tx.send(command) {
            Ok(()) => self.wake(),
            Err(mpsc::error::SendError(command)) => command.abandon(),
        }

        CommandFuture { receiver }
    }

    pub fn wake(&self) {
        if let Some(thread) = &self.waker {
            thread.unpark();
        }
    }
}

/// Consumer side, owned by the execution loop.
pub(crate) struct CommandReceiver<S> {
    rx: mpsc::UnboundedReceiver<Command<S>>,
}

impl<S> CommandReceiver<S> {
    /// Non-blocking pop of the oldest command.
    pub fn try_next(&mut self) -> Option<Command<S>> {
        self.rx.try_recv().ok()
    }

    /// Refuse further submissions and abandon everything still queued.
    ///
    /// Returns the number of abandoned commands.
    pub fn close_and_abandon(&mut self) -> usize {
        self.rx.close();
        let mut abandoned = 0;
        while let Ok(command) = self.rx.try_recv() {
            command.abandon();
            abandoned += 1;
        }
        abandoned
    }
}

/// The caller's handle on a submitted command.
///
/// Resolves to the command's result. Can be awaited from async code or
/// waited on with [`wait`](Self::wait) from a plain thread.
#[must_use = "a command's outcome is only observable through its future"]
pub struct CommandFuture<T> {
    receiver: oneshot::Receiver<Result<T, EngineError>>,
}

impl<T> CommandFuture<T> {
    /// Block the current thread until the command completes.
    ///
    /// Panics if called from within an async runtime.
    pub fn wait(self) -> Result<T, EngineError> {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(EngineError::ShuttingDown))
    }

    /// The result, if the command has completed.
    pub fn try_result(&mut self) -> Option<Result<T, EngineError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(EngineError::ShuttingDown)),
        }
    }
}

impl<T> Future for CommandFuture<T> {
    type Output = Result<T, EngineError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(EngineError::ShuttingDown)))
    }
}
