//! Stage trait, per-stage context and the stage lifecycle.

use super::queue::{Inbox, Outbox};
use crate::core::value::Value;
use crate::error::PipelineError;
use crate::events::{Event, EventSender, StageEvent};
use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::debug;

/// Lifecycle of a stage. States only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StageState {
    /// The stage body has started
    Running,
    /// Consuming the input queue until it is closed
    Draining,
    /// Input exhausted, waiting for spawned subtasks
    Joining,
    /// The output queue has been closed by the executor
    Closed,
}

impl StageState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => StageState::Running,
            1 => StageState::Draining,
            2 => StageState::Joining,
            _ => StageState::Closed,
        }
    }
}

impl std::fmt::Display for StageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageState::Running => write!(f, "Running"),
            StageState::Draining => write!(f, "Draining"),
            StageState::Joining => write!(f, "Joining"),
            StageState::Closed => write!(f, "Closed"),
        }
    }
}

/// One unit of a pipeline: consumes its input queue, produces its output queue
pub trait Stage: Send + Sync {
    /// Stage name, used in events and errors
    fn name(&self) -> &str;

    /// Run the stage to completion.
    ///
    /// Must not return before every subtask it spawned has finished. Closing
    /// the output is the executor's job.
    fn run(&self, ctx: &StageContext) -> Result<(), PipelineError>;
}

/// A stage built from a closure
pub struct FnStage<F> {
    name: String,
    body: F,
}

impl<F> FnStage<F>
where
    F: Fn(&StageContext) -> Result<(), PipelineError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, body: F) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

impl<F> Stage for FnStage<F>
where
    F: Fn(&StageContext) -> Result<(), PipelineError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &StageContext) -> Result<(), PipelineError> {
        (self.body)(ctx)
    }
}

/// Everything a running stage can touch: its two queues and its lifecycle
pub struct StageContext {
    index: usize,
    name: String,
    input: Inbox,
    output: Outbox,
    state: AtomicU8,
    events: EventSender,
}

impl StageContext {
    pub(crate) fn new(
        index: usize,
        name: &str,
        input: Receiver<Value>,
        output: Sender<Value>,
        events: EventSender,
    ) -> Self {
        let ctx = Self {
            index,
            name: name.to_string(),
            input: Inbox::new(input),
            output: Outbox::new(output, index, name.to_string(), events.clone()),
            state: AtomicU8::new(StageState::Running as u8),
            events,
        };
        ctx.announce(StageState::Running);
        ctx
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input(&self) -> &Inbox {
        &self.input
    }

    pub fn output(&self) -> &Outbox {
        &self.output
    }

    pub fn state(&self) -> StageState {
        StageState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Enter `Draining` and iterate the input until it is closed
    pub fn drain(&self) -> impl Iterator<Item = Value> + '_ {
        self.advance(StageState::Draining);
        self.input.iter()
    }

    /// Move the stage forward to `next`.
    ///
    /// Returns `false` if the stage is already at or past `next`. `Closed`
    /// is reserved for the executor.
    pub fn advance(&self, next: StageState) -> bool {
        if next == StageState::Closed {
            return false;
        }
        self.transition(next)
    }

    fn transition(&self, next: StageState) -> bool {
        let target = next as u8;
        let mut current = self.state.load(Ordering::SeqCst);
        loop {
            if target <= current {
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                target,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        self.announce(next);
        true
    }

    fn announce(&self, state: StageState) {
        debug!(stage = %self.name, index = self.index, %state, "stage state changed");
        self.events.send(Event::Stage(StageEvent::StateChanged {
            index: self.index,
            name: self.name.clone(),
            state,
        }));
    }

    /// Consume whatever the stage body left unread, so upstream never
    /// blocks on a queue nobody reads
    pub(crate) fn discard_remaining(&self) -> usize {
        self.input.iter().count()
    }

    /// Drop both queues and mark the stage `Closed`. Returns the number of
    /// values the stage forwarded.
    pub(crate) fn close(self) -> usize {
        let forwarded = self.output.forwarded();
        let StageContext {
            index,
            name,
            input,
            output,
            state,
            events,
        } = self;
        drop(output);
        drop(input);
        state.store(StageState::Closed as u8, Ordering::SeqCst);
        debug!(stage = %name, index, forwarded, "stage closed");
        events.send(Event::Stage(StageEvent::StateChanged {
            index,
            name,
            state: StageState::Closed,
        }));
        forwarded
    }
}
