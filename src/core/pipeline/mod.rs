//! # Pipeline Module
//!
//! A generic staged pipeline connected by bounded queues.
//!
//! ## Shape
//! ```text
//! producer -> [q0] -> stage 0 -> [q1] -> stage 1 -> ... -> [qn] -> terminal drain
//! ```
//!
//! ## Shutdown Discipline
//! Every stage runs on its own scoped thread and moves through
//! `Running -> Draining -> Joining -> Closed`. Subtasks only borrow the
//! stage's output queue, and the executor drops that queue after the stage
//! body has returned, so nothing can write to a closed queue.
//!
//! ## Parallelism
//! [`FanOut`] launches one subtask per value, either on scoped OS threads
//! or on a bounded rayon pool.

mod executor;
mod fan_out;
mod queue;
mod stage;

pub use executor::{
    Pipeline, PipelineBuilder, PipelineConfig, PipelineResult, DEFAULT_QUEUE_CAPACITY,
};
pub use fan_out::{Concurrency, FanOut};
pub use queue::{Inbox, Outbox};
pub use stage::{FnStage, Stage, StageContext, StageState};
