//! The concurrent fan-out runner: one subtask per input value.

use super::stage::{StageContext, StageState};
use crate::core::value::Value;
use crate::error::{ConfigError, PipelineError};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::num::NonZeroUsize;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use tracing::{debug, trace};

/// How many subtasks a fan-out stage may run at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    /// One scoped thread per value, no cap
    #[default]
    Unbounded,
    /// A dedicated rayon pool with this many workers
    Bounded(NonZeroUsize),
}

impl Concurrency {
    /// A bounded concurrency of `workers` subtasks
    pub fn bounded(workers: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(workers)
            .map(Concurrency::Bounded)
            .ok_or(ConfigError::InvalidWorkers { value: workers })
    }
}

impl std::fmt::Display for Concurrency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Concurrency::Unbounded => write!(f, "unbounded"),
            Concurrency::Bounded(workers) => write!(f, "{} workers", workers),
        }
    }
}

/// Launches one subtask per input value and forwards each result.
///
/// [`FanOut::run`] returns only after the input queue is exhausted and
/// every subtask has finished. It never closes the output queue.
#[derive(Clone)]
pub struct FanOut {
    concurrency: Concurrency,
    pool: Option<Arc<ThreadPool>>,
}

impl FanOut {
    pub fn new(concurrency: Concurrency) -> Result<Self, ConfigError> {
        let pool = match concurrency {
            Concurrency::Unbounded => None,
            Concurrency::Bounded(workers) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(workers.get())
                    .thread_name(|i| format!("fan-out-{}", i))
                    .build()
                    .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;
                Some(Arc::new(pool))
            }
        };
        Ok(Self { concurrency, pool })
    }

    /// A runner with one thread per value
    pub fn unbounded() -> Self {
        Self {
            concurrency: Concurrency::Unbounded,
            pool: None,
        }
    }

    /// Apply `transform` to every supported value of the stage's input.
    ///
    /// The first failing subtask wins: no new subtasks are launched after
    /// it, in-flight ones are joined, and its error is returned. A panicking
    /// subtask is re-raised after the join.
    pub fn run<F>(&self, ctx: &StageContext, transform: F) -> Result<(), PipelineError>
    where
        F: Fn(String) -> Result<String, PipelineError> + Sync,
    {
        let failure = FirstFailure::default();
        let forward = |text: String| {
            let outcome = transform(text).and_then(|hashed| ctx.output().send(Value::Text(hashed)));
            if let Err(error) = outcome {
                failure.record(error);
            }
        };

        let launched = match &self.pool {
            None => launch_threads(ctx, &forward, &failure),
            Some(pool) => launch_on_pool(pool, ctx, &forward, &failure),
        };

        debug!(stage = ctx.name(), launched, concurrency = %self.concurrency, "fan-out joined");
        failure.into_result()
    }

    /// Run `left` and `right` concurrently within one subtask.
    ///
    /// Unbounded runners give `left` its own scoped thread; bounded ones
    /// stay on their pool.
    pub fn join<A, B, RA, RB>(&self, left: A, right: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| rayon::join(left, right)),
            None => thread::scope(|scope| {
                let left = scope.spawn(left);
                let right = right();
                (join_subtask(left), right)
            }),
        }
    }

    /// Compute `task(0)..task(count)` concurrently, results in index order.
    pub fn map_indexed<T, F>(&self, count: usize, task: F) -> Vec<T>
    where
        F: Fn(usize) -> T + Sync,
        T: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| (0..count).into_par_iter().map(&task).collect()),
            None => thread::scope(|scope| {
                let task = &task;
                let handles: Vec<_> = (0..count)
                    .map(|index| scope.spawn(move || task(index)))
                    .collect();
                handles.into_iter().map(join_subtask).collect()
            }),
        }
    }
}

impl std::fmt::Debug for FanOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOut")
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

fn launch_threads<G>(ctx: &StageContext, forward: &G, failure: &FirstFailure) -> usize
where
    G: Fn(String) + Sync,
{
    thread::scope(|scope| {
        let mut handles = Vec::new();
        for value in ctx.drain() {
            let Some(text) = accept(ctx, value) else {
                continue;
            };
            handles.push(scope.spawn(move || forward(text)));
            if failure.is_set() {
                break;
            }
        }

        ctx.advance(StageState::Joining);
        let launched = handles.len();
        let mut panicked = None;
        for handle in handles {
            if let Err(payload) = handle.join() {
                panicked.get_or_insert(payload);
            }
        }
        if let Some(payload) = panicked {
            panic::resume_unwind(payload);
        }
        launched
    })
}

fn launch_on_pool<G>(
    pool: &ThreadPool,
    ctx: &StageContext,
    forward: &G,
    failure: &FirstFailure,
) -> usize
where
    G: Fn(String) + Sync,
{
    pool.in_place_scope(|scope| {
        let mut launched = 0;
        for value in ctx.drain() {
            let Some(text) = accept(ctx, value) else {
                continue;
            };
            launched += 1;
            scope.spawn(move |_| forward(text));
            if failure.is_set() {
                break;
            }
        }
        ctx.advance(StageState::Joining);
        launched
    })
}

fn join_subtask<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|payload| panic::resume_unwind(payload))
}

/// Text to process, or `None` for values the stage must drop
fn accept(ctx: &StageContext, value: Value) -> Option<String> {
    match value {
        Value::Text(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Unsupported(kind) => {
            trace!(stage = ctx.name(), %kind, "skipping unsupported value");
            None
        }
    }
}

#[derive(Default)]
struct FirstFailure {
    failed: AtomicBool,
    error: Mutex<Option<PipelineError>>,
}

impl FirstFailure {
    fn record(&self, error: PipelineError) {
        let mut slot = self.error.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(error);
            self.failed.store(true, Ordering::SeqCst);
        }
    }

    fn is_set(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    fn into_result(self) -> Result<(), PipelineError> {
        match self.error.into_inner().unwrap_or_else(PoisonError::into_inner) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
