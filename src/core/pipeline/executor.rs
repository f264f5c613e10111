//! Pipeline execution implementation.

use super::stage::{Stage, StageContext};
use crate::core::value::Value;
use crate::error::{ConfigError, PipelineError};
use crate::events::{null_sender, Event, EventSender, PipelineEvent, PipelineSummary};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Sender};
use std::panic;
use std::thread;
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// Depth of every queue between stages unless configured otherwise
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Result of pipeline execution
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Identifier of this run
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Everything drained from the terminal queue, in arrival order
    pub outputs: Vec<Value>,
    /// Number of values the producer emitted
    pub values_in: usize,
    /// Number of values each stage forwarded, by stage index
    pub stage_outputs: Vec<usize>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Capacity of each bounded queue
    pub queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            stages: Vec::new(),
        }
    }

    /// Set the capacity of every queue
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Append a stage
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        if self.config.queue_capacity == 0 {
            return Err(ConfigError::InvalidCapacity {
                value: self.config.queue_capacity,
            });
        }
        if self.stages.is_empty() {
            return Err(ConfigError::NoStages);
        }
        Ok(Pipeline {
            config: self.config,
            stages: self.stages,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An ordered chain of stages connected by bounded queues
pub struct Pipeline {
    config: PipelineConfig,
    stages: Vec<Box<dyn Stage>>,
}

struct StageReport {
    result: Result<(), PipelineError>,
    forwarded: usize,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Names of the stages, in order
    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name().to_string()).collect()
    }

    /// Run the pipeline without events
    pub fn run<I>(&self, input: I) -> Result<PipelineResult, PipelineError>
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send,
    {
        self.run_with_events(input, &null_sender())
    }

    /// Run the pipeline with event reporting.
    ///
    /// `input` is the producer: it is drained into the entry queue on its
    /// own thread, and the entry queue closes when it ends. Returns after
    /// every stage has closed and the terminal queue is drained.
    pub fn run_with_events<I>(
        &self,
        input: I,
        events: &EventSender,
    ) -> Result<PipelineResult, PipelineError>
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send,
    {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start_time = Instant::now();
        let capacity = self.config.queue_capacity;

        events.send(Event::Pipeline(PipelineEvent::Started {
            run_id,
            stages: self.stage_names(),
        }));
        debug!(%run_id, stages = self.stages.len(), capacity, "pipeline started");

        let values = input.into_iter();
        let (outputs, values_in, reports) = thread::scope(|scope| {
            let (entry, mut upstream) = bounded::<Value>(capacity);
            let producer = scope.spawn(move || produce(values, entry));

            let mut handles = Vec::with_capacity(self.stages.len());
            for (index, stage) in self.stages.iter().enumerate() {
                let (sender, receiver) = bounded::<Value>(capacity);
                let ctx = StageContext::new(index, stage.name(), upstream, sender, events.clone());
                upstream = receiver;
                let stage = stage.as_ref();
                handles.push(scope.spawn(move || run_stage(stage, ctx)));
            }

            let outputs: Vec<Value> = upstream.iter().collect();

            let mut panicked = None;
            let values_in = match producer.join() {
                Ok(sent) => sent,
                Err(payload) => {
                    panicked = Some(payload);
                    0
                }
            };
            let mut reports = Vec::with_capacity(handles.len());
            for handle in handles {
                match handle.join() {
                    Ok(report) => reports.push(report),
                    Err(payload) => {
                        panicked.get_or_insert(payload);
                    }
                }
            }
            if let Some(payload) = panicked {
                panic::resume_unwind(payload);
            }
            (outputs, values_in, reports)
        });

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let mut stage_outputs = Vec::with_capacity(reports.len());
        let mut root_cause = None;
        let mut echo = None;
        for report in reports {
            stage_outputs.push(report.forwarded);
            if let Err(error) = report.result {
                if error.is_downstream_closed() {
                    echo.get_or_insert(error);
                } else {
                    root_cause.get_or_insert(error);
                }
            }
        }

        if let Some(error) = root_cause.or(echo) {
            debug!(%run_id, %error, "pipeline failed");
            events.send(Event::Pipeline(PipelineEvent::Failed {
                run_id,
                message: error.to_string(),
            }));
            return Err(error);
        }

        debug!(%run_id, values_in, values_out = outputs.len(), duration_ms, "pipeline completed");
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                run_id,
                values_in,
                values_out: outputs.len(),
                duration_ms,
            },
        }));

        Ok(PipelineResult {
            run_id,
            started_at,
            outputs,
            values_in,
            stage_outputs,
            duration_ms,
        })
    }
}

fn produce<T: Iterator<Item = Value>>(values: T, entry: Sender<Value>) -> usize {
    let mut sent = 0;
    for value in values {
        if entry.send(value).is_err() {
            debug!(sent, "entry queue closed, producer stopping");
            break;
        }
        sent += 1;
    }
    sent
}

fn run_stage(stage: &dyn Stage, ctx: StageContext) -> StageReport {
    let result = stage.run(&ctx);
    if result.is_ok() {
        let discarded = ctx.discard_remaining();
        if discarded > 0 {
            debug!(stage = ctx.name(), discarded, "discarded unread input");
        }
    }
    let forwarded = ctx.close();
    StageReport { result, forwarded }
}
