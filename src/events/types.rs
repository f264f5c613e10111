//! Event type definitions for progress reporting.

use crate::core::pipeline::StageState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All events emitted by a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Run-level events
    Pipeline(PipelineEvent),
    /// Per-stage lifecycle and throughput events
    Stage(StageEvent),
}

/// Run-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// A run has started
    Started { run_id: Uuid, stages: Vec<String> },
    /// The run finished and the terminal queue was drained
    Completed { summary: PipelineSummary },
    /// The run was aborted by a fatal error
    Failed { run_id: Uuid, message: String },
}

/// Per-stage events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageEvent {
    /// A stage moved to a new lifecycle state
    StateChanged {
        index: usize,
        name: String,
        state: StageState,
    },
    /// A stage wrote one value to its output queue
    ItemForwarded { index: usize },
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Identifier of the run
    pub run_id: Uuid,
    /// Number of values the producer emitted
    pub values_in: usize,
    /// Number of values drained from the terminal queue
    pub values_out: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Stage(StageEvent::StateChanged {
            index: 1,
            name: "sextuple_hash".to_string(),
            state: StageState::Joining,
        });

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Stage(StageEvent::StateChanged { index, state, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(state, StageState::Joining);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn pipeline_summary_is_serializable() {
        let summary = PipelineSummary {
            run_id: Uuid::nil(),
            values_in: 7,
            values_out: 1,
            duration_ms: 1500,
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("1500"));
    }
}
