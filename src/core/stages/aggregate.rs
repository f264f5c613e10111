//! Deterministic aggregation stage.

use crate::core::pipeline::{Stage, StageContext};
use crate::core::value::Value;
use crate::error::PipelineError;
use tracing::trace;

/// Joins the sorted values into the final result
pub const JOINER: &str = "_";

/// Sort every supported value lexicographically and join with `_`.
///
/// Unsupported values are dropped; an empty input gives an empty string.
pub fn aggregate_values<I: IntoIterator<Item = Value>>(values: I) -> String {
    let mut texts: Vec<String> = values
        .into_iter()
        .filter_map(|value| match value {
            Value::Text(text) => Some(text),
            Value::Number(number) => Some(number.to_string()),
            Value::Unsupported(kind) => {
                trace!(%kind, "aggregator skipping unsupported value");
                None
            }
        })
        .collect();
    texts.sort_unstable();
    texts.join(JOINER)
}

/// Collects the whole stream and emits exactly one aggregated value
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateStage;

impl AggregateStage {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for AggregateStage {
    fn name(&self) -> &str {
        "aggregate"
    }

    fn run(&self, ctx: &StageContext) -> Result<(), PipelineError> {
        let combined = aggregate_values(ctx.drain());
        ctx.output().send(Value::Text(combined))
    }
}
