//! Stage-facing ends of the bounded queues between stages.

use crate::core::value::Value;
use crate::error::PipelineError;
use crate::events::{Event, EventSender, StageEvent};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicUsize, Ordering};

/// The receiving end of a stage's input queue
pub struct Inbox {
    receiver: Receiver<Value>,
}

impl Inbox {
    pub(crate) fn new(receiver: Receiver<Value>) -> Self {
        Self { receiver }
    }

    /// Block until the next value arrives, or return `None` once the
    /// upstream stage has closed the queue and it is empty
    pub fn recv(&self) -> Option<Value> {
        self.receiver.recv().ok()
    }

    /// Iterate until the queue is closed and drained
    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        self.receiver.iter()
    }
}

/// The sending end of a stage's output queue.
///
/// Shared by reference with every subtask of the stage. The queue closes
/// when the executor drops the `Outbox`.
pub struct Outbox {
    sender: Sender<Value>,
    stage_index: usize,
    stage_name: String,
    forwarded: AtomicUsize,
    events: EventSender,
}

impl Outbox {
    pub(crate) fn new(
        sender: Sender<Value>,
        stage_index: usize,
        stage_name: String,
        events: EventSender,
    ) -> Self {
        Self {
            sender,
            stage_index,
            stage_name,
            forwarded: AtomicUsize::new(0),
            events,
        }
    }

    /// Write one value downstream, blocking while the queue is full.
    ///
    /// Fails only if the downstream stage has already gone away.
    pub fn send(&self, value: Value) -> Result<(), PipelineError> {
        self.sender
            .send(value)
            .map_err(|_| PipelineError::DownstreamClosed {
                stage: self.stage_name.clone(),
            })?;
        self.forwarded.fetch_add(1, Ordering::SeqCst);
        self.events.send(Event::Stage(StageEvent::ItemForwarded {
            index: self.stage_index,
        }));
        Ok(())
    }

    /// Number of values written so far
    pub fn forwarded(&self) -> usize {
        self.forwarded.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::null_sender;
    use crossbeam_channel::bounded;

    #[test]
    fn send_counts_forwarded_values() {
        let (sender, receiver) = bounded(4);
        let outbox = Outbox::new(sender, 0, "test".to_string(), null_sender());

        outbox.send(Value::from("a")).unwrap();
        outbox.send(Value::from(1)).unwrap();
        drop(outbox);

        let inbox = Inbox::new(receiver);
        let received: Vec<Value> = inbox.iter().collect();
        assert_eq!(received, vec![Value::from("a"), Value::Number(1)]);
    }

    #[test]
    fn send_after_receiver_dropped_reports_stage() {
        let (sender, receiver) = bounded(1);
        drop(receiver);
        let outbox = Outbox::new(sender, 3, "sextuple_hash".to_string(), null_sender());

        let error = outbox.send(Value::from("x")).unwrap_err();
        assert!(matches!(
            error,
            PipelineError::DownstreamClosed { ref stage } if stage == "sextuple_hash"
        ));
        assert_eq!(outbox.forwarded(), 0);
    }

    #[test]
    fn recv_returns_none_after_close() {
        let (sender, receiver) = bounded(1);
        sender.send(Value::from("only")).unwrap();
        drop(sender);

        let inbox = Inbox::new(receiver);
        assert_eq!(inbox.recv(), Some(Value::from("only")));
        assert_eq!(inbox.recv(), None);
    }
}
