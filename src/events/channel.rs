//! Event plumbing between a running pipeline and its observer.

use super::Event;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Sending half handed to stages and subtasks.
///
/// Clones share the same observer. A sender built by [`null_sender`] has no
/// observer and drops every event on the floor.
#[derive(Clone)]
pub struct EventSender {
    inner: Option<Sender<Event>>,
}

impl EventSender {
    /// Report an event. Never blocks, never fails: a departed observer
    /// just stops hearing about the run.
    pub fn send(&self, event: Event) {
        if let Some(sender) = &self.inner {
            let _ = sender.send(event);
        }
    }
}

/// Observer half of an event channel.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Events as they arrive, until every sender is gone
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Everything already queued, without waiting for more
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }
}

/// Open an unbounded event channel, so reporting never stalls a stage.
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (sender, receiver) = unbounded();
    (
        EventSender {
            inner: Some(sender),
        },
        EventReceiver { inner: receiver },
    )
}

/// A sender for runs nobody is watching.
pub fn null_sender() -> EventSender {
    EventSender { inner: None }
}
