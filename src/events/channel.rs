//! Progress transport between the engine and a UI thread.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use super::Event;

/// Events a progress channel buffers before the engine waits on the UI
pub const PROGRESS_BUFFER: usize = 256;

/// Engine-side handle. Cloned into worker threads.
///
/// A detached sender drops every event without touching a channel.
#[derive(Clone)]
pub struct EventSender {
    inner: Option<Sender<Event>>,
}

impl EventSender {
    pub fn send(&self, event: Event) {
        if let Some(ref sender) = self.inner {
            // A closed receiver only means nobody is watching any more
            let _ = sender.send(event);
        }
    }
}

/// UI-side handle; iteration ends once every sender is dropped
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Factory for sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Unbounded pair; the engine never blocks on a slow reader
    pub fn new() -> (EventSender, EventReceiver) {
        Self::wrap(unbounded())
    }

    /// Pair holding at most `capacity` undelivered events
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        Self::wrap(bounded(capacity))
    }

    fn wrap((sender, receiver): (Sender<Event>, Receiver<Event>)) -> (EventSender, EventReceiver) {
        (
            EventSender { inner: Some(sender) },
            EventReceiver { inner: receiver },
        )
    }
}

/// Sender for runs nobody watches
pub fn null_sender() -> EventSender {
    EventSender { inner: None }
}
