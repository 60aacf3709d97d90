//! # Account notification stream.
//!
//! Domain-level change notifications emitted once per successful mutation,
//! consumed by subscribers outside this crate (UI, account-list refresh).
//! This stream is distinct from the per-address protocol update queues in
//! [`crate::updates`].

use async_channel::{Receiver, Sender, TrySendError};

use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::remote::{AddressId, LabelId, UserId};

/// Event channel.
#[derive(Debug, Clone)]
pub struct Events {
    receiver: Receiver<Event>,
    sender: Sender<Event>,
}

impl Default for Events {
    fn default() -> Self {
        Self::new()
    }
}

impl Events {
    /// Creates a new event channel.
    pub fn new() -> Self {
        let (sender, receiver) = async_channel::bounded(EVENT_CHANNEL_CAPACITY);
        Self { receiver, sender }
    }

    /// Emits an event into the channel.
    ///
    /// When the channel is full, the oldest event is dropped to make room
    /// for the new one rather than blocking the emitter.
    pub fn emit(&self, event: Event) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.receiver.try_recv().ok();
                self.emit(event);
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }

    /// Creates an emitter handle receiving events from this channel.
    ///
    /// Multiple emitters can be created; each event is delivered to only one
    /// of them.
    pub fn get_emitter(&self) -> EventEmitter {
        EventEmitter(self.receiver.clone())
    }
}

/// A receiver of events from a [`crate::context::Context`].
#[derive(Debug, Clone)]
pub struct EventEmitter(Receiver<Event>);

impl EventEmitter {
    /// Receives the next event, or `None` once the context is torn down.
    pub async fn recv(&self) -> Option<Event> {
        self.0.recv().await.ok()
    }

    /// Receives the next event without blocking, if one is pending.
    pub fn try_recv(&self) -> Option<Event> {
        self.0.try_recv().ok()
    }
}

/// An event with its originating context.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Identifier of the context that emitted the event.
    pub id: u32,
    /// The event payload.
    pub typ: EventType,
}

/// A completed change, described by kind and identifying fields.
#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    /// The library user may write an informational string to the log.
    Info(String),

    /// The library user should write a warning string to the log.
    Warning(String),

    /// The library user should report an error.
    Error(String),

    /// The account owner's profile was replaced.
    UserChanged { user_id: UserId },

    /// An address was created.
    AddressCreated { address_id: AddressId, email: String },

    /// An address was updated.
    AddressUpdated { address_id: AddressId, email: String },

    /// An address was deleted. `email` is the value the address had at the
    /// time of deletion.
    AddressDeleted { address_id: AddressId, email: String },

    /// A label was created.
    LabelCreated { label_id: LabelId, name: String },

    /// A label was updated.
    LabelUpdated { label_id: LabelId, name: String },

    /// A label was deleted. `name` is the value the label had at the time of
    /// deletion.
    LabelDeleted { label_id: LabelId, name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: u32, msg: &str) -> Event {
        Event {
            id,
            typ: EventType::Info(msg.to_string()),
        }
    }

    #[tokio::test]
    async fn test_events_are_received_in_emission_order() {
        let events = Events::new();
        let emitter = events.get_emitter();

        events.emit(info(1, "first"));
        events.emit(info(1, "second"));

        assert_eq!(emitter.recv().await.unwrap().typ, EventType::Info("first".into()));
        assert_eq!(emitter.recv().await.unwrap().typ, EventType::Info("second".into()));
        assert!(emitter.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_full_channel_drops_oldest_event() {
        let events = Events::new();
        let emitter = events.get_emitter();

        for i in 0..=crate::constants::EVENT_CHANNEL_CAPACITY {
            events.emit(info(1, &i.to_string()));
        }

        // "0" was dropped to make room for the newest event.
        assert_eq!(emitter.recv().await.unwrap().typ, EventType::Info("1".into()));
    }
}
