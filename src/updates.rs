//! # Protocol update queues.
//!
//! Ordered per-address-role channels of protocol-level change records,
//! consumed by the mail-access protocol layer. The registry maps address
//! identifiers to queue handles; under combined mode several addresses
//! share one underlying queue.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_channel::{Receiver, Sender};

use crate::message::BuiltMessage;
use crate::remote::{AddressId, LabelId, MessageId};

/// Identifier of a mailbox as seen by the protocol layer.
///
/// Mailbox identifiers are label identifiers reused on the protocol side.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MailboxId(String);

impl MailboxId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&LabelId> for MailboxId {
    fn from(id: &LabelId) -> Self {
        Self(id.as_str().to_string())
    }
}

impl fmt::Display for MailboxId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Mailbox#{}", self.0)
    }
}

/// A protocol-level update record.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// A mailbox became visible to the consumer of the queue.
    MailboxCreated {
        mailbox_id: MailboxId,
        name: Vec<String>,
    },

    /// A mailbox was renamed or reclassified.
    MailboxUpdated {
        mailbox_id: MailboxId,
        name: Vec<String>,
    },

    /// A mailbox disappeared.
    MailboxDeleted { mailbox_id: MailboxId },

    /// A newly built message, routed to its owning address only.
    MessagesCreated(Box<BuiltMessage>),

    /// A message's mailbox set and flags changed.
    MessageMailboxesUpdated {
        message_id: MessageId,
        mailbox_ids: Vec<MailboxId>,
        seen: bool,
        starred: bool,
    },

    /// A message tombstone, broadcast to every queue.
    MessagesDeleted { message_id: MessageId },
}

/// Ordered multi-producer single-consumer queue of protocol updates.
#[derive(Debug)]
pub struct UpdateQueue {
    sender: Sender<Update>,
    receiver: Receiver<Update>,
}

impl Default for UpdateQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateQueue {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        let (sender, receiver) = async_channel::unbounded();
        Self { sender, receiver }
    }

    /// Appends an update.
    ///
    /// Enqueueing to a closed queue is a no-op; the queue's consumer is gone
    /// with the address that owned it.
    pub fn enqueue(&self, update: Update) {
        self.sender.try_send(update).ok();
    }

    /// Returns a consumer handle on this queue.
    pub fn receiver(&self) -> Receiver<Update> {
        self.receiver.clone()
    }

    /// Closes the queue and discards any queued-but-unconsumed updates.
    ///
    /// Consumers attaching afterwards observe an empty, closed channel.
    pub fn close_and_discard(&self) {
        self.sender.close();
        while self.receiver.try_recv().is_ok() {}
    }
}

/// Maps address identifiers to their update queue handle.
///
/// Aliasing an address to another's queue is a handle copy, so removing one
/// alias never disturbs other addresses still referencing the same queue.
#[derive(Debug, Default)]
pub struct QueueRegistry {
    queues: BTreeMap<AddressId, Arc<UpdateQueue>>,
}

impl QueueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh empty queue for `id` and returns its handle.
    pub fn insert_new(&mut self, id: AddressId) -> Arc<UpdateQueue> {
        let queue = Arc::new(UpdateQueue::new());
        self.queues.insert(id, Arc::clone(&queue));
        queue
    }

    /// Registers `id` as sharing an existing queue.
    pub fn insert_alias(&mut self, id: AddressId, queue: Arc<UpdateQueue>) {
        self.queues.insert(id, queue);
    }

    /// The queue registered for `id`, if any.
    pub fn get(&self, id: &AddressId) -> Option<&Arc<UpdateQueue>> {
        self.queues.get(id)
    }

    /// Removes the entry for `id`, returning its queue handle.
    pub fn remove(&mut self, id: &AddressId) -> Option<Arc<UpdateQueue>> {
        self.queues.remove(id)
    }

    pub fn contains(&self, id: &AddressId) -> bool {
        self.queues.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Pushes one copy of `update` into every distinct registered queue.
    ///
    /// A queue shared by several addresses receives the update exactly once.
    pub fn broadcast(&self, update: Update) {
        let mut seen: Vec<*const UpdateQueue> = Vec::with_capacity(self.queues.len());
        for queue in self.queues.values() {
            let ptr = Arc::as_ptr(queue);
            if seen.contains(&ptr) {
                continue;
            }
            seen.push(ptr);
            queue.enqueue(update.clone());
        }
    }
}
