//! # Account session context.

use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;

use async_channel::Receiver;
use tokio::sync::RwLock;

use crate::config::Vault;
use crate::events::{Event, EventEmitter, Events, EventType};
use crate::remote::{Address, AddressId, Label, LabelId, RemoteClient, UserProfile};
use crate::updates::{QueueRegistry, Update};

/// An account session.
///
/// One context exists per account, created at session start and torn down at
/// session end. It is cheap to clone; all clones share the same inner state,
/// so the protocol-serving path can hold its own handle and read the entity
/// tables while event batches are being applied.
#[derive(Debug, Clone)]
pub struct Context {
    pub(crate) inner: Arc<InnerContext>,
}

impl Deref for Context {
    type Target = InnerContext;

    fn deref(&self) -> &InnerContext {
        &self.inner
    }
}

/// The underlying state of a [`Context`].
///
/// Lock discipline: the four table locks are independently acquirable;
/// handlers that need more than one acquire them in declaration order
/// (profile, addresses, labels, queue registry) and never in any other
/// order. Exclusive locks are held only for the in-memory mutation; the one
/// remote call made under a lock (the split-mode mailbox bootstrap) runs
/// under a shared registry lock.
#[derive(Debug)]
pub struct InnerContext {
    /// Identifier attached to every [`Event`] this context emits.
    pub(crate) id: u32,

    pub(crate) remote: Arc<dyn RemoteClient>,
    pub(crate) vault: Arc<dyn Vault>,
    pub(crate) events: Events,

    pub(crate) user: RwLock<UserProfile>,
    pub(crate) addresses: RwLock<BTreeMap<AddressId, Address>>,
    pub(crate) labels: RwLock<BTreeMap<LabelId, Label>>,
    pub(crate) queues: RwLock<QueueRegistry>,
}

impl Context {
    /// Creates a new account session.
    ///
    /// `user` is the profile known at session start; the entity tables start
    /// empty and are populated by the event feed.
    pub fn new(
        id: u32,
        remote: Arc<dyn RemoteClient>,
        vault: Arc<dyn Vault>,
        user: UserProfile,
    ) -> Self {
        Self {
            inner: Arc::new(InnerContext {
                id,
                remote,
                vault,
                events: Events::new(),
                user: RwLock::new(user),
                addresses: RwLock::new(BTreeMap::new()),
                labels: RwLock::new(BTreeMap::new()),
                queues: RwLock::new(QueueRegistry::new()),
            }),
        }
    }

    /// The identifier attached to events emitted by this context.
    pub fn get_id(&self) -> u32 {
        self.id
    }

    /// Emits a single event.
    pub fn emit_event(&self, typ: EventType) {
        self.events.emit(Event { id: self.id, typ });
    }

    /// Returns an emitter receiving this context's notification stream.
    pub fn get_event_emitter(&self) -> EventEmitter {
        self.events.get_emitter()
    }

    /// A snapshot of the account owner's profile.
    pub async fn user(&self) -> UserProfile {
        self.user.read().await.clone()
    }

    /// A snapshot of one address.
    pub async fn address(&self, id: &AddressId) -> Option<Address> {
        self.addresses.read().await.get(id).cloned()
    }

    /// A snapshot of all addresses, primary first.
    pub async fn addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.addresses.read().await.values().cloned().collect();
        addresses.sort_by_key(|a| a.order);
        addresses
    }

    /// The primary address, i.e. the one with the lowest ordering position.
    pub async fn primary_address(&self) -> Option<Address> {
        self.addresses
            .read()
            .await
            .values()
            .min_by_key(|a| a.order)
            .cloned()
    }

    /// A snapshot of one label.
    pub async fn label(&self, id: &LabelId) -> Option<Label> {
        self.labels.read().await.get(id).cloned()
    }

    /// A snapshot of all labels.
    pub async fn labels(&self) -> Vec<Label> {
        self.labels.read().await.values().cloned().collect()
    }

    /// A consumer handle on the update queue registered for `id`.
    ///
    /// This is how the protocol layer attaches to an address. Under combined
    /// mode, handles of aliased addresses drain the same underlying queue.
    pub async fn subscribe(&self, id: &AddressId) -> Option<Receiver<Update>> {
        self.queues.read().await.get(id).map(|q| q.receiver())
    }
}
