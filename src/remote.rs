//! # Remote API surface.
//!
//! Wire-level entities and the incremental event feed delivered by the
//! remote mail service, plus the client contract this crate consumes.
//! The transport that polls or streams the feed, and any retry/backoff
//! around it, live outside this crate.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::LABEL_ID_STARRED;

/// Remote identifier of the account owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "User#{}", self.0)
    }
}

/// Remote identifier of an address.
///
/// Identifiers are opaque strings assigned by the remote service; they are
/// unique per account and never reused once the address is deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AddressId(String);

impl AddressId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AddressId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Address#{}", self.0)
    }
}

/// Remote identifier of a label.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LabelId(String);

impl LabelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Label#{}", self.0)
    }
}

/// Remote identifier of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Message#{}", self.0)
    }
}

/// The account owner's profile. Replaced wholesale on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    /// Armored secret keys of the account, locked with the vault passphrase.
    #[serde(default)]
    pub keys: Vec<String>,
    /// Remote profile fields this crate carries but does not interpret.
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// One email address of the account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub email: String,
    pub enabled: bool,
    /// Ordering position; the primary address has the lowest value.
    pub order: u32,
    /// Armored secret keys scoped to this address.
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Classification of a label, deciding how its mailbox name is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelType {
    /// An exclusive user folder.
    Folder,
    /// A non-exclusive user tag.
    Label,
    /// A category owned by the remote service (Inbox, Sent, ...).
    System,
    /// A contact group exposed as a mailbox.
    ContactGroup,
}

/// A label, i.e. a named container for messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
    /// Name path segments; a folder nested as "Work/2024" has two segments.
    pub path: Vec<String>,
    #[serde(rename = "type")]
    pub label_type: LabelType,
}

/// Metadata of a message as carried by the event feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMeta {
    pub id: MessageId,
    pub address_id: AddressId,
    pub subject: String,
    #[serde(default)]
    pub label_ids: Vec<LabelId>,
    #[serde(default)]
    pub unread: bool,
}

impl MessageMeta {
    /// Whether the message has been read.
    pub fn seen(&self) -> bool {
        !self.unread
    }

    /// Whether the message carries the starred system label.
    pub fn starred(&self) -> bool {
        self.label_ids.iter().any(|id| id.as_str() == LABEL_ID_STARRED)
    }
}

/// A name/email pair from a message envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

/// MIME type of a message body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MimeType {
    #[default]
    #[serde(rename = "text/plain")]
    TextPlain,
    #[serde(rename = "text/html")]
    TextHtml,
}

/// A complete message as returned by [`RemoteClient::fetch_full_message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullMessage {
    pub meta: MessageMeta,
    pub sender: Recipient,
    pub to: Vec<Recipient>,
    pub date: DateTime<Utc>,
    pub mime_type: MimeType,
    /// Armored PGP message holding the body.
    pub body: String,
}

/// One batch of the incremental event feed.
///
/// Applied by [`crate::context::Context::receive_event`] in the fixed order
/// user, addresses, labels, messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub addresses: Vec<AddressEvent>,
    #[serde(default)]
    pub labels: Vec<LabelEvent>,
    #[serde(default)]
    pub messages: Vec<MessageEvent>,
}

/// An address sub-event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AddressEvent {
    Create(Address),
    Update(Address),
    /// Flag-only change; handled identically to [`AddressEvent::Update`].
    UpdateFlags(Address),
    Delete(AddressId),
}

/// A label sub-event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LabelEvent {
    Create(Label),
    Update(Label),
    /// Flag-only change; handled identically to [`LabelEvent::Update`].
    UpdateFlags(Label),
    Delete(LabelId),
}

/// A message sub-event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageEvent {
    Create(MessageMeta),
    Update(MessageMeta),
    /// Flag-only change; handled identically to [`MessageEvent::Update`].
    UpdateFlags(MessageMeta),
    Delete(MessageId),
}

/// Failure of a remote call, as reported by the transport implementation.
#[derive(Debug, thiserror::Error)]
#[error("transport: {0}")]
pub struct TransportError(#[from] anyhow::Error);

impl TransportError {
    pub fn new(err: impl Into<anyhow::Error>) -> Self {
        Self(err.into())
    }
}

/// Contract of the remote mail service consumed by this crate.
///
/// [`RemoteClient::fetch_full_message`] is the only remote call on the
/// message-create path and is always performed before any exclusive lock is
/// taken, so an in-flight fetch never stalls concurrent state readers.
#[async_trait]
pub trait RemoteClient: Send + Sync + fmt::Debug {
    /// Fetches a complete message by identifier.
    async fn fetch_full_message(
        &self,
        id: &MessageId,
    ) -> std::result::Result<FullMessage, TransportError>;

    /// Fetches the current label set, used to bootstrap the mailbox list of
    /// a freshly created split-mode address.
    async fn fetch_label_snapshot(&self) -> std::result::Result<Vec<Label>, TransportError>;
}
