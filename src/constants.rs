//! # Constants.

#![allow(missing_docs)]

/// Capacity of the account-wide notification channel.
///
/// When the channel is full the oldest notification is dropped in favour of
/// the new one, see [`crate::events::Events::emit`].
pub const EVENT_CHANNEL_CAPACITY: usize = 1_000;

/// First path segment of mailboxes derived from user folders.
pub const FOLDERS_PREFIX: &str = "Folders";

/// First path segment of mailboxes derived from user labels.
pub const LABELS_PREFIX: &str = "Labels";

// Well-known system label identifiers assigned by the remote service.
pub const LABEL_ID_INBOX: &str = "0";
pub const LABEL_ID_SENT: &str = "2";
pub const LABEL_ID_TRASH: &str = "3";
pub const LABEL_ID_SPAM: &str = "4";
pub const LABEL_ID_ALL_MAIL: &str = "5";
pub const LABEL_ID_ARCHIVE: &str = "6";
pub const LABEL_ID_DRAFTS: &str = "8";
pub const LABEL_ID_STARRED: &str = "10";
