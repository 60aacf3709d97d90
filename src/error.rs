//! # Error types returned by the event handlers.

use strum_macros::Display;

use crate::key;
use crate::remote::TransportError;

pub type Result<T> = std::result::Result<T, Error>;

/// Kind of entity an identifier lookup refers to.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    Address,
    Label,
}

/// Category of the sub-event a handler failure originated from.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum EventCategory {
    User,
    Address,
    Label,
    Message,
}

/// Action tag of the sub-event a handler failure originated from.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum EventAction {
    Create,
    Update,
    Delete,
}

/// Errors produced while applying an event batch.
///
/// None of these are retried inside this crate; the caller decides whether to
/// resynchronize or surface the failure.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A create referenced an identifier that is already present.
    #[error("{kind} {id:?} already exists")]
    DuplicateEntity { kind: EntityKind, id: String },

    /// An update or delete referenced an identifier that is not present.
    #[error("{kind} {id:?} does not exist")]
    UnknownEntity { kind: EntityKind, id: String },

    /// A remote fetch failed.
    #[error("remote request failed")]
    Transport(#[from] TransportError),

    /// Keyring resolution or message construction failed.
    #[error("cryptographic operation failed")]
    Crypto(#[from] key::Error),

    /// Wraps a handler failure with the sub-event it originated from.
    #[error("failed to handle {action} {category} event")]
    Event {
        category: EventCategory,
        action: EventAction,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns a closure wrapping an error with its originating sub-event,
    /// for use with `map_err` in the dispatcher.
    pub(crate) fn in_event(
        category: EventCategory,
        action: EventAction,
    ) -> impl FnOnce(Error) -> Error {
        move |source| Error::Event {
            category,
            action,
            source: Box::new(source),
        }
    }

    /// The error this one wraps, or itself if it is not a wrapper.
    pub fn root(&self) -> &Error {
        match self {
            Error::Event { source, .. } => source.root(),
            other => other,
        }
    }
}
