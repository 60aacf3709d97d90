//! # Mailbridge core library.
//!
//! Reconciles an incremental event feed from a remote mail service into
//! consistent local account state and fans the resulting changes out as
//! ordered update notifications to per-address protocol queues.
//!
//! The entry point is [`context::Context`]: one context per account session.
//! The external transport feeds it [`remote::EventBatch`]es via
//! [`context::Context::receive_event`]; the mail-access protocol layer
//! consumes [`updates::Update`]s from the per-address queues, and UI-level
//! consumers watch the account-wide notification stream through
//! [`events::EventEmitter`].
#![forbid(unsafe_code)]
#![warn(
    clippy::correctness,
    missing_debug_implementations,
    clippy::wildcard_imports,
    clippy::needless_borrow
)]

#[macro_use]
mod log;

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod events;
pub mod key;
pub mod mailbox;
pub mod message;
pub mod receive_event;
pub mod remote;
pub mod sync;
pub mod updates;

pub use self::error::{Error, Result};
pub use self::events::{Event, EventEmitter, EventType};

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod tests;
