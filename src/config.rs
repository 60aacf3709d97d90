//! # Session configuration and the secret-store contract.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Queue topology of the account's addresses.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressMode {
    /// All addresses share the primary address's mailbox view and queue.
    #[default]
    Combined,
    /// Every address has an independent mailbox view and queue.
    Split,
}

/// Passphrase unlocking the account's key material.
///
/// The `Debug` impl redacts the value so passphrases cannot leak through
/// logged events.
#[derive(Clone, PartialEq, Eq)]
pub struct Passphrase(String);

impl Passphrase {
    pub fn new(pass: impl Into<String>) -> Self {
        Self(pass.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Passphrase(<hidden>)")
    }
}

/// Contract of the externally owned configuration and secret store.
///
/// The address mode is externally mutable between event batches. Handlers
/// read it once per operation and never cache it across operations.
pub trait Vault: Send + Sync + fmt::Debug {
    /// The account's current address mode.
    fn address_mode(&self) -> AddressMode;

    /// Derives the passphrase unlocking the account's key material.
    fn key_pass(&self) -> Passphrase;
}
