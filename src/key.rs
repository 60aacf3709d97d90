//! # Address-scoped key handling.
//!
//! Built on [rPGP facilities](https://github.com/rpgp/rpgp).

use std::fmt;
use std::io::Cursor;

use pgp::composed::{Deserializable, Message, SignedSecretKey};

use crate::config::Passphrase;
use crate::remote::{Address, UserProfile};

/// Error type for key handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("rPGP error: {}", _0)]
    Pgp(#[from] pgp::errors::Error),
    #[error("no usable key material")]
    NoKey,
    #[error("decrypted message has no content")]
    NoContent,
    #[error("failed to render message: {}", _0)]
    Render(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Decryption keys scoped to one address.
///
/// Unlocked from the account's and the address's armored key material plus
/// the vault passphrase. The keys stay in their stored form; the passphrase
/// is handed to rPGP when a message is decrypted.
#[derive(Clone)]
pub struct Keyring {
    keys: Vec<SignedSecretKey>,
    passphrase: Passphrase,
}

impl fmt::Debug for Keyring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Keyring")
            .field("keys", &self.keys.len())
            .field("passphrase", &self.passphrase)
            .finish()
    }
}

impl Keyring {
    /// Unlocks the keyring of `address`.
    ///
    /// Addresses without key material of their own fall back to the
    /// account-level keys carried by the user profile.
    pub fn unlock(
        user: &UserProfile,
        address: &Address,
        passphrase: Passphrase,
    ) -> Result<Self> {
        let armored = if address.keys.is_empty() {
            &user.keys
        } else {
            &address.keys
        };

        let mut keys = Vec::with_capacity(armored.len());
        for armor in armored {
            let (key, _headers) = SignedSecretKey::from_armor_single(Cursor::new(armor.as_bytes()))?;
            key.verify()?;
            keys.push(key);
        }

        if keys.is_empty() {
            return Err(Error::NoKey);
        }

        Ok(Self { keys, passphrase })
    }

    /// Decrypts an armored PGP message into its literal content.
    pub fn decrypt(&self, armored: &str) -> Result<Vec<u8>> {
        let cursor = Cursor::new(armored.as_bytes().to_vec());
        let (msg, _headers) = Message::from_armor_single(cursor)?;

        let skeys: Vec<&SignedSecretKey> = self.keys.iter().collect();
        let pass = self.passphrase.clone();
        let (msg, _key_ids) = msg.decrypt(move || pass.expose().to_string(), &skeys[..])?;

        // Decompressing here avoids a second pass inside get_content().
        let msg = msg.decompress()?;

        msg.get_content()?.ok_or(Error::NoContent)
    }
}
