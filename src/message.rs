//! # Message building.
//!
//! Turns a fetched remote message into the protocol-ready representation
//! pushed into its owning address's queue.

use mail_builder::headers::raw::Raw;
use mail_builder::MessageBuilder;

use crate::key::{self, Keyring};
use crate::remote::{AddressId, FullMessage, MessageId, MimeType};
use crate::updates::MailboxId;

/// A protocol-ready message: the decrypted, rendered literal plus the
/// metadata the protocol layer files it under.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltMessage {
    pub message_id: MessageId,
    pub address_id: AddressId,
    /// Mailboxes the message is filed under.
    pub mailbox_ids: Vec<MailboxId>,
    /// RFC 2822 literal.
    pub literal: Vec<u8>,
    pub seen: bool,
    pub starred: bool,
}

/// Builds the protocol representation of a fetched message.
///
/// The armored body is decrypted with the owning address's keyring, then
/// rendered into an RFC 2822 literal together with the envelope headers.
pub fn build_message(full: &FullMessage, keyring: &Keyring) -> key::Result<BuiltMessage> {
    let body = keyring.decrypt(&full.body)?;
    let body = String::from_utf8_lossy(&body).into_owned();

    let to: Vec<(&str, &str)> = full
        .to
        .iter()
        .map(|r| (r.name.as_str(), r.email.as_str()))
        .collect();

    let mut builder = MessageBuilder::new()
        .from((full.sender.name.as_str(), full.sender.email.as_str()))
        .to(to)
        .subject(full.meta.subject.as_str())
        .header("Date", Raw::new(full.date.to_rfc2822()))
        .header(
            "Message-ID",
            Raw::new(format!("<{}@mailbridge>", full.meta.id.as_str())),
        );

    builder = match full.mime_type {
        MimeType::TextPlain => builder.text_body(body),
        MimeType::TextHtml => builder.html_body(body),
    };

    let literal = builder.write_to_vec()?;

    Ok(BuiltMessage {
        message_id: full.meta.id.clone(),
        address_id: full.meta.address_id.clone(),
        mailbox_ids: full.meta.label_ids.iter().map(MailboxId::from).collect(),
        literal,
        seen: full.meta.seen(),
        starred: full.meta.starred(),
    })
}
