//! # Mailbox bootstrap for freshly split addresses.

use crate::error::Result;
use crate::mailbox::mailbox_name;
use crate::remote::RemoteClient;
use crate::updates::{MailboxId, Update, UpdateQueue};

/// Fetches the current remote label set and pushes equivalent
/// mailbox-created updates into `queue`.
///
/// Called once when an address is created under split mode, so the new
/// address's consumer starts from a populated mailbox list before any later
/// label or message event reaches it.
pub(crate) async fn sync_mailboxes(remote: &dyn RemoteClient, queue: &UpdateQueue) -> Result<()> {
    let labels = remote.fetch_label_snapshot().await?;

    for label in labels {
        queue.enqueue(Update::MailboxCreated {
            mailbox_id: MailboxId::from(&label.id),
            name: mailbox_name(&label),
        });
    }

    Ok(())
}
