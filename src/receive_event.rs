//! # Applying remote event batches.
//!
//! The entry point is [`Context::receive_event`]. It is invoked sequentially
//! by the external transport (one batch at a time); concurrently, the
//! protocol-serving path may read the entity tables through the shared
//! accessors on [`Context`].

use crate::config::AddressMode;
use crate::context::Context;
use crate::error::{EntityKind, Error, EventAction, EventCategory, Result};
use crate::events::EventType;
use crate::key::Keyring;
use crate::mailbox::mailbox_name;
use crate::message::build_message;
use crate::remote::{
    Address, AddressEvent, AddressId, EventBatch, Label, LabelEvent, LabelId, MessageEvent,
    MessageId, MessageMeta, UserProfile,
};
use crate::sync::sync_mailboxes;
use crate::updates::{MailboxId, Update};

impl Context {
    /// Applies one batch of the remote event feed.
    ///
    /// Sub-events are applied in the fixed order user → addresses → labels →
    /// messages, each category element-by-element in received order. The
    /// first failing sub-event aborts the rest of the batch; sub-events
    /// already applied stay applied. A failed call therefore leaves the
    /// state at a prefix of the intended batch, not unchanged; callers
    /// recover through the next batch or a forced resynchronization.
    pub async fn receive_event(&self, batch: &EventBatch) -> Result<()> {
        if let Some(user) = &batch.user {
            self.handle_user_event(user)
                .await
                .map_err(Error::in_event(EventCategory::User, EventAction::Update))?;
        }

        if !batch.addresses.is_empty() {
            self.handle_address_events(&batch.addresses).await?;
        }

        if !batch.labels.is_empty() {
            self.handle_label_events(&batch.labels).await?;
        }

        if !batch.messages.is_empty() {
            self.handle_message_events(&batch.messages).await?;
        }

        Ok(())
    }

    async fn handle_user_event(&self, user_event: &UserProfile) -> Result<()> {
        info!(self, "Handling user event for {}", user_event.id);

        {
            let mut user = self.user.write().await;
            *user = user_event.clone();
        }

        self.emit_event(EventType::UserChanged {
            user_id: user_event.id.clone(),
        });

        Ok(())
    }

    async fn handle_address_events(&self, events: &[AddressEvent]) -> Result<()> {
        for event in events {
            match event {
                AddressEvent::Create(address) => self
                    .handle_create_address_event(address)
                    .await
                    .map_err(Error::in_event(EventCategory::Address, EventAction::Create))?,

                AddressEvent::Update(address) | AddressEvent::UpdateFlags(address) => self
                    .handle_update_address_event(address)
                    .await
                    .map_err(Error::in_event(EventCategory::Address, EventAction::Update))?,

                AddressEvent::Delete(id) => self
                    .handle_delete_address_event(id)
                    .await
                    .map_err(Error::in_event(EventCategory::Address, EventAction::Delete))?,
            }
        }

        Ok(())
    }

    async fn handle_create_address_event(&self, address: &Address) -> Result<()> {
        info!(self, "Handling address created event for {}", address.id);

        // The mode read here governs both the registry mutation and the
        // bootstrap decision; it is re-read on the next operation.
        let mode = self.vault.address_mode();

        {
            let mut addresses = self.addresses.write().await;
            let mut queues = self.queues.write().await;

            if addresses.contains_key(&address.id) {
                return Err(Error::DuplicateEntity {
                    kind: EntityKind::Address,
                    id: address.id.as_str().to_string(),
                });
            }

            addresses.insert(address.id.clone(), address.clone());

            match mode {
                AddressMode::Combined => {
                    let primary_id = addresses
                        .values()
                        .min_by_key(|a| a.order)
                        .map(|a| a.id.clone());

                    match primary_id.and_then(|id| queues.get(&id).cloned()) {
                        Some(queue) => queues.insert_alias(address.id.clone(), queue),
                        // No queue is registered for the primary yet, e.g.
                        // when the created address is the first one.
                        None => {
                            queues.insert_new(address.id.clone());
                        }
                    }
                }
                AddressMode::Split => {
                    queues.insert_new(address.id.clone());
                }
            }
        }

        self.emit_event(EventType::AddressCreated {
            address_id: address.id.clone(),
            email: address.email.clone(),
        });

        if mode == AddressMode::Split {
            let queues = self.queues.read().await;
            if let Some(queue) = queues.get(&address.id) {
                sync_mailboxes(self.remote.as_ref(), queue).await?;
            }
        }

        Ok(())
    }

    async fn handle_update_address_event(&self, address: &Address) -> Result<()> {
        info!(self, "Handling address updated event for {}", address.id);

        {
            let mut addresses = self.addresses.write().await;

            if !addresses.contains_key(&address.id) {
                return Err(Error::UnknownEntity {
                    kind: EntityKind::Address,
                    id: address.id.as_str().to_string(),
                });
            }

            addresses.insert(address.id.clone(), address.clone());
        }

        self.emit_event(EventType::AddressUpdated {
            address_id: address.id.clone(),
            email: address.email.clone(),
        });

        Ok(())
    }

    async fn handle_delete_address_event(&self, id: &AddressId) -> Result<()> {
        info!(self, "Handling address deleted event for {}", id);

        let email;
        {
            let mut addresses = self.addresses.write().await;
            let mut queues = self.queues.write().await;

            // Read before delete: the email is needed for the notification.
            let Some(address) = addresses.get(id) else {
                return Err(Error::UnknownEntity {
                    kind: EntityKind::Address,
                    id: id.as_str().to_string(),
                });
            };
            email = address.email.clone();

            // The registry entry goes in both modes; only a split-mode queue
            // is closed, an alias removal must not disturb the addresses
            // still sharing the queue.
            let removed = queues.remove(id);
            if self.vault.address_mode() == AddressMode::Split {
                if let Some(queue) = removed {
                    queue.close_and_discard();
                }
            }

            addresses.remove(id);
        }

        self.emit_event(EventType::AddressDeleted {
            address_id: id.clone(),
            email,
        });

        Ok(())
    }

    async fn handle_label_events(&self, events: &[LabelEvent]) -> Result<()> {
        for event in events {
            match event {
                LabelEvent::Create(label) => self
                    .handle_create_label_event(label)
                    .await
                    .map_err(Error::in_event(EventCategory::Label, EventAction::Create))?,

                LabelEvent::Update(label) | LabelEvent::UpdateFlags(label) => self
                    .handle_update_label_event(label)
                    .await
                    .map_err(Error::in_event(EventCategory::Label, EventAction::Update))?,

                LabelEvent::Delete(id) => self
                    .handle_delete_label_event(id)
                    .await
                    .map_err(Error::in_event(EventCategory::Label, EventAction::Delete))?,
            }
        }

        Ok(())
    }

    async fn handle_create_label_event(&self, label: &Label) -> Result<()> {
        info!(self, "Handling label created event for {}", label.id);

        {
            let mut labels = self.labels.write().await;
            let queues = self.queues.read().await;

            if labels.contains_key(&label.id) {
                return Err(Error::DuplicateEntity {
                    kind: EntityKind::Label,
                    id: label.id.as_str().to_string(),
                });
            }

            labels.insert(label.id.clone(), label.clone());

            // A label is a shared, account-wide mailbox; every queue
            // registered right now sees it. Addresses registered later see
            // it through the create-time bootstrap instead.
            queues.broadcast(Update::MailboxCreated {
                mailbox_id: MailboxId::from(&label.id),
                name: mailbox_name(label),
            });
        }

        self.emit_event(EventType::LabelCreated {
            label_id: label.id.clone(),
            name: label.name.clone(),
        });

        Ok(())
    }

    async fn handle_update_label_event(&self, label: &Label) -> Result<()> {
        info!(self, "Handling label updated event for {}", label.id);

        {
            let mut labels = self.labels.write().await;
            let queues = self.queues.read().await;

            if !labels.contains_key(&label.id) {
                return Err(Error::UnknownEntity {
                    kind: EntityKind::Label,
                    id: label.id.as_str().to_string(),
                });
            }

            labels.insert(label.id.clone(), label.clone());

            queues.broadcast(Update::MailboxUpdated {
                mailbox_id: MailboxId::from(&label.id),
                name: mailbox_name(label),
            });
        }

        self.emit_event(EventType::LabelUpdated {
            label_id: label.id.clone(),
            name: label.name.clone(),
        });

        Ok(())
    }

    async fn handle_delete_label_event(&self, id: &LabelId) -> Result<()> {
        info!(self, "Handling label deleted event for {}", id);

        let name;
        {
            let mut labels = self.labels.write().await;
            let queues = self.queues.read().await;

            // Read before delete: the name is needed for the notification.
            let Some(label) = labels.get(id) else {
                return Err(Error::UnknownEntity {
                    kind: EntityKind::Label,
                    id: id.as_str().to_string(),
                });
            };
            name = label.name.clone();

            labels.remove(id);

            queues.broadcast(Update::MailboxDeleted {
                mailbox_id: MailboxId::from(id),
            });
        }

        self.emit_event(EventType::LabelDeleted {
            label_id: id.clone(),
            name,
        });

        Ok(())
    }

    async fn handle_message_events(&self, events: &[MessageEvent]) -> Result<()> {
        for event in events {
            match event {
                MessageEvent::Create(meta) => self
                    .handle_create_message_event(meta)
                    .await
                    .map_err(Error::in_event(EventCategory::Message, EventAction::Create))?,

                MessageEvent::Update(meta) | MessageEvent::UpdateFlags(meta) => self
                    .handle_update_message_event(meta)
                    .await
                    .map_err(Error::in_event(EventCategory::Message, EventAction::Update))?,

                MessageEvent::Delete(id) => self
                    .handle_delete_message_event(id)
                    .await
                    .map_err(Error::in_event(EventCategory::Message, EventAction::Delete))?,
            }
        }

        Ok(())
    }

    async fn handle_create_message_event(&self, meta: &MessageMeta) -> Result<()> {
        // The fetch happens before any lock is taken so the network
        // round-trip cannot stall concurrent readers. A fetch failure
        // enqueues nothing.
        let full = self.remote.fetch_full_message(&meta.id).await?;

        info!(self, "Handling message created event for {}", meta.id);

        let user = self.user.read().await;
        let addresses = self.addresses.read().await;
        let queues = self.queues.read().await;

        let Some(address) = addresses.get(&meta.address_id) else {
            return Err(Error::UnknownEntity {
                kind: EntityKind::Address,
                id: meta.address_id.as_str().to_string(),
            });
        };

        let keyring = Keyring::unlock(&user, address, self.vault.key_pass())?;
        let built = build_message(&full, &keyring)?;

        // Routed by the fetched message's owning address, not broadcast.
        let Some(queue) = queues.get(&full.meta.address_id) else {
            return Err(Error::UnknownEntity {
                kind: EntityKind::Address,
                id: full.meta.address_id.as_str().to_string(),
            });
        };
        queue.enqueue(Update::MessagesCreated(Box::new(built)));

        Ok(())
    }

    async fn handle_update_message_event(&self, meta: &MessageMeta) -> Result<()> {
        info!(self, "Handling message updated event for {}", meta.id);

        let labels = self.labels.read().await;
        let queues = self.queues.read().await;

        // Label identifiers with no known mailbox are dropped, not errors.
        let mailbox_ids: Vec<MailboxId> = meta
            .label_ids
            .iter()
            .filter(|id| labels.contains_key(*id))
            .map(MailboxId::from)
            .collect();

        let Some(queue) = queues.get(&meta.address_id) else {
            return Err(Error::UnknownEntity {
                kind: EntityKind::Address,
                id: meta.address_id.as_str().to_string(),
            });
        };

        queue.enqueue(Update::MessageMailboxesUpdated {
            message_id: meta.id.clone(),
            mailbox_ids,
            seen: meta.seen(),
            starred: meta.starred(),
        });

        Ok(())
    }

    async fn handle_delete_message_event(&self, id: &MessageId) -> Result<()> {
        info!(self, "Handling message deleted event for {}", id);

        let queues = self.queues.read().await;

        // The owning address is not tracked at delete time, so the tombstone
        // is broadcast rather than routed.
        queues.broadcast(Update::MessagesDeleted {
            message_id: id.clone(),
        });

        Ok(())
    }
}
