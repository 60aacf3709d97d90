//! Utilities to help writing tests.
//!
//! This module is only compiled for test runs.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pgp::composed::{
    KeyType as PgpKeyType, Message, SecretKeyParamsBuilder, SignedPublicKey, SignedSecretKey,
    SubkeyParamsBuilder,
};
use pgp::crypto::ecc_curve::ECCCurve;
use pgp::crypto::hash::HashAlgorithm;
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::types::{CompressionAlgorithm, PublicKeyTrait, SecretKeyTrait};
use rand::thread_rng;
use smallvec::smallvec;

use crate::config::{AddressMode, Passphrase, Vault};
use crate::context::Context;
use crate::events::{EventEmitter, EventType};
use crate::remote::{
    Address, AddressEvent, AddressId, EventBatch, FullMessage, Label, LabelId, LabelType,
    MessageId, MessageMeta, MimeType, Recipient, RemoteClient, TransportError, UserId,
    UserProfile,
};

/// A [`Context`] wired to in-memory collaborators.
#[derive(Debug)]
pub(crate) struct TestContext {
    pub ctx: Context,
    pub remote: Arc<MockRemote>,
    pub vault: Arc<MockVault>,
    pub evtracker: EventTracker,
    pub keypair: TestKeyPair,
}

impl TestContext {
    /// Creates a new [`TestContext`] in combined address mode.
    pub async fn new() -> Self {
        Self::with_mode(AddressMode::Combined).await
    }

    /// Creates a new [`TestContext`] in split address mode.
    pub async fn split() -> Self {
        Self::with_mode(AddressMode::Split).await
    }

    pub async fn with_mode(mode: AddressMode) -> Self {
        use rand::Rng;

        let remote = Arc::new(MockRemote::default());
        let vault = Arc::new(MockVault::new(mode));
        let keypair = test_keypair();

        let id = thread_rng().gen();
        let ctx = Context::new(
            id,
            remote.clone(),
            vault.clone(),
            test_profile("user-test", &keypair),
        );
        let evtracker = EventTracker::new(ctx.get_event_emitter());

        Self {
            ctx,
            remote,
            vault,
            evtracker,
            keypair,
        }
    }

    /// An [`Address`] carrying this context's test key material.
    pub fn address_fixture(&self, id: &str, email: &str, order: u32) -> Address {
        test_address(id, email, order, &self.keypair)
    }

    /// Applies a create-address event and unwraps the result.
    pub async fn create_address(&self, id: &str, email: &str, order: u32) {
        let batch = EventBatch {
            addresses: vec![AddressEvent::Create(self.address_fixture(id, email, order))],
            ..Default::default()
        };
        self.ctx.receive_event(&batch).await.unwrap();
    }

    /// Message metadata owned by `address_id`, read and unstarred.
    pub fn message_meta(&self, id: &str, address_id: &str) -> MessageMeta {
        MessageMeta {
            id: MessageId::new(id),
            address_id: AddressId::new(address_id),
            subject: "Hello".to_string(),
            label_ids: vec![LabelId::new("0")],
            unread: false,
        }
    }

    /// Stores a fetchable message whose body is encrypted to this context's
    /// test keypair.
    pub async fn put_encrypted_message(
        &self,
        id: &str,
        address_id: &str,
        subject: &str,
        body: &[u8],
    ) {
        let armored = encrypt_armored(body, &self.keypair).await;
        self.remote
            .put_message(full_message(id, address_id, subject, armored));
    }

    /// Number of entries currently in the queue registry.
    pub async fn registry_len(&self) -> usize {
        self.ctx.queues.read().await.len()
    }
}

/// Tracks the events emitted by a test context.
#[derive(Debug, Clone)]
pub(crate) struct EventTracker(EventEmitter);

impl EventTracker {
    pub fn new(emitter: EventEmitter) -> Self {
        Self(emitter)
    }

    /// Consumes events until one matches `pred` and returns it.
    pub async fn get_matching<F: Fn(&EventType) -> bool>(&self, pred: F) -> EventType {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let event = self.0.recv().await.expect("event channel closed");
                if pred(&event.typ) {
                    return event.typ;
                }
            }
        })
        .await
        .expect("timeout waiting for event")
    }

    /// Returns the next pending domain notification, skipping log events.
    pub fn try_recv_notification(&self) -> Option<EventType> {
        while let Some(event) = self.0.try_recv() {
            if !matches!(
                event.typ,
                EventType::Info(_) | EventType::Warning(_) | EventType::Error(_)
            ) {
                return Some(event.typ);
            }
        }
        None
    }
}

/// In-memory stand-in for the remote mail service.
#[derive(Debug, Default)]
pub(crate) struct MockRemote {
    messages: Mutex<BTreeMap<MessageId, FullMessage>>,
    labels: Mutex<Vec<Label>>,
    offline: Mutex<bool>,
}

impl MockRemote {
    pub fn put_message(&self, full: FullMessage) {
        self.messages
            .lock()
            .unwrap()
            .insert(full.meta.id.clone(), full);
    }

    pub fn set_label_snapshot(&self, labels: Vec<Label>) {
        *self.labels.lock().unwrap() = labels;
    }

    /// Makes every subsequent fetch fail with a transport error.
    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }
}

#[async_trait]
impl RemoteClient for MockRemote {
    async fn fetch_full_message(
        &self,
        id: &MessageId,
    ) -> std::result::Result<FullMessage, TransportError> {
        if *self.offline.lock().unwrap() {
            return Err(TransportError::new(anyhow::format_err!("offline")));
        }
        self.messages
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| TransportError::new(anyhow::format_err!("no such message: {id}")))
    }

    async fn fetch_label_snapshot(&self) -> std::result::Result<Vec<Label>, TransportError> {
        if *self.offline.lock().unwrap() {
            return Err(TransportError::new(anyhow::format_err!("offline")));
        }
        Ok(self.labels.lock().unwrap().clone())
    }
}

/// Mutable stand-in for the externally owned configuration/secret store.
#[derive(Debug)]
pub(crate) struct MockVault {
    mode: Mutex<AddressMode>,
}

impl MockVault {
    pub fn new(mode: AddressMode) -> Self {
        Self {
            mode: Mutex::new(mode),
        }
    }

    pub fn set_mode(&self, mode: AddressMode) {
        *self.mode.lock().unwrap() = mode;
    }
}

impl Vault for MockVault {
    fn address_mode(&self) -> AddressMode {
        *self.mode.lock().unwrap()
    }

    fn key_pass(&self) -> Passphrase {
        Passphrase::new("test-keypass")
    }
}

/// A generated signing key with an encryption subkey, plus its armored form.
#[derive(Debug, Clone)]
pub(crate) struct TestKeyPair {
    pub public: SignedPublicKey,
    pub secret: SignedSecretKey,
    pub armored_secret: String,
}

/// Generates a fresh Ed25519/Curve25519 keypair for tests.
pub(crate) fn test_keypair() -> TestKeyPair {
    let key_params = SecretKeyParamsBuilder::default()
        .key_type(PgpKeyType::EdDSALegacy)
        .can_certify(true)
        .can_sign(true)
        .primary_user_id("<tester@example.org>".to_string())
        .passphrase(None)
        .preferred_symmetric_algorithms(smallvec![
            SymmetricKeyAlgorithm::AES256,
            SymmetricKeyAlgorithm::AES128,
        ])
        .preferred_hash_algorithms(smallvec![HashAlgorithm::SHA2_256])
        .preferred_compression_algorithms(smallvec![CompressionAlgorithm::ZLIB])
        .subkey(
            SubkeyParamsBuilder::default()
                .key_type(PgpKeyType::ECDH(ECCCurve::Curve25519))
                .can_encrypt(true)
                .passphrase(None)
                .build()
                .expect("failed to build subkey parameters"),
        )
        .build()
        .expect("failed to build key parameters");

    let mut rng = thread_rng();
    let secret = key_params
        .generate(&mut rng)
        .expect("failed to generate the key")
        .sign(&mut rng, || "".into())
        .expect("failed to sign secret key");
    secret.verify().expect("invalid secret key generated");

    // Split off the public half, for encrypting fixtures to this key.
    let unsigned_pubkey = SecretKeyTrait::public_key(&secret);
    let public = unsigned_pubkey
        .sign(&mut rng, &secret, || "".into())
        .expect("failed to sign public key");

    let armored_secret = secret
        .to_armored_string(Default::default())
        .expect("failed to armor secret key");

    TestKeyPair {
        public,
        secret,
        armored_secret,
    }
}

/// Encrypts `plain` to the keypair's encryption subkey, returning the
/// armored message.
pub(crate) async fn encrypt_armored(plain: &[u8], keypair: &TestKeyPair) -> String {
    let lit_msg = Message::new_literal_bytes("", plain);
    let subkey = keypair
        .public
        .public_subkeys
        .iter()
        .find(|subkey| subkey.is_encryption_key())
        .expect("keypair has no encryption subkey");

    let mut rng = thread_rng();
    let encrypted = lit_msg
        .encrypt_to_keys_seipdv1(&mut rng, SymmetricKeyAlgorithm::AES128, &[subkey])
        .expect("failed to encrypt");

    encrypted
        .to_armored_string(Default::default())
        .expect("failed to armor message")
}

pub(crate) fn test_profile(id: &str, keypair: &TestKeyPair) -> UserProfile {
    UserProfile {
        id: UserId::new(id),
        name: "Tester".to_string(),
        keys: vec![keypair.armored_secret.clone()],
        extra: serde_json::Value::Null,
    }
}

pub(crate) fn test_address(id: &str, email: &str, order: u32, keypair: &TestKeyPair) -> Address {
    Address {
        id: AddressId::new(id),
        email: email.to_string(),
        enabled: true,
        order,
        keys: vec![keypair.armored_secret.clone()],
    }
}

pub(crate) fn test_label(id: &str, label_type: LabelType, path: &[&str]) -> Label {
    Label {
        id: LabelId::new(id),
        name: path.join("/"),
        path: path.iter().map(ToString::to_string).collect(),
        label_type,
    }
}

pub(crate) fn full_message(
    id: &str,
    address_id: &str,
    subject: &str,
    armored_body: String,
) -> FullMessage {
    FullMessage {
        meta: MessageMeta {
            id: MessageId::new(id),
            address_id: AddressId::new(address_id),
            subject: subject.to_string(),
            label_ids: vec![LabelId::new("0")],
            unread: false,
        },
        sender: Recipient {
            name: "Sender".to_string(),
            email: "sender@example.com".to_string(),
        },
        to: vec![Recipient {
            name: "Tester".to_string(),
            email: "tester@example.org".to_string(),
        }],
        date: chrono::DateTime::from_timestamp(1_691_000_000, 0).expect("valid timestamp"),
        mime_type: MimeType::TextPlain,
        body: armored_body,
    }
}
