//! Per-user room session.
//!
//! [`RoomSession`] bridges each room's encryption policy to the key store and
//! the crypto primitives. Room keys are provisioned explicitly through
//! [`RoomSession::ensure_room_key`] when a room is entered or created; sending
//! and reading never provision as a side effect.
//!
//! Per room, from the point of view of encryption readiness:
//!
//! ```text
//! Unprovisioned --ensure_room_key(encrypted)--> Provisioned
//! ```
//!
//! Unencrypted rooms pass plaintext through unchanged. There is no way back
//! to `Unprovisioned`.

use std::collections::BTreeMap;

use huddle_shared::constants::{KEY_UNAVAILABLE_TEXT, UNDECRYPTABLE_TEXT};
use huddle_shared::crypto;
use huddle_shared::identity::{self, IdentityKeyPair};
use huddle_shared::protocol::{Message, MessageBody, Sender};
use huddle_shared::types::{Room, RoomId, UserProfile};
use huddle_store::KeyStore;
use tracing::{debug, info, warn};

use crate::error::SessionError;

/// Outcome of [`RoomSession::ensure_room_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyProvisioning {
    /// The room is not encrypted; nothing was done.
    NotRequired,
    /// A key was already stored.
    Existing,
    /// A fresh key was generated and stored.
    Generated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKeyState {
    Unencrypted,
    Unprovisioned,
    Provisioned,
}

pub struct RoomSession<K> {
    store: K,
    profile: UserProfile,
    identity: IdentityKeyPair,
    /// Encryption flag of every room entered or created in this session.
    policies: BTreeMap<RoomId, bool>,
}

impl<K: KeyStore> RoomSession<K> {
    /// Start a session for `profile`, provisioning its identity keys on first use.
    pub fn start(store: K, profile: UserProfile) -> Result<Self, SessionError> {
        let identity = match store.get_identity_keys(profile.id)? {
            Some(keys) => keys,
            None => {
                let keys = IdentityKeyPair::generate();
                store.put_identity_keys(profile.id, &keys)?;
                info!(user = %profile.id, fingerprint = %keys.fingerprint(), "provisioned identity keys");
                keys
            }
        };

        info!(
            user = %profile.id,
            name = %profile.display_name,
            fingerprint = %identity.fingerprint(),
            "session started"
        );

        Ok(Self {
            store,
            profile,
            identity,
            policies: BTreeMap::new(),
        })
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn identity(&self) -> &IdentityKeyPair {
        &self.identity
    }

    /// Transport-encoded public key to hand to peers for direct messages.
    pub fn public_key(&self) -> String {
        self.identity.public_key_b64()
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    // ------------------------------------------------------------------
    // Room lifecycle
    // ------------------------------------------------------------------

    /// Record the room's policy and make sure an encrypted room holds a key.
    ///
    /// Reads before writing, so repeated calls never replace a stored key.
    pub fn ensure_room_key(
        &mut self,
        room_id: RoomId,
        requires_encryption: bool,
    ) -> Result<KeyProvisioning, SessionError> {
        self.policies.insert(room_id, requires_encryption);

        if !requires_encryption {
            return Ok(KeyProvisioning::NotRequired);
        }

        if self.store.get_room_key(room_id)?.is_some() {
            debug!(room = %room_id, "room key already present");
            return Ok(KeyProvisioning::Existing);
        }

        let key = crypto::generate_symmetric_key();
        self.store.put_room_key(room_id, &key)?;
        info!(room = %room_id, "provisioned room key");
        Ok(KeyProvisioning::Generated)
    }

    /// Enter a room from the directory.
    pub fn select_room(&mut self, room: &Room) -> Result<KeyProvisioning, SessionError> {
        self.ensure_room_key(room.id, room.encrypted)
    }

    /// Create a room, provisioning its key up front when it is encrypted.
    pub fn create_room(
        &mut self,
        name: &str,
        description: &str,
        encrypted: bool,
    ) -> Result<Room, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::InvalidRoomName);
        }

        // Rooms known only through a stored key count too, so a new room
        // never picks up another room's key.
        let stored = self.store.room_ids()?.last().copied();
        let known = self.policies.keys().next_back().copied();
        let id = match known.max(stored) {
            Some(last) => last.next().ok_or(SessionError::RoomIdsExhausted(last))?,
            None => RoomId(1),
        };

        let room = Room {
            id,
            name: name.to_string(),
            description: description.trim().to_string(),
            encrypted,
        };
        self.ensure_room_key(room.id, room.encrypted)?;

        info!(room = %room.id, name = %room.name, encrypted, "room created");
        Ok(room)
    }

    pub fn room_state(&self, room_id: RoomId) -> Result<RoomKeyState, SessionError> {
        if self.policies.get(&room_id) == Some(&false) {
            return Ok(RoomKeyState::Unencrypted);
        }
        Ok(match self.store.get_room_key(room_id)? {
            Some(_) => RoomKeyState::Provisioned,
            None => RoomKeyState::Unprovisioned,
        })
    }

    // ------------------------------------------------------------------
    // Room messages
    // ------------------------------------------------------------------

    /// Prepare an outgoing payload for `room_id`.
    ///
    /// Encrypted rooms without a key fail; plaintext is never substituted.
    pub fn encrypt_outgoing(
        &self,
        room_id: RoomId,
        plaintext: &str,
    ) -> Result<MessageBody, SessionError> {
        let encrypted = *self
            .policies
            .get(&room_id)
            .ok_or(SessionError::UnknownRoom(room_id))?;

        if !encrypted {
            return Ok(MessageBody::Plain {
                text: plaintext.to_string(),
            });
        }

        let key = self
            .store
            .get_room_key(room_id)?
            .ok_or(SessionError::MissingRoomKey(room_id))?;

        let envelope = crypto::seal_room_text(plaintext, &key)?;
        debug!(room = %room_id, len = envelope.len(), "sealed outgoing message");
        Ok(MessageBody::Sealed { envelope })
    }

    /// Build the message the local user sends to `room_id`.
    pub fn compose_message(&self, room_id: RoomId, text: &str) -> Result<Message, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let body = self.encrypt_outgoing(room_id, text)?;
        Ok(Message::new(room_id, Sender::from(&self.profile), body))
    }

    /// Text to display for `message`. Never fails.
    ///
    /// A sealed message without a local key shows [`KEY_UNAVAILABLE_TEXT`];
    /// one that fails to open shows [`UNDECRYPTABLE_TEXT`].
    pub fn decrypt_incoming(&self, room_id: RoomId, message: &Message) -> String {
        let envelope = match &message.body {
            MessageBody::Plain { text } => return text.clone(),
            MessageBody::Sealed { envelope } => envelope,
        };

        let key = match self.store.get_room_key(room_id) {
            Ok(Some(key)) => key,
            Ok(None) => return KEY_UNAVAILABLE_TEXT.to_string(),
            Err(e) => {
                warn!(room = %room_id, error = %e, "room key lookup failed");
                return KEY_UNAVAILABLE_TEXT.to_string();
            }
        };

        match crypto::open_room_text(envelope, &key) {
            Ok(text) => text,
            Err(e) => {
                warn!(room = %room_id, msg_id = %message.id, error = %e, "could not decrypt message");
                UNDECRYPTABLE_TEXT.to_string()
            }
        }
    }

    /// Display text for a whole history, in order.
    pub fn display_history(&self, room_id: RoomId, messages: &[Message]) -> Vec<String> {
        messages
            .iter()
            .map(|m| self.decrypt_incoming(room_id, m))
            .collect()
    }

    // ------------------------------------------------------------------
    // Direct messages
    // ------------------------------------------------------------------

    pub fn encrypt_direct(&self, their_public: &str, plaintext: &str) -> Result<String, SessionError> {
        let their_public = identity::public_key_from_b64(their_public)?;
        Ok(crypto::seal_direct_text(
            plaintext,
            self.identity.secret(),
            &their_public,
        )?)
    }

    pub fn decrypt_direct(&self, their_public: &str, envelope: &str) -> Result<String, SessionError> {
        let their_public = identity::public_key_from_b64(their_public)?;
        Ok(crypto::open_direct_text(
            envelope,
            self.identity.secret(),
            &their_public,
        )?)
    }
}
