//! Identity and room key persistence.
//!
//! Two logical tables live in the backing [`Storage`]:
//! - one identity record per user at `encryption_keys_{userId}`, a JSON
//!   object `{"publicKey": <b64>, "secretKey": <b64>}`;
//! - a single room key table at `room_keys`, a JSON object mapping the
//!   stringified room id to the base64 key.
//!
//! Entries that fail to parse are reported as absent and logged. A bad entry
//! in the room table never costs the other rooms their keys: writes keep every
//! existing entry as it was found.

use huddle_shared::codec;
use huddle_shared::constants::{IDENTITY_KEYS_PREFIX, ROOM_KEYS_TABLE, SYMMETRIC_KEY_SIZE};
use huddle_shared::crypto::SymmetricKey;
use huddle_shared::identity::{IdentityKeyPair, IdentityRecord};
use huddle_shared::types::{RoomId, UserId};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::Result;
use crate::storage::Storage;

type RoomKeyTable = Map<String, Value>;

pub trait KeyStore {
    fn get_identity_keys(&self, user: UserId) -> Result<Option<IdentityKeyPair>>;

    /// Overwrites any existing pair. Ciphertext produced for the old secret
    /// key can no longer be opened.
    fn put_identity_keys(&self, user: UserId, keys: &IdentityKeyPair) -> Result<()>;

    fn get_room_key(&self, room: RoomId) -> Result<Option<SymmetricKey>>;

    /// Merge `key` into the room table without disturbing other rooms.
    fn put_room_key(&self, room: RoomId, key: &SymmetricKey) -> Result<()>;

    /// Rooms that currently hold a key, ascending.
    fn room_ids(&self) -> Result<Vec<RoomId>>;
}

macro_rules! forward_key_store {
    ($($ty:ty),*) => {$(
        impl<K: KeyStore + ?Sized> KeyStore for $ty {
            fn get_identity_keys(&self, user: UserId) -> Result<Option<IdentityKeyPair>> {
                (**self).get_identity_keys(user)
            }

            fn put_identity_keys(&self, user: UserId, keys: &IdentityKeyPair) -> Result<()> {
                (**self).put_identity_keys(user, keys)
            }

            fn get_room_key(&self, room: RoomId) -> Result<Option<SymmetricKey>> {
                (**self).get_room_key(room)
            }

            fn put_room_key(&self, room: RoomId, key: &SymmetricKey) -> Result<()> {
                (**self).put_room_key(room, key)
            }

            fn room_ids(&self) -> Result<Vec<RoomId>> {
                (**self).room_ids()
            }
        }
    )*};
}

forward_key_store!(&K, Box<K>);

/// [`KeyStore`] over any [`Storage`] backend.
#[derive(Debug)]
pub struct LocalKeyStore<S> {
    storage: S,
}

impl<S: Storage> LocalKeyStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn load_room_table(&self) -> Result<RoomKeyTable> {
        Ok(self
            .storage
            .get_item(ROOM_KEYS_TABLE)?
            .map(|raw| parse_room_table(&raw))
            .unwrap_or_default())
    }
}

impl<S: Storage> KeyStore for LocalKeyStore<S> {
    fn get_identity_keys(&self, user: UserId) -> Result<Option<IdentityKeyPair>> {
        let Some(raw) = self.storage.get_item(&identity_key(user))? else {
            return Ok(None);
        };

        let record: IdentityRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(user = %user, error = %e, "ignoring unparseable identity record");
                return Ok(None);
            }
        };

        match IdentityKeyPair::from_record(&record) {
            Ok(keys) => Ok(Some(keys)),
            Err(e) => {
                warn!(user = %user, error = %e, "ignoring invalid identity record");
                Ok(None)
            }
        }
    }

    fn put_identity_keys(&self, user: UserId, keys: &IdentityKeyPair) -> Result<()> {
        let json = serde_json::to_string(&keys.to_record())?;
        self.storage.set_item(&identity_key(user), &json)?;
        debug!(user = %user, fingerprint = %keys.fingerprint(), "stored identity keys");
        Ok(())
    }

    fn get_room_key(&self, room: RoomId) -> Result<Option<SymmetricKey>> {
        let table = self.load_room_table()?;
        let encoded = match table.get(&room.to_string()) {
            None => return Ok(None),
            Some(Value::String(encoded)) => encoded,
            Some(other) => {
                warn!(room = %room, value = %other, "ignoring non-string room key entry");
                return Ok(None);
            }
        };

        match codec::decode_key::<SYMMETRIC_KEY_SIZE>(encoded) {
            Ok(key) => Ok(Some(key)),
            Err(e) => {
                warn!(room = %room, error = %e, "ignoring invalid room key");
                Ok(None)
            }
        }
    }

    fn put_room_key(&self, room: RoomId, key: &SymmetricKey) -> Result<()> {
        let encoded = codec::encode_bytes(key);
        self.storage.update_item(ROOM_KEYS_TABLE, &mut |current| {
            let mut table = current.map(|raw| parse_room_table(&raw)).unwrap_or_default();
            table.insert(room.to_string(), Value::String(encoded.clone()));
            Ok(serde_json::to_string(&table)?)
        })?;
        debug!(room = %room, "stored room key");
        Ok(())
    }

    fn room_ids(&self) -> Result<Vec<RoomId>> {
        let mut ids: Vec<RoomId> = self
            .load_room_table()?
            .iter()
            .filter(|(_, v)| v.is_string())
            .filter_map(|(k, _)| k.parse().ok().map(RoomId))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

fn identity_key(user: UserId) -> String {
    format!("{IDENTITY_KEYS_PREFIX}{user}")
}

/// Parse the room table, keeping entries of any shape. Only a table that is
/// not a JSON object at all reads as empty.
fn parse_room_table(raw: &str) -> RoomKeyTable {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(table)) => table,
        Ok(_) => {
            warn!("room key table is not an object; treating as empty");
            RoomKeyTable::new()
        }
        Err(e) => {
            warn!(error = %e, "room key table is corrupt; treating as empty");
            RoomKeyTable::new()
        }
    }
}
