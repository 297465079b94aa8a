use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::codec;
use crate::constants::{PUBLIC_KEY_SIZE, SECRET_KEY_SIZE};
use crate::error::CryptoError;

/// A user's long-lived X25519 key pair, used for direct messages.
#[derive(Clone)]
pub struct IdentityKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

/// Persisted form of an identity key pair: both halves base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    pub public_key: String,
    pub secret_key: String,
}

impl IdentityKeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self::from_secret(StaticSecret::random_from_rng(OsRng))
    }

    /// Restore a key pair from secret key bytes
    pub fn from_secret_bytes(secret: [u8; SECRET_KEY_SIZE]) -> Self {
        Self::from_secret(StaticSecret::from(secret))
    }

    fn from_secret(secret: StaticSecret) -> Self {
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Restore a key pair from its persisted record.
    ///
    /// The stored public half must match the one derived from the secret.
    pub fn from_record(record: &IdentityRecord) -> Result<Self, CryptoError> {
        let secret = codec::decode_key::<SECRET_KEY_SIZE>(&record.secret_key)?;
        let public = codec::decode_key::<PUBLIC_KEY_SIZE>(&record.public_key)?;

        let pair = Self::from_secret_bytes(secret);
        if pair.public.as_bytes() != &public {
            return Err(CryptoError::KeyMismatch);
        }
        Ok(pair)
    }

    pub fn to_record(&self) -> IdentityRecord {
        IdentityRecord {
            public_key: self.public_key_b64(),
            secret_key: codec::encode_bytes(self.secret.as_bytes()),
        }
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub fn secret(&self) -> &StaticSecret {
        &self.secret
    }

    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public.to_bytes()
    }

    /// Transport-encoded public key, the form handed to peers.
    pub fn public_key_b64(&self) -> String {
        codec::encode_bytes(self.public.as_bytes())
    }

    /// Short BLAKE3 fingerprint of the public key, safe to log.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.public)
    }
}

impl std::fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityKeyPair")
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

/// Parse a peer's transport-encoded public key.
pub fn public_key_from_b64(encoded: &str) -> Result<PublicKey, CryptoError> {
    codec::decode_key::<PUBLIC_KEY_SIZE>(encoded).map(PublicKey::from)
}

pub fn fingerprint(public: &PublicKey) -> String {
    hex::encode(&blake3::hash(public.as_bytes()).as_bytes()[..4])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_gives_distinct_pairs() {
        let a = IdentityKeyPair::generate();
        let b = IdentityKeyPair::generate();
        assert_ne!(a.public_key_bytes(), b.public_key_bytes());
    }

    #[test]
    fn test_record_roundtrip() {
        let pair = IdentityKeyPair::generate();
        let record = pair.to_record();
        let restored = IdentityKeyPair::from_record(&record).unwrap();
        assert_eq!(pair.public_key_bytes(), restored.public_key_bytes());
        assert_eq!(pair.secret().to_bytes(), restored.secret().to_bytes());
    }

    #[test]
    fn test_record_uses_camel_case_fields() {
        let record = IdentityKeyPair::generate().to_record();
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("publicKey").is_some());
        assert!(json.get("secretKey").is_some());
    }

    #[test]
    fn test_mismatched_record_rejected() {
        let a = IdentityKeyPair::generate().to_record();
        let b = IdentityKeyPair::generate().to_record();
        let spliced = IdentityRecord {
            public_key: a.public_key,
            secret_key: b.secret_key,
        };
        assert_eq!(
            IdentityKeyPair::from_record(&spliced).unwrap_err(),
            CryptoError::KeyMismatch
        );
    }

    #[test]
    fn test_short_public_key_rejected() {
        let err = public_key_from_b64(&codec::encode_bytes(&[1u8; 31])).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKeyLength { expected: 32, actual: 31 }));
    }

    #[test]
    fn test_debug_hides_secret() {
        let pair = IdentityKeyPair::generate();
        let rendered = format!("{pair:?}");
        assert!(rendered.contains(&pair.fingerprint()));
        assert!(!rendered.contains(&pair.to_record().secret_key));
    }
}
