//! Envelope transport encoding.
//!
//! An envelope travels as a single base64 string whose decoded layout is
//! `nonce || ciphertext`. There is no length prefix: the nonce length is fixed
//! per mode ([`ROOM_NONCE_SIZE`](crate::constants::ROOM_NONCE_SIZE) for rooms,
//! [`DIRECT_NONCE_SIZE`](crate::constants::DIRECT_NONCE_SIZE) for direct
//! messages) and the reader supplies it when unpacking.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::CryptoError;

/// A nonce and the authenticated ciphertext produced under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub nonce: Vec<u8>,
    /// Ciphertext including the Poly1305 tag.
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    pub fn new(nonce: Vec<u8>, ciphertext: Vec<u8>) -> Self {
        Self { nonce, ciphertext }
    }

    /// Serialize as `base64(nonce || ciphertext)`.
    pub fn pack(&self) -> String {
        let mut bytes = Vec::with_capacity(self.nonce.len() + self.ciphertext.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        STANDARD.encode(bytes)
    }

    /// Parse a transport string, splitting off the first `nonce_len` bytes.
    pub fn unpack(envelope: &str, nonce_len: usize) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(envelope.trim())
            .map_err(|e| CryptoError::MalformedEnvelope(format!("invalid base64: {e}")))?;

        if bytes.len() < nonce_len {
            return Err(CryptoError::MalformedEnvelope(format!(
                "{} bytes is shorter than the {nonce_len}-byte nonce",
                bytes.len()
            )));
        }

        let (nonce, ciphertext) = bytes.split_at(nonce_len);
        Ok(Self {
            nonce: nonce.to_vec(),
            ciphertext: ciphertext.to_vec(),
        })
    }
}

pub fn pack(nonce: &[u8], ciphertext: &[u8]) -> String {
    Envelope::new(nonce.to_vec(), ciphertext.to_vec()).pack()
}

pub fn unpack(envelope: &str, nonce_len: usize) -> Result<Envelope, CryptoError> {
    Envelope::unpack(envelope, nonce_len)
}

/// Transport-encode raw key material.
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a transport-encoded key that must be exactly `N` bytes long.
pub fn decode_key<const N: usize>(encoded: &str) -> Result<[u8; N], CryptoError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))?;
    key_from_slice(&bytes)
}

/// Copy a slice into a fixed-size key array, rejecting any other length.
pub fn key_from_slice<const N: usize>(bytes: &[u8]) -> Result<[u8; N], CryptoError> {
    <[u8; N]>::try_from(bytes).map_err(|_| CryptoError::InvalidKeyLength {
        expected: N,
        actual: bytes.len(),
    })
}
