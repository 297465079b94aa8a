use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::codec::{self, Envelope};
use crate::constants::{
    DIRECT_NONCE_SIZE, KDF_CONTEXT_DIRECT_KEY, ROOM_NONCE_SIZE, SYMMETRIC_KEY_SIZE,
};
use crate::error::CryptoError;

pub type SymmetricKey = [u8; SYMMETRIC_KEY_SIZE];

pub fn generate_symmetric_key() -> SymmetricKey {
    let mut key = [0u8; SYMMETRIC_KEY_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut key);
    key
}

pub fn generate_nonce<const N: usize>() -> [u8; N] {
    let mut nonce = [0u8; N];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Interpret raw bytes as a room key, rejecting anything but 32 bytes.
pub fn symmetric_key_from_slice(bytes: &[u8]) -> Result<SymmetricKey, CryptoError> {
    codec::key_from_slice(bytes)
}

// ---------------------------------------------------------------------------
// Room mode: XChaCha20-Poly1305 under a shared room key
// ---------------------------------------------------------------------------

/// Encrypt under a fresh random nonce. Nonces are never derived from a counter.
pub fn encrypt_symmetric(plaintext: &[u8], key: &SymmetricKey) -> Result<Envelope, CryptoError> {
    seal(key, generate_nonce::<ROOM_NONCE_SIZE>().to_vec(), plaintext)
}

pub fn decrypt_symmetric(envelope: &Envelope, key: &SymmetricKey) -> Result<Vec<u8>, CryptoError> {
    open(key, envelope, ROOM_NONCE_SIZE)
}

/// Encrypt a UTF-8 room message straight to its transport string.
pub fn seal_room_text(text: &str, key: &SymmetricKey) -> Result<String, CryptoError> {
    Ok(encrypt_symmetric(text.as_bytes(), key)?.pack())
}

pub fn open_room_text(envelope: &str, key: &SymmetricKey) -> Result<String, CryptoError> {
    let envelope = Envelope::unpack(envelope, ROOM_NONCE_SIZE)?;
    let bytes = decrypt_symmetric(&envelope, key)?;
    String::from_utf8(bytes).map_err(|_| CryptoError::InvalidPlaintext)
}

// ---------------------------------------------------------------------------
// Direct mode: X25519 box
// ---------------------------------------------------------------------------

/// Derive the box key shared by `my_secret` and `their_public`.
///
/// Both directions of a pair arrive at the same key. A non-contributory
/// exchange (low-order peer point) is refused.
fn box_key(my_secret: &StaticSecret, their_public: &PublicKey) -> Option<SymmetricKey> {
    let shared = my_secret.diffie_hellman(their_public);
    if !shared.was_contributory() {
        return None;
    }
    Some(blake3::derive_key(KDF_CONTEXT_DIRECT_KEY, shared.as_bytes()))
}

pub fn encrypt_asymmetric(
    plaintext: &[u8],
    my_secret: &StaticSecret,
    their_public: &PublicKey,
) -> Result<Envelope, CryptoError> {
    let key = box_key(my_secret, their_public).ok_or(CryptoError::EncryptionFailed)?;
    seal(&key, generate_nonce::<DIRECT_NONCE_SIZE>().to_vec(), plaintext)
}

pub fn decrypt_asymmetric(
    envelope: &Envelope,
    my_secret: &StaticSecret,
    their_public: &PublicKey,
) -> Result<Vec<u8>, CryptoError> {
    let key = box_key(my_secret, their_public).ok_or(CryptoError::DecryptionFailed)?;
    open(&key, envelope, DIRECT_NONCE_SIZE)
}

pub fn seal_direct_text(
    text: &str,
    my_secret: &StaticSecret,
    their_public: &PublicKey,
) -> Result<String, CryptoError> {
    Ok(encrypt_asymmetric(text.as_bytes(), my_secret, their_public)?.pack())
}

pub fn open_direct_text(
    envelope: &str,
    my_secret: &StaticSecret,
    their_public: &PublicKey,
) -> Result<String, CryptoError> {
    let envelope = Envelope::unpack(envelope, DIRECT_NONCE_SIZE)?;
    let bytes = decrypt_asymmetric(&envelope, my_secret, their_public)?;
    String::from_utf8(bytes).map_err(|_| CryptoError::InvalidPlaintext)
}

// ---------------------------------------------------------------------------
// AEAD core
// ---------------------------------------------------------------------------

fn seal(key: &SymmetricKey, nonce: Vec<u8>, plaintext: &[u8]) -> Result<Envelope, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.into());
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;
    Ok(Envelope::new(nonce, ciphertext))
}

fn open(key: &SymmetricKey, envelope: &Envelope, nonce_len: usize) -> Result<Vec<u8>, CryptoError> {
    if envelope.nonce.len() != nonce_len {
        return Err(CryptoError::InvalidNonceLength {
            expected: nonce_len,
            actual: envelope.nonce.len(),
        });
    }

    let cipher = XChaCha20Poly1305::new(key.into());
    cipher
        .decrypt(XNonce::from_slice(&envelope.nonce), envelope.ciphertext.as_slice())
        .map_err(|_| CryptoError::DecryptionFailed)
}
