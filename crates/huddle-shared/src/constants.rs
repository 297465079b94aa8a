/// Symmetric room key size in bytes (XChaCha20-Poly1305)
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Nonce size for room envelopes (XChaCha20-Poly1305)
pub const ROOM_NONCE_SIZE: usize = 24;

/// Nonce size for direct-message envelopes (X25519 box over XChaCha20-Poly1305)
pub const DIRECT_NONCE_SIZE: usize = 24;

/// Poly1305 authentication tag size in bytes
pub const TAG_SIZE: usize = 16;

/// X25519 public key size in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// X25519 secret key size in bytes
pub const SECRET_KEY_SIZE: usize = 32;

/// Key derivation context (BLAKE3) for direct-message box keys
pub const KDF_CONTEXT_DIRECT_KEY: &str = "huddle-direct-box-v1";

/// Storage key prefix for a user's identity key record
pub const IDENTITY_KEYS_PREFIX: &str = "encryption_keys_";

/// Storage key holding the room key table
pub const ROOM_KEYS_TABLE: &str = "room_keys";

/// Display text for a sealed message whose room key is not held locally
pub const KEY_UNAVAILABLE_TEXT: &str = "Encrypted message (key not available)";

/// Display text for a sealed message that fails to open
pub const UNDECRYPTABLE_TEXT: &str = "Could not decrypt message";
