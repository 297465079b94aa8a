//! # huddle-shared
//!
//! Types and cryptographic primitives shared by every Huddle crate: the
//! envelope codec, room (symmetric) and direct (X25519 box) encryption,
//! identity key pairs, and the chat message model. Nothing here performs I/O.

pub mod codec;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod protocol;
pub mod types;

pub use codec::Envelope;
pub use error::CryptoError;
pub use identity::{IdentityKeyPair, IdentityRecord};
pub use x25519_dalek::{PublicKey, StaticSecret};
