//! # huddle-client
//!
//! Client-side orchestration for encrypted rooms: a [`RoomSession`] ties the
//! local user's identity, the key store and the room encryption policy
//! together and exposes the encrypt-outgoing / decrypt-incoming contract the
//! message pipeline is built on.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use config::ClientConfig;
pub use error::SessionError;
pub use session::{KeyProvisioning, RoomKeyState, RoomSession};
