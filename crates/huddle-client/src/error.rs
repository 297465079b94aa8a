use huddle_shared::types::RoomId;
use huddle_shared::CryptoError;
use huddle_store::StoreError;
use thiserror::Error;

/// Failures surfaced to the caller of a [`RoomSession`](crate::session::RoomSession).
///
/// Only the send path and direct messages produce these; room message
/// decryption degrades to display placeholders instead.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Room {0} is encrypted but its key is not available")]
    MissingRoomKey(RoomId),

    #[error("Room {0} has not been entered in this session")]
    UnknownRoom(RoomId),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Room name is required")]
    InvalidRoomName,

    #[error("No room ids left after {0}")]
    RoomIdsExhausted(RoomId),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
