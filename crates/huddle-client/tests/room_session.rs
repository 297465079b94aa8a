//! End-to-end room scenarios over a shared key store.

use huddle_client::{KeyProvisioning, RoomKeyState, RoomSession, SessionError};
use huddle_shared::constants::{KEY_UNAVAILABLE_TEXT, SYMMETRIC_KEY_SIZE, UNDECRYPTABLE_TEXT};
use huddle_shared::protocol::{Message, MessageBody, Sender};
use huddle_shared::types::{Room, RoomId, UserId, UserProfile};
use huddle_store::{Database, KeyStore, LocalKeyStore, MemoryStorage, Storage};

fn profile(id: u64, name: &str) -> UserProfile {
    UserProfile::new(UserId(id), name)
}

fn sealed(room: RoomId, envelope: &str) -> Message {
    Message::new(
        room,
        Sender::from(&profile(2, "Jamie")),
        MessageBody::Sealed {
            envelope: envelope.to_string(),
        },
    )
}

#[test]
fn new_encrypted_room_round_trip() {
    let storage = MemoryStorage::new();
    let mut session = RoomSession::start(LocalKeyStore::new(&storage), profile(1, "Alex")).unwrap();
    let room = RoomId(3);

    assert!(session.store().get_room_key(room).unwrap().is_none());
    assert_eq!(
        session.ensure_room_key(room, true).unwrap(),
        KeyProvisioning::Generated
    );

    let key = session.store().get_room_key(room).unwrap().unwrap();
    assert_eq!(key.len(), SYMMETRIC_KEY_SIZE);

    let body = session.encrypt_outgoing(room, "hello").unwrap();
    let MessageBody::Sealed { envelope } = body else {
        panic!("encrypted room produced a plain body");
    };
    assert!(!envelope.is_empty());
    assert_ne!(envelope, "hello");

    assert_eq!(session.decrypt_incoming(room, &sealed(room, &envelope)), "hello");
}

#[test]
fn missing_key_on_decrypt_shows_placeholder() {
    let storage = MemoryStorage::new();
    let mut session = RoomSession::start(LocalKeyStore::new(&storage), profile(1, "Alex")).unwrap();
    let room = RoomId(5);
    session
        .select_room(&Room {
            id: room,
            name: "Secure Room".into(),
            description: "End-to-end encrypted communications".into(),
            encrypted: true,
        })
        .unwrap();

    // A participant elsewhere seals a message under their own key for room 5.
    let mut other =
        RoomSession::start(LocalKeyStore::new(MemoryStorage::new()), profile(2, "Jamie")).unwrap();
    other.ensure_room_key(room, true).unwrap();
    let MessageBody::Sealed { envelope } = other.encrypt_outgoing(room, "psst").unwrap() else {
        panic!("expected sealed body");
    };

    let fresh = RoomSession::start(LocalKeyStore::new(MemoryStorage::new()), profile(3, "Sam")).unwrap();
    assert_eq!(fresh.decrypt_incoming(room, &sealed(room, &envelope)), KEY_UNAVAILABLE_TEXT);

    // Holding a different key for the room is an integrity failure, not a panic.
    assert_eq!(session.decrypt_incoming(room, &sealed(room, &envelope)), UNDECRYPTABLE_TEXT);
}

#[test]
fn corrupted_envelope_shows_placeholder() {
    let storage = MemoryStorage::new();
    let mut session = RoomSession::start(LocalKeyStore::new(&storage), profile(1, "Alex")).unwrap();
    let room = RoomId(3);
    session.ensure_room_key(room, true).unwrap();

    let MessageBody::Sealed { envelope } = session.encrypt_outgoing(room, "hello").unwrap() else {
        panic!("expected sealed body");
    };
    let truncated = &envelope[..envelope.len() - 4];

    assert_eq!(session.decrypt_incoming(room, &sealed(room, truncated)), UNDECRYPTABLE_TEXT);
    assert_eq!(session.decrypt_incoming(room, &sealed(room, "%%%")), UNDECRYPTABLE_TEXT);
}

#[test]
fn bad_message_does_not_block_history() {
    let storage = MemoryStorage::new();
    let mut session = RoomSession::start(LocalKeyStore::new(&storage), profile(1, "Alex")).unwrap();
    let room = RoomId(3);
    session.ensure_room_key(room, true).unwrap();

    let good = session.compose_message(room, "first").unwrap();
    let bad = sealed(room, "AAAA");
    let also_good = session.compose_message(room, "second").unwrap();

    let texts = session.display_history(room, &[good, bad, also_good]);
    assert_eq!(texts, vec!["first", UNDECRYPTABLE_TEXT, "second"]);
}

#[test]
fn unencrypted_room_passes_through_regardless_of_store() {
    let storage = MemoryStorage::new();
    let mut session = RoomSession::start(LocalKeyStore::new(&storage), profile(1, "Alex")).unwrap();
    let room = RoomId(1);
    session.ensure_room_key(room, false).unwrap();

    assert_eq!(
        session.encrypt_outgoing(room, "Hey everyone!").unwrap(),
        MessageBody::Plain {
            text: "Hey everyone!".into()
        }
    );

    let plain = Message::new(
        room,
        Sender::from(&profile(2, "Jamie")),
        MessageBody::Plain {
            text: "I'm doing great".into(),
        },
    );
    assert_eq!(session.decrypt_incoming(room, &plain), "I'm doing great");
    assert_eq!(session.room_state(room).unwrap(), RoomKeyState::Unencrypted);
}

#[test]
fn lost_room_key_blocks_sending() {
    let storage = MemoryStorage::new();
    let mut session = RoomSession::start(LocalKeyStore::new(&storage), profile(1, "Alex")).unwrap();
    let room = RoomId(3);
    session.ensure_room_key(room, true).unwrap();

    // Wipe the room table behind the session's back.
    storage.set_item("room_keys", "{}").unwrap();

    assert!(matches!(
        session.encrypt_outgoing(room, "hello"),
        Err(SessionError::MissingRoomKey(RoomId(3)))
    ));
}

#[test]
fn participants_sharing_a_store_read_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let room = RoomId(3);

    let mut alex =
        RoomSession::start(LocalKeyStore::new(Database::open_at(&path).unwrap()), profile(1, "Alex"))
            .unwrap();
    alex.ensure_room_key(room, true).unwrap();
    let message = alex.compose_message(room, "Book club at 8").unwrap();

    let mut jamie =
        RoomSession::start(LocalKeyStore::new(Database::open_at(&path).unwrap()), profile(2, "Jamie"))
            .unwrap();
    assert_eq!(
        jamie.ensure_room_key(room, true).unwrap(),
        KeyProvisioning::Existing
    );
    assert_eq!(jamie.decrypt_incoming(room, &message), "Book club at 8");
    assert_ne!(alex.public_key(), jamie.public_key());
}
