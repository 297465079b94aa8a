//! `huddle` command-line client.
//!
//! Exercises a room session against the configured key store: provisioning
//! room keys, sealing outgoing messages and displaying received envelopes.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use huddle_client::{logging, ClientConfig, KeyProvisioning, RoomSession};
use huddle_shared::protocol::{Message, MessageBody, Sender};
use huddle_shared::types::RoomId;

#[derive(Debug, Parser)]
#[command(name = "huddle", version, about = "Encrypted room messaging from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print this user's public key and fingerprint
    Identity,

    /// Enter a room, provisioning its key when it is encrypted
    Enter {
        room: u64,
        #[arg(long)]
        encrypted: bool,
    },

    /// Compose a message for a room and print it as JSON
    Send {
        room: u64,
        #[arg(long)]
        encrypted: bool,
        text: String,
    },

    /// Display a sealed envelope received in a room
    Read { room: u64, envelope: String },

    /// List rooms that hold a key
    Rooms,

    /// Seal a direct message for a peer's public key
    Seal {
        #[arg(long)]
        to: String,
        text: String,
    },

    /// Open a direct message from a peer's public key
    Open {
        #[arg(long)]
        from: String,
        envelope: String,
    },
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    let store = config
        .open_key_store()
        .context("failed to open key store")?;
    let mut session = RoomSession::start(store, config.profile())?;

    match cli.command {
        Command::Identity => {
            println!("user:        {}", session.profile().id);
            println!("public key:  {}", session.public_key());
            println!("fingerprint: {}", session.identity().fingerprint());
        }
        Command::Enter { room, encrypted } => {
            let outcome = session.ensure_room_key(RoomId(room), encrypted)?;
            match outcome {
                KeyProvisioning::Generated => {
                    println!("Joined encrypted room {room}; a new room key was generated.")
                }
                KeyProvisioning::Existing => println!("Joined encrypted room {room}."),
                KeyProvisioning::NotRequired => println!("Joined room {room}."),
            }
        }
        Command::Send {
            room,
            encrypted,
            text,
        } => {
            let room = RoomId(room);
            session.ensure_room_key(room, encrypted)?;
            let message = session
                .compose_message(room, &text)
                .context("message was not sent")?;
            println!("{}", serde_json::to_string_pretty(&message)?);
        }
        Command::Read { room, envelope } => {
            let message = Message::new(
                RoomId(room),
                Sender::from(session.profile()),
                MessageBody::Sealed { envelope },
            );
            println!("{}", session.decrypt_incoming(RoomId(room), &message));
        }
        Command::Rooms => {
            for room in session.store().room_ids()? {
                println!("{room}");
            }
        }
        Command::Seal { to, text } => {
            println!("{}", session.encrypt_direct(&to, &text)?);
        }
        Command::Open { from, envelope } => {
            println!("{}", session.decrypt_direct(&from, &envelope)?);
        }
    }

    Ok(())
}
