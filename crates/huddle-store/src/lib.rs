//! # huddle-store
//!
//! Durable key persistence for Huddle.
//!
//! A [`Storage`] backend provides a synchronous string map (SQLite on disk via
//! [`Database`], or [`MemoryStorage`]). [`LocalKeyStore`] layers the identity
//! key records and the shared room key table on top of it and implements the
//! [`KeyStore`] capability that sessions are built against.

pub mod database;
pub mod keystore;
pub mod migrations;
pub mod storage;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use keystore::{KeyStore, LocalKeyStore};
pub use storage::{MemoryStorage, Storage};
