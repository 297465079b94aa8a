//! Key-value backends.
//!
//! A [`Storage`] is a durable, synchronous string map in the mould of browser
//! local storage. The key store layers its two logical tables on top of it.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Result, StoreError};

pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Read-modify-write a single entry.
    ///
    /// `f` receives the current value (if any) and returns the replacement.
    /// No other writer can interleave between the read and the write.
    fn update_item(&self, key: &str, f: &mut dyn FnMut(Option<String>) -> Result<String>)
        -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for &S {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn update_item(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()> {
        (**self).update_item(key, f)
    }
}

/// Process-local backend. Used by tests and the ephemeral client mode.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize> {
        let items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(items.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn update_item(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()> {
        let mut items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
        let next = f(items.get(key).cloned())?;
        items.insert(key.to_string(), next);
        Ok(())
    }
}
