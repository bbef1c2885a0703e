// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::StorageError;
use std::collections::HashMap;

/// Logical keys of the persisted state.
pub mod keys {
    pub const TRANSACTIONS: &str = "transactions";
    pub const SUBSCRIPTIONS: &str = "subscriptions";
    pub const CATEGORIES: &str = "categories";
    /// Stored as the raw symbol, not JSON.
    pub const CURRENCY: &str = "currency";
    pub const CUSTOM_CURRENCIES: &str = "customCurrencies";
    pub const POCKETS: &str = "pockets";
}

/// Durable string key-value store the ledger saves into after every mutation
/// and reads once per key at startup.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Writes several keys as one unit where the backend supports it.
    fn set_all(&mut self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// Non-durable store for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
