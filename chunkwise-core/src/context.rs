//! Per document side channel shared by every stage of one ingestion.
//!
//! A fresh context is created for every document and dropped when that document is done. It is not
//! `Clone`, stages only ever get a shared reference.
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde_json::Value;

#[derive(Debug, Default)]
pub struct IngestionContext {
    values: RwLock<HashMap<String, Value>>,
}

impl IngestionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the value stored under `key`
    pub fn get(&self, key: impl AsRef<str>) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key.as_ref())
            .cloned()
    }

    /// Stores a value, returning the previous value for the key if there was one
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into())
    }

    pub fn remove(&self, key: impl AsRef<str>) -> Option<Value> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key.as_ref())
    }

    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key.as_ref())
    }

    /// Increments a running counter and returns the new count.
    ///
    /// Missing or non-numeric values start from zero.
    pub fn increment(&self, key: impl Into<String>) -> i64 {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        let entry = values.entry(key.into()).or_insert(Value::from(0));
        let next = entry.as_i64().unwrap_or_default() + 1;
        *entry = Value::from(next);
        next
    }

    pub fn len(&self) -> usize {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
