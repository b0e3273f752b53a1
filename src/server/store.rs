//! Document stores backing the persistence server.
//!
//! Two deliberately separate shapes (see DESIGN.md): [`SceneStore`] is a
//! single mutable slot with upsert semantics, [`ItemStore`] is a
//! collection of items keyed by 24-hex-char identifiers. Both are
//! schema-agnostic: they hold raw JSON values, the way a document database
//! would.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The singleton scene slot. At most one document exists at any time;
/// `replace` upserts and `delete` is a no-op when the slot is empty.
pub struct SceneStore {
    slot: RwLock<Option<Value>>,
    path: Option<PathBuf>,
}

impl SceneStore {
    pub fn in_memory() -> Self {
        Self {
            slot: RwLock::new(None),
            path: None,
        }
    }

    /// Opens a file-backed store, loading the existing document if the file
    /// is present. The file holds the slot contents verbatim.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let slot = match fs::read(&path) {
            Ok(bytes) => Some(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            slot: RwLock::new(slot),
            path: Some(path),
        })
    }

    pub fn get(&self) -> Option<Value> {
        self.slot.read().expect("scene store lock poisoned").clone()
    }

    /// Upsert: inserts if absent, overwrites if present.
    pub fn replace(&self, document: Value) -> Result<(), StoreError> {
        let mut slot = self.slot.write().expect("scene store lock poisoned");
        *slot = Some(document);
        self.flush(&slot)
    }

    /// Removes the document if present. Returns whether one existed.
    pub fn delete(&self) -> Result<bool, StoreError> {
        let mut slot = self.slot.write().expect("scene store lock poisoned");
        let existed = slot.take().is_some();
        self.flush(&slot)?;
        Ok(existed)
    }

    fn flush(&self, slot: &Option<Value>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match slot {
            Some(value) => fs::write(path, serde_json::to_vec_pretty(value)?)?,
            None => match fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            },
        }
        Ok(())
    }
}

/// Identifier shape for the per-item store: 24 hex characters (12 bytes),
/// the classic document-database object id.
pub fn validate_item_id(id: &str) -> Result<(), String> {
    if id.len() != 24 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!(
            "invalid identifier {:?}: expected a 24 character hex string (12 bytes)",
            id
        ));
    }
    Ok(())
}

/// The per-item collection variant. Kept in-memory only; the singleton
/// scene slot is the durable shape.
pub struct ItemStore {
    items: RwLock<BTreeMap<String, Value>>,
    next_id: AtomicU64,
}

impl ItemStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn list(&self) -> Vec<Value> {
        self.items
            .read()
            .expect("item store lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Stores one item under a freshly assigned id; the id is written into
    /// the item's `_id` field and returned.
    pub fn insert(&self, mut item: Value) -> (String, Value) {
        let id = format!("{:024x}", self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Some(map) = item.as_object_mut() {
            map.insert("_id".to_string(), Value::String(id.clone()));
        }
        self.items
            .write()
            .expect("item store lock poisoned")
            .insert(id.clone(), item.clone());
        (id, item)
    }

    /// Removes one item. The id must already be validated; returns whether
    /// the item existed.
    pub fn delete(&self, id: &str) -> bool {
        self.items
            .write()
            .expect("item store lock poisoned")
            .remove(id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.items.read().expect("item store lock poisoned").len()
    }
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}
