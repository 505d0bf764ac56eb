//! Lifelog Store is a lightweight, local-first record store for personal
//! tracking data (journal, diet, todo, skills, links, passwords).
//!
//! Every tracker surface follows the same pattern: load an ordered collection
//! of records from a store key, view it sorted and filtered, edit one record,
//! and write the whole collection back on save. This crate packages that
//! pattern once, with atomic JSON persistence and AES-256-GCM encryption for
//! designated sensitive fields.
//!
//! ## Core Components
//! - [`engine`]: Storage backends, the collection engine, and the field codec.
//! - [`model`]: Typed record schemas for the built-in tracker collections.

pub mod engine;
pub mod model;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by the Lifelog Store.
#[derive(Error, Debug)]
pub enum Error {
    /// No record with the given id exists in the collection.
    #[error("record not found: {0}")]
    RecordNotFound(String),
    /// A record with the same id is already present in the collection.
    #[error("duplicate record id: {0}")]
    DuplicateId(String),
    /// Ciphertext could not be decoded. The plaintext is unrecoverable;
    /// callers must not treat this as an empty value.
    #[error("decode error: {0}")]
    Decode(String),
    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during JSON serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized Result type for Lifelog Store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// One structured entry in a collection: a generated id plus an open set of
/// named fields.
///
/// Records are identifier-addressed: the id is assigned once at construction
/// and never changes, so a record keeps its identity when the collection is
/// re-sorted or filtered. The field map is opaque to the store; concrete
/// schemas live with callers (see [`model`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable unique identifier within the collection.
    pub id: String,
    /// Named field values, serialized inline with the id.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Creates a record with a freshly generated id.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            fields,
        }
    }

    /// Creates a record with an explicit id. Used when replacing a record in
    /// place while keeping its identity.
    pub fn with_id(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Builds a record from any serializable value. The value must serialize
    /// to a JSON object; its members become the record's fields.
    pub fn of<T: Serialize>(value: &T) -> Result<Self> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => Ok(Self::new(fields)),
            _ => Err(Error::Internal(
                "record value must serialize to an object".to_string(),
            )),
        }
    }

    /// Deserializes the record's fields into a typed value.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }

    /// Returns the value of a named field, if present.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets or replaces a named field.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }
}

/// Read/write access to the persistent key-value medium backing all
/// collections.
///
/// Each key holds one whole collection. `load` is fail-open: an absent key or
/// an unparseable stored value yields an empty collection, never an error, so
/// a first run or a corrupted file cannot block the caller.
pub trait DurableStore {
    /// Reads the collection stored at `key`. Returns an empty collection when
    /// the key is absent or its value cannot be parsed.
    fn load(&self, key: &str) -> Vec<Record>;

    /// Serializes `records` and replaces the value at `key`. The previous
    /// value is replaced atomically from the caller's point of view: a
    /// subsequent `load` observes either the old collection or the new one,
    /// never a partial write.
    fn save(&self, key: &str, records: &[Record]) -> Result<()>;
}
