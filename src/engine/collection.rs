//! Stateful collection handles owning the load-on-init / save-on-mutate
//! lifecycle.
//!
//! A handle loads its collection once when opened and keeps it in memory.
//! Every mutation computes the next sequence with the pure transforms from
//! [`ops`](crate::engine::ops), persists it, and only then commits it to
//! memory, so an operation never reports success while storage is stale.

use serde_json::{Map, Value};

use crate::engine::ops::{self, SortOrder};
use crate::engine::vault;
use crate::{DurableStore, Error, Record, Result};

/// A handle to one collection: a store, the key it lives under, and the
/// current in-memory sequence of records.
pub struct Collection<'a, S: DurableStore + ?Sized> {
    store: &'a S,
    key: String,
    records: Vec<Record>,
}

impl<'a, S: DurableStore + ?Sized> Collection<'a, S> {
    /// Opens the collection stored at `key`, loading it into memory. A key
    /// never written yields an empty collection.
    pub fn open(store: &'a S, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
            records: store.load(key),
        }
    }

    /// The store key this collection lives under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The current records, in collection order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record carrying `id`, if present.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Appends a record and persists the collection. Ids must stay pairwise
    /// distinct, so adding a record whose id is already present fails with
    /// [`Error::DuplicateId`].
    pub fn add(&mut self, record: Record) -> Result<()> {
        if self.records.iter().any(|r| r.id == record.id) {
            return Err(Error::DuplicateId(record.id));
        }
        let next = ops::add(&self.records, record);
        self.commit(next)
    }

    /// Replaces the fields of the record carrying `id` and persists the
    /// collection. The record keeps its id and its position.
    pub fn update(&mut self, id: &str, fields: Map<String, Value>) -> Result<()> {
        let index = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        let next = ops::replace_at(&self.records, index, Record::with_id(id, fields));
        self.commit(next)
    }

    /// Removes the record carrying `id` and persists the collection.
    /// Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        let next = ops::remove_by_id(&self.records, id);
        if next.len() == self.records.len() {
            return Ok(());
        }
        self.commit(next)
    }

    /// A view of the records ordered by `field`. Does not change the stored
    /// order.
    pub fn sorted(&self, field: &str, order: SortOrder) -> Vec<Record> {
        ops::sort_by(&self.records, field, order)
    }

    /// A view of the records whose `field` matches `value`. Does not change
    /// the stored collection.
    pub fn filtered(&self, field: &str, value: &Value) -> Vec<Record> {
        ops::filter_by(&self.records, field, value)
    }

    fn commit(&mut self, next: Vec<Record>) -> Result<()> {
        self.store.save(&self.key, &next)?;
        self.records = next;
        Ok(())
    }
}

/// A collection handle that keeps one designated string field encrypted at
/// rest.
///
/// In memory the designated field always holds the decoded plaintext; on disk
/// it always holds codec output. A record without the designated field passes
/// through untouched in both directions, which keeps "never set" distinct
/// from "cannot decode" ([`Error::Decode`]).
pub struct SecureCollection<'a, S: DurableStore + ?Sized> {
    store: &'a S,
    key: String,
    field: String,
    master_key: Vec<u8>,
    records: Vec<Record>,
}

impl<'a, S: DurableStore + ?Sized> SecureCollection<'a, S> {
    /// Opens the collection at `key`, decrypting the designated `field` of
    /// every record that carries it. Fails with [`Error::Decode`] when any
    /// stored value is not valid codec output.
    pub fn open(store: &'a S, key: &str, field: &str, master_key: &[u8]) -> Result<Self> {
        let mut records = store.load(key);
        for record in &mut records {
            if let Some(value) = record.field(field) {
                let cipher_hex = value.as_str().ok_or_else(|| {
                    Error::Decode(format!("sensitive field '{}' is not a string", field))
                })?;
                let plaintext = vault::decrypt(cipher_hex, master_key)?;
                record.set_field(field, Value::String(plaintext));
            }
        }
        Ok(Self {
            store,
            key: key.to_string(),
            field: field.to_string(),
            master_key: master_key.to_vec(),
            records,
        })
    }

    /// The current records, with the designated field in plaintext form.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record carrying `id`, if present.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Appends a record (designated field in plaintext) and persists the
    /// collection in encoded form.
    pub fn add(&mut self, record: Record) -> Result<()> {
        if self.records.iter().any(|r| r.id == record.id) {
            return Err(Error::DuplicateId(record.id));
        }
        let next = ops::add(&self.records, record);
        self.commit(next)
    }

    /// Replaces the fields of the record carrying `id` and persists the
    /// collection in encoded form.
    pub fn update(&mut self, id: &str, fields: Map<String, Value>) -> Result<()> {
        let index = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        let next = ops::replace_at(&self.records, index, Record::with_id(id, fields));
        self.commit(next)
    }

    /// Removes the record carrying `id` and persists the collection.
    /// Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        let next = ops::remove_by_id(&self.records, id);
        if next.len() == self.records.len() {
            return Ok(());
        }
        self.commit(next)
    }

    /// A view of the records ordered by `field`, over plaintext values.
    pub fn sorted(&self, field: &str, order: SortOrder) -> Vec<Record> {
        ops::sort_by(&self.records, field, order)
    }

    /// A view of the records whose `field` matches `value`, over plaintext
    /// values.
    pub fn filtered(&self, field: &str, value: &Value) -> Vec<Record> {
        ops::filter_by(&self.records, field, value)
    }

    fn commit(&mut self, next: Vec<Record>) -> Result<()> {
        let encoded = self.encoded(&next)?;
        self.store.save(&self.key, &encoded)?;
        self.records = next;
        Ok(())
    }

    /// Produces the at-rest form: a copy of `records` with the designated
    /// field encrypted wherever it is present.
    fn encoded(&self, records: &[Record]) -> Result<Vec<Record>> {
        let mut encoded = records.to_vec();
        for record in &mut encoded {
            if let Some(value) = record.field(&self.field) {
                let plaintext = value.as_str().ok_or_else(|| {
                    Error::Internal(format!(
                        "sensitive field '{}' must hold a string",
                        self.field
                    ))
                })?;
                let cipher_hex = vault::encrypt(plaintext, &self.master_key)?;
                record.set_field(&self.field, Value::String(cipher_hex));
            }
        }
        Ok(encoded)
    }
}
