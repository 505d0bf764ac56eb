//! Typed record schemas for the built-in tracker collections.
//!
//! The store itself treats records as opaque field maps; these structs are
//! the shapes the bundled tracker surfaces write. Each carries the store key
//! its collection lives under and converts through [`crate::Record::of`] /
//! [`crate::Record::parse`].

use serde::{Deserialize, Serialize};

/// One journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub date: String,
    pub title: String,
    pub body: String,
}

impl JournalEntry {
    pub const COLLECTION: &'static str = "entries";
}

/// One meal in the diet log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietEntry {
    pub date: String,
    pub meal: String,
    pub calories: u32,
}

impl DietEntry {
    pub const COLLECTION: &'static str = "diet";
}

/// One item on the todo list. `state` is free-form ("todo", "done", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub task: String,
    pub state: String,
}

impl TodoItem {
    pub const COLLECTION: &'static str = "todo";
}

/// One skill being tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillItem {
    pub skill: String,
    pub learned: bool,
}

impl SkillItem {
    pub const COLLECTION: &'static str = "skills";
}

/// One saved link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkItem {
    pub title: String,
    pub url: String,
}

impl LinkItem {
    pub const COLLECTION: &'static str = "links";
}

/// One stored credential. The `password` field is the designated sensitive
/// field: encrypted at rest, plaintext only in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordEntry {
    pub site: String,
    pub username: String,
    pub password: String,
}

impl PasswordEntry {
    pub const COLLECTION: &'static str = "passwords";
    /// Name of the field the codec protects.
    pub const SENSITIVE_FIELD: &'static str = "password";
}
