use std::fs;

use serde_json::{json, Map, Value};
use tempfile::tempdir;

use lifelog_store::engine::{Collection, FileStore, SecureCollection, SortOrder};
use lifelog_store::model::{PasswordEntry, SkillItem, TodoItem};
use lifelog_store::{DurableStore, Error, Record};

const MASTER_KEY: &[u8] = b"thisis32byteslongsecretkey123456";

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[test]
fn test_todo_survives_reopen() {
    let dir = tempdir().unwrap();

    {
        let store = FileStore::new(dir.path()).unwrap();
        let mut todo = Collection::open(&store, TodoItem::COLLECTION);
        todo.add(Record::new(fields(json!({"task": "Buy milk", "state": "todo"}))))
            .unwrap();
    }

    // a fresh store plays the role of a new process
    let store = FileStore::new(dir.path()).unwrap();
    let todo = Collection::open(&store, TodoItem::COLLECTION);
    assert_eq!(todo.len(), 1);
    assert_eq!(todo.records()[0].field("task"), Some(&json!("Buy milk")));
    assert_eq!(todo.records()[0].field("state"), Some(&json!("todo")));
}

#[test]
fn test_corrupted_collection_loads_empty_and_recovers() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("diet.json"), b"]]{{ definitely not json").unwrap();

    let store = FileStore::new(dir.path()).unwrap();
    let mut diet = Collection::open(&store, "diet");
    assert!(diet.is_empty());

    // writing through the handle replaces the corrupt file
    diet.add(Record::new(fields(json!({"date": "2024-03-01", "meal": "lunch", "calories": 420}))))
        .unwrap();
    assert_eq!(store.load("diet").len(), 1);
}

#[test]
fn test_collection_order_is_preserved_across_reopen() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    let mut skills = Collection::open(&store, SkillItem::COLLECTION);
    for (skill, learned) in [("Go", false), ("awk", true), ("sed", false)] {
        skills
            .add(Record::new(fields(json!({"skill": skill, "learned": learned}))))
            .unwrap();
    }

    let reopened = Collection::open(&store, SkillItem::COLLECTION);
    let names: Vec<&Value> = reopened
        .records()
        .iter()
        .map(|r| r.field("skill").unwrap())
        .collect();
    assert_eq!(names, vec![&json!("Go"), &json!("awk"), &json!("sed")]);

    // sorted view: case-sensitive comparison puts "Go" before "awk"
    let sorted = reopened.sorted("skill", SortOrder::Asc);
    assert_eq!(sorted[0].field("skill"), Some(&json!("Go")));
    assert_eq!(sorted[2].field("skill"), Some(&json!("sed")));
}

#[test]
fn test_passwords_are_unreadable_on_disk() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    let entry = PasswordEntry {
        site: "example.com".to_string(),
        username: "ada".to_string(),
        password: "hunter2".to_string(),
    };
    let mut vault = SecureCollection::open(
        &store,
        PasswordEntry::COLLECTION,
        PasswordEntry::SENSITIVE_FIELD,
        MASTER_KEY,
    )
    .unwrap();
    vault.add(Record::of(&entry).unwrap()).unwrap();

    // the raw file never contains the plaintext
    let raw = fs::read_to_string(dir.path().join("passwords.json")).unwrap();
    assert!(!raw.contains("hunter2"));
    assert!(raw.contains("ada"));

    // a fresh handle recovers the typed entry
    let store = FileStore::new(dir.path()).unwrap();
    let vault = SecureCollection::open(
        &store,
        PasswordEntry::COLLECTION,
        PasswordEntry::SENSITIVE_FIELD,
        MASTER_KEY,
    )
    .unwrap();
    let parsed: PasswordEntry = vault.records()[0].parse().unwrap();
    assert_eq!(parsed, entry);
}

#[test]
fn test_tampered_password_file_fails_with_decode_error() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    let mut vault = SecureCollection::open(&store, "passwords", "password", MASTER_KEY).unwrap();
    vault
        .add(Record::new(fields(json!({"site": "example.com", "password": "hunter2"}))))
        .unwrap();

    // flip the stored ciphertext to something the codec never produced
    let mut raw = store.load("passwords");
    raw[0].set_field("password", json!("deadbeef"));
    store.save("passwords", &raw).unwrap();

    let result = SecureCollection::open(&store, "passwords", "password", MASTER_KEY);
    assert!(matches!(result, Err(Error::Decode(_))));

    // the plain view is still readable; only the codec path refuses
    let plain = Collection::open(&store, "passwords");
    assert_eq!(plain.len(), 1);
}

#[test]
fn test_export_projection_matches_stored_form() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    let mut links = Collection::open(&store, "links");
    links
        .add(Record::new(fields(json!({"title": "home", "url": "https://example.com"}))))
        .unwrap();

    // an export is a read-only projection of what load returns
    let exported = serde_json::to_string_pretty(&store.load("links")).unwrap();
    let parsed: Vec<Record> = serde_json::from_str(&exported).unwrap();
    assert_eq!(parsed, links.records());
}
