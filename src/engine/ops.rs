//! Pure transforms over record collections.
//!
//! Every function returns a fresh `Vec` and leaves the input untouched, so a
//! caller can derive a view for display while keeping the authoritative
//! sequence for persistence.

use std::cmp::Ordering;
use std::str::FromStr;

use serde_json::Value;

use crate::{Error, Record};

/// Direction for [`sort_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(Error::Internal(format!("unknown sort order: {}", other))),
        }
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Comparator for field values.
///
/// A missing field and JSON null sort first ascending. Booleans order false
/// before true, numbers compare as f64, and strings compare bytewise
/// (case-sensitive, so `"Go"` sorts before `"awk"`). Values of different
/// types order by a fixed type rank; arrays and objects are not ordered among
/// themselves.
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}

/// Returns the records ordered by `field`. The sort is stable: records that
/// compare equal keep their relative order, so applying the same sort twice
/// gives the same sequence.
pub fn sort_by(records: &[Record], field: &str, order: SortOrder) -> Vec<Record> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = compare_fields(a.field(field), b.field(field));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    sorted
}

/// Returns the records whose `field` matches the filter `value`.
///
/// A null or empty-string filter value means "no filter" and returns the
/// input unchanged. A string filter value matches by case-insensitive
/// substring containment; any other filter value (booleans included) matches
/// by exact equality. Records without the field never match.
pub fn filter_by(records: &[Record], field: &str, value: &Value) -> Vec<Record> {
    match value {
        Value::Null => records.to_vec(),
        Value::String(s) if s.is_empty() => records.to_vec(),
        Value::String(needle) => {
            let needle = needle.to_lowercase();
            records
                .iter()
                .filter(|r| {
                    r.field(field)
                        .and_then(Value::as_str)
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                })
                .cloned()
                .collect()
        }
        other => records
            .iter()
            .filter(|r| r.field(field) == Some(other))
            .cloned()
            .collect(),
    }
}

/// Returns the records with `record` appended.
pub fn add(records: &[Record], record: Record) -> Vec<Record> {
    let mut next = records.to_vec();
    next.push(record);
    next
}

/// Returns the records with the one at `index` replaced.
///
/// Panics when `index` is out of range: an index captured before the
/// collection changed indicates a logic bug upstream.
pub fn replace_at(records: &[Record], index: usize, record: Record) -> Vec<Record> {
    assert!(
        index < records.len(),
        "record index {} out of range for collection of length {}",
        index,
        records.len()
    );
    let mut next = records.to_vec();
    next[index] = record;
    next
}

/// Returns the records with the one at `index` removed. Panics when `index`
/// is out of range, for the same reason as [`replace_at`].
pub fn remove_at(records: &[Record], index: usize) -> Vec<Record> {
    assert!(
        index < records.len(),
        "record index {} out of range for collection of length {}",
        index,
        records.len()
    );
    let mut next = records.to_vec();
    next.remove(index);
    next
}

/// Returns the records with the one carrying `id` removed. Removing an
/// unknown id is a no-op returning the input unchanged.
pub fn remove_by_id(records: &[Record], id: &str) -> Vec<Record> {
    match records.iter().position(|r| r.id == id) {
        Some(index) => remove_at(records, index),
        None => records.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: serde_json::Value) -> Record {
        match fields {
            serde_json::Value::Object(map) => Record::new(map),
            _ => unreachable!(),
        }
    }

    fn skills() -> Vec<Record> {
        vec![
            record(json!({"skill": "Go", "learned": false})),
            record(json!({"skill": "awk", "learned": true})),
        ]
    }

    #[test]
    fn test_sort_is_case_sensitive() {
        let sorted = sort_by(&skills(), "skill", SortOrder::Asc);
        assert_eq!(sorted[0].field("skill"), Some(&json!("Go")));
        assert_eq!(sorted[1].field("skill"), Some(&json!("awk")));

        let reversed = sort_by(&skills(), "skill", SortOrder::Desc);
        assert_eq!(reversed[0].field("skill"), Some(&json!("awk")));
    }

    #[test]
    fn test_sort_double_apply_is_stable() {
        let records = vec![
            record(json!({"calories": 420, "meal": "lunch"})),
            record(json!({"calories": 180, "meal": "snack"})),
            record(json!({"calories": 420, "meal": "dinner"})),
        ];
        let once = sort_by(&records, "calories", SortOrder::Asc);
        let twice = sort_by(&once, "calories", SortOrder::Asc);
        assert_eq!(once, twice);
        assert_eq!(once[0].field("meal"), Some(&json!("snack")));
        assert_eq!(once[1].field("meal"), Some(&json!("lunch")));
    }

    #[test]
    fn test_sort_missing_field_first() {
        let records = vec![
            record(json!({"date": "2024-03-01"})),
            record(json!({"title": "undated"})),
        ];
        let sorted = sort_by(&records, "date", SortOrder::Asc);
        assert_eq!(sorted[0].field("title"), Some(&json!("undated")));
    }

    #[test]
    fn test_sort_empty_collection() {
        assert!(sort_by(&[], "anything", SortOrder::Asc).is_empty());
    }

    #[test]
    fn test_filter_empty_value_is_pass_through() {
        let records = skills();
        assert_eq!(filter_by(&records, "skill", &json!("")), records);
        assert_eq!(filter_by(&records, "skill", &Value::Null), records);
    }

    #[test]
    fn test_filter_string_is_substring_case_insensitive() {
        let records = vec![
            record(json!({"title": "Rust in Action"})),
            record(json!({"title": "The Go Programming Language"})),
        ];
        let hits = filter_by(&records, "title", &json!("rust"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].field("title"), Some(&json!("Rust in Action")));
    }

    #[test]
    fn test_filter_bool_is_exact() {
        let hits = filter_by(&skills(), "learned", &json!(true));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].field("skill"), Some(&json!("awk")));
    }

    #[test]
    fn test_filter_ignores_records_without_field() {
        let records = vec![
            record(json!({"task": "Buy milk"})),
            record(json!({"note": "no task here"})),
        ];
        let hits = filter_by(&records, "task", &json!("milk"));
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_filter_idempotent() {
        let records = vec![
            record(json!({"state": "todo", "task": "Buy milk"})),
            record(json!({"state": "done", "task": "Call bank"})),
        ];
        let once = filter_by(&records, "state", &json!("todo"));
        let twice = filter_by(&once, "state", &json!("todo"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_add_then_remove_at_is_inverse() {
        let records = skills();
        let appended = add(&records, record(json!({"skill": "sed", "learned": false})));
        assert_eq!(appended.len(), 3);
        assert_eq!(remove_at(&appended, records.len()), records);
    }

    #[test]
    fn test_replace_at_keeps_neighbors() {
        let records = skills();
        let replacement = record(json!({"skill": "jq", "learned": true}));
        let next = replace_at(&records, 0, replacement.clone());
        assert_eq!(next[0], replacement);
        assert_eq!(next[1], records[1]);
        // the input is untouched
        assert_eq!(records[0].field("skill"), Some(&json!("Go")));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_replace_at_out_of_range_panics() {
        let records = skills();
        replace_at(&records, 2, record(json!({"skill": "m4"})));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_remove_at_out_of_range_panics() {
        remove_at(&[], 0);
    }

    #[test]
    fn test_remove_by_id_is_idempotent() {
        let records = skills();
        let removed = remove_by_id(&records, &records[0].id);
        assert_eq!(removed.len(), 1);
        assert_eq!(remove_by_id(&removed, &records[0].id), removed);
        assert_eq!(remove_by_id(&records, "no-such-id"), records);
    }
}
