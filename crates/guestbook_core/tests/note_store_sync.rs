use guestbook_core::{FeedEvent, NoteStore, RawRecord, RecordParseError, StoreChange};
use serde_json::json;
use std::collections::HashSet;

fn added(key: &str, text: &str, timestamp: i64) -> FeedEvent {
    FeedEvent::Added(RawRecord::new(
        key,
        json!({"userId": "u1", "text": text, "timestamp": timestamp}),
    ))
}

fn ids(store: &NoteStore) -> Vec<&str> {
    store.snapshot().iter().map(|note| note.id.as_str()).collect()
}

fn assert_sorted_and_unique(store: &NoteStore) {
    let notes = store.snapshot();
    assert!(notes
        .windows(2)
        .all(|pair| pair[0].created_at_ms <= pair[1].created_at_ms));
    let unique: HashSet<&str> = notes.iter().map(|note| note.id.as_str()).collect();
    assert_eq!(unique.len(), notes.len());
}

#[test]
fn out_of_order_adds_are_sorted_by_timestamp() {
    let mut store = NoteStore::new();
    store.apply(added("c", "third", 300));
    store.apply(added("a", "first", 100));
    store.apply(added("b", "second", 200));
    assert_eq!(ids(&store), vec!["a", "b", "c"]);
}

#[test]
fn equal_timestamps_keep_arrival_order() {
    let mut store = NoteStore::new();
    store.apply(added("x", "one", 100));
    store.apply(added("y", "two", 100));
    store.apply(added("z", "three", 100));
    assert_eq!(ids(&store), vec!["x", "y", "z"]);
}

#[test]
fn duplicate_add_is_idempotent() {
    let mut store = NoteStore::new();
    assert_eq!(
        store.apply(added("a", "first", 100)),
        StoreChange::Inserted {
            index: 0,
            previous_len: 0
        }
    );
    assert_eq!(store.apply(added("a", "replayed", 999)), StoreChange::Ignored);
    assert_eq!(store.len(), 1);
    assert_eq!(store.snapshot()[0].body, "first");
}

#[test]
fn change_replaces_and_resorts() {
    let mut store = NoteStore::new();
    store.apply(added("a", "first", 100));
    store.apply(added("b", "second", 200));

    let change = store.apply(FeedEvent::Changed(RawRecord::new(
        "a",
        json!({"userId": "u1", "text": "edited", "timestamp": 300}),
    )));
    assert_eq!(change, StoreChange::Updated { id: "a".to_string() });
    assert_eq!(ids(&store), vec!["b", "a"]);
    assert_eq!(store.snapshot()[1].body, "edited");
}

#[test]
fn change_for_unknown_id_is_ignored() {
    let mut store = NoteStore::new();
    let change = store.apply(FeedEvent::Changed(RawRecord::new("ghost", json!({}))));
    assert_eq!(change, StoreChange::Ignored);
    assert!(store.is_empty());
}

#[test]
fn remove_drops_note_and_unknown_remove_is_ignored() {
    let mut store = NoteStore::new();
    store.apply(added("a", "first", 100));
    store.apply(added("b", "second", 200));

    assert_eq!(
        store.apply(FeedEvent::Removed {
            key: "a".to_string()
        }),
        StoreChange::Removed { id: "a".to_string() }
    );
    assert!(!store.contains("a"));
    assert_eq!(
        store.apply(FeedEvent::Removed {
            key: "a".to_string()
        }),
        StoreChange::Ignored
    );
    assert_eq!(ids(&store), vec!["b"]);
}

#[test]
fn removed_id_can_be_added_again() {
    let mut store = NoteStore::new();
    store.apply(added("a", "first", 100));
    store.apply(FeedEvent::Removed {
        key: "a".to_string(),
    });
    assert!(store.apply(added("a", "back", 50)).is_mutation());
    assert_eq!(store.snapshot()[0].body, "back");
}

#[test]
fn missing_fields_take_defaults() {
    let mut store = NoteStore::new();
    store.apply(FeedEvent::Added(RawRecord::new("bare", json!({}))));
    let note = &store.snapshot()[0];
    assert_eq!(note.author_id, "anon");
    assert_eq!(note.body, "");
    assert_eq!(note.created_at_ms, 0);
}

#[test]
fn float_timestamp_is_normalized() {
    let mut store = NoteStore::new();
    store.apply(FeedEvent::Added(RawRecord::new(
        "f",
        json!({"text": "float", "timestamp": 1_700_000_000_000.0_f64}),
    )));
    assert_eq!(store.snapshot()[0].created_at_ms, 1_700_000_000_000);
}

#[test]
fn malformed_records_are_rejected_without_mutation() {
    let mut store = NoteStore::new();
    assert_eq!(
        store.apply(FeedEvent::Added(RawRecord::new("", json!({})))),
        StoreChange::Rejected(RecordParseError::MissingKey)
    );
    assert_eq!(
        store.apply(FeedEvent::Added(RawRecord::new("s", json!("scalar")))),
        StoreChange::Rejected(RecordParseError::NotAnObject {
            key: "s".to_string()
        })
    );
    assert_eq!(
        store.apply(FeedEvent::Error {
            message: "permission denied".to_string()
        }),
        StoreChange::FeedError
    );
    assert!(store.is_empty());
}

#[test]
fn mixed_event_sequence_keeps_order_and_uniqueness() {
    let mut store = NoteStore::new();
    let mut seed: u64 = 0x5eed;
    for _ in 0..500 {
        seed = seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let key = format!("k{}", (seed >> 33) % 40);
        let timestamp = ((seed >> 17) % 1_000) as i64;
        let event = match (seed >> 7) % 4 {
            0 | 1 => added(&key, "body", timestamp),
            2 => FeedEvent::Changed(RawRecord::new(
                key,
                json!({"text": "changed", "timestamp": timestamp}),
            )),
            _ => FeedEvent::Removed { key },
        };
        store.apply(event);
        assert_sorted_and_unique(&store);
    }
}

#[test]
fn padded_key_is_matched_verbatim_by_change_and_remove() {
    let mut store = NoteStore::new();
    store.apply(added(" k1 ", "first", 100));
    assert_eq!(
        store.apply(FeedEvent::Changed(RawRecord::new(
            " k1 ",
            json!({"text": "edited", "timestamp": 100}),
        ))),
        StoreChange::Updated {
            id: " k1 ".to_string()
        }
    );
    assert_eq!(
        store.apply(FeedEvent::Removed {
            key: " k1 ".to_string()
        }),
        StoreChange::Removed {
            id: " k1 ".to_string()
        }
    );
    assert!(store.is_empty());
}
