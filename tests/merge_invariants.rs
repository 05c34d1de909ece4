use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};

use fundwatch::constants::fields;
use fundwatch::merge::key_order;
use fundwatch::{merge, Record};

fn stamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 27, 12, 0, 0).unwrap()
}

fn build_record(key: &str, code: &str) -> Record {
    let mut record = Record::new();
    record.insert(fields::IDENTITY_KEY, key);
    record.insert("fundCode", code);
    record
}

fn keys(records: &[Record]) -> Vec<&str> {
    records.iter().filter_map(Record::identity_key).collect()
}

#[test]
fn delta_cardinality_is_key_set_difference() {
    let existing = vec![build_record("100", "A"), build_record("300", "C")];
    let incoming = vec![
        build_record("100", "A"),
        build_record("200", "B"),
        build_record("400", "D"),
    ];
    let outcome = merge(existing, incoming, stamp());

    let existing_keys: HashSet<&str> = ["100", "300"].into();
    let incoming_keys: HashSet<&str> = ["100", "200", "400"].into();
    assert_eq!(
        outcome.delta.len(),
        incoming_keys.difference(&existing_keys).count()
    );
}

#[test]
fn merging_empty_incoming_is_a_no_op() {
    let existing = vec![build_record("100", "A"), build_record("200", "B")];
    let outcome = merge(existing.clone(), Vec::new(), stamp());
    assert!(outcome.delta.is_empty());
    assert_eq!(outcome.updated, existing);
}

#[test]
fn first_run_against_empty_archive_is_a_full_delta() {
    let incoming = vec![build_record("2", "B"), build_record("1", "A")];
    let outcome = merge(Vec::new(), incoming, stamp());
    assert_eq!(outcome.delta.len(), 2);
    let mut delta_keys = keys(&outcome.delta);
    delta_keys.sort();
    assert_eq!(keys(&outcome.updated), delta_keys);
    assert!(outcome
        .delta
        .iter()
        .all(|record| record.get(fields::FETCHED_AT) == Some("2025-11-27 12:00:00")));
}

#[test]
fn remerging_the_same_incoming_set_yields_no_delta() {
    let incoming = vec![build_record("10", "A"), build_record("20", "B")];
    let first = merge(Vec::new(), incoming.clone(), stamp());
    let second = merge(first.updated.clone(), incoming, stamp());
    assert!(second.delta.is_empty());
    assert_eq!(keys(&second.updated), keys(&first.updated));
}

#[test]
fn keyless_records_appear_nowhere() {
    let mut keyless = Record::new();
    keyless.insert("fundCode", "ghost");
    let outcome = merge(Vec::new(), vec![keyless, build_record("7", "G")], stamp());
    assert_eq!(outcome.dropped, 1);
    assert_eq!(keys(&outcome.updated), ["7"]);
    assert_eq!(keys(&outcome.delta), ["7"]);
}

#[test]
fn updated_is_sorted_ascending_by_numeric_key() {
    let incoming = vec![
        build_record("1434582", "a"),
        build_record("99", "b"),
        build_record("1440955", "c"),
    ];
    let outcome = merge(Vec::new(), incoming, stamp());
    assert_eq!(keys(&outcome.updated), ["99", "1434582", "1440955"]);
    assert!(outcome
        .updated
        .windows(2)
        .all(|pair| key_order(
            pair[0].identity_key().unwrap(),
            pair[1].identity_key().unwrap()
        )
        .is_lt()));
}

#[test]
fn refetched_known_record_is_not_new_and_keeps_stored_fields() {
    let existing = vec![build_record("100", "A")];
    let incoming = vec![build_record("100", "A"), build_record("200", "B")];
    let outcome = merge(existing, incoming, stamp());

    assert_eq!(keys(&outcome.delta), ["200"]);
    assert_eq!(outcome.delta[0].get("fundCode"), Some("B"));
    assert!(outcome.delta[0].get(fields::FETCHED_AT).is_some());
    assert_eq!(keys(&outcome.updated), ["100", "200"]);
    // the stored record never gains a stamp retroactively
    assert_eq!(outcome.updated[0].get(fields::FETCHED_AT), None);
}
