use std::collections::HashSet;
use std::fs;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use fundwatch::constants::fields;
use fundwatch::{merge, CsvStore, Record, WatchError};

fn build_record(pairs: &[(&str, &str)]) -> Record {
    let mut record = Record::new();
    for (name, value) in pairs {
        record.insert(*name, *value);
    }
    record
}

#[test]
fn missing_archive_loads_as_empty_set() {
    let dir = TempDir::new().expect("tempdir");
    let store = CsvStore::new(dir.path().join("missing.csv"));
    assert!(store.load().expect("load").is_empty());
}

#[test]
fn replace_creates_the_containing_directory() {
    let dir = TempDir::new().expect("tempdir");
    let store = CsvStore::new(dir.path().join("nested/deeper/archive.csv"));
    store
        .replace(&[build_record(&[(fields::IDENTITY_KEY, "1")])])
        .expect("replace");
    assert!(store.path().exists());
}

#[test]
fn round_trip_preserves_keys_and_field_values() {
    let dir = TempDir::new().expect("tempdir");
    let store = CsvStore::new(dir.path().join("archive.csv"));
    let records = vec![
        build_record(&[
            (fields::IDENTITY_KEY, "1434582"),
            ("fundCode", "020988"),
            ("fundShortName", "south tech etf feeder"),
            ("remark", "extra, with comma"),
        ]),
        build_record(&[
            (fields::IDENTITY_KEY, "1440955"),
            ("fundCode", "025587"),
            ("reportName", "prospectus \"2025\""),
        ]),
    ];
    store.replace(&records).expect("replace");
    let loaded = store.load().expect("load");

    let written: HashSet<&str> = records.iter().filter_map(Record::identity_key).collect();
    let reloaded: HashSet<&str> = loaded.iter().filter_map(Record::identity_key).collect();
    assert_eq!(written, reloaded);
    assert_eq!(loaded[0].get("remark"), Some("extra, with comma"));
    assert_eq!(loaded[1].get("reportName"), Some("prospectus \"2025\""));
}

#[test]
fn header_puts_core_fields_first_then_observed_fields_lexicographically() {
    let dir = TempDir::new().expect("tempdir");
    let store = CsvStore::new(dir.path().join("archive.csv"));
    store
        .replace(&[build_record(&[
            (fields::IDENTITY_KEY, "1"),
            ("zebra", "z"),
            ("apple", "a"),
        ])])
        .expect("replace");

    let raw = fs::read_to_string(store.path()).expect("raw csv");
    let header = raw.lines().next().expect("header row");
    let expected_core = fields::CORE_FIELDS.join(",");
    assert!(header.starts_with(&expected_core));
    assert!(header.ends_with("apple,zebra"));
}

#[test]
fn replace_is_a_full_rewrite_and_leaves_no_temp_debris() {
    let dir = TempDir::new().expect("tempdir");
    let store = CsvStore::new(dir.path().join("archive.csv"));
    store
        .replace(&[
            build_record(&[(fields::IDENTITY_KEY, "1")]),
            build_record(&[(fields::IDENTITY_KEY, "2")]),
        ])
        .expect("first replace");
    store
        .replace(&[build_record(&[(fields::IDENTITY_KEY, "3")])])
        .expect("second replace");

    let loaded = store.load().expect("load");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].identity_key(), Some("3"));

    let entries: Vec<_> = fs::read_dir(dir.path())
        .expect("read dir")
        .filter_map(Result::ok)
        .map(|entry| entry.file_name())
        .collect();
    assert_eq!(entries, ["archive.csv"]);
}

#[test]
fn merged_set_survives_persist_and_reload() {
    let dir = TempDir::new().expect("tempdir");
    let store = CsvStore::new(dir.path().join("archive.csv"));
    let stamp = Utc.with_ymd_and_hms(2025, 11, 27, 12, 0, 0).unwrap();

    let incoming = vec![
        build_record(&[(fields::IDENTITY_KEY, "200"), ("fundCode", "B")]),
        build_record(&[(fields::IDENTITY_KEY, "100"), ("fundCode", "A")]),
    ];
    let first = merge(Vec::new(), incoming, stamp);
    store.replace(&first.updated).expect("replace");

    let reloaded = store.load().expect("load");
    let second = merge(
        reloaded,
        vec![build_record(&[
            (fields::IDENTITY_KEY, "100"),
            ("fundCode", "A"),
        ])],
        stamp,
    );
    assert!(second.delta.is_empty());
    let keys: Vec<&str> = second
        .updated
        .iter()
        .filter_map(Record::identity_key)
        .collect();
    assert_eq!(keys, ["100", "200"]);
}

#[test]
fn unreadable_archive_surfaces_a_store_read_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("archive.csv");
    // row width disagrees with the header
    fs::write(&path, "uploadInfoDetailId,fundCode\n1,A,EXTRA\n").expect("write");
    let store = CsvStore::new(&path);
    assert!(matches!(store.load(), Err(WatchError::StoreRead(_))));
}
