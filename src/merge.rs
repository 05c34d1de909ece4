//! Delta merge engine: the incremental synchronization core.
//!
//! Pure computation, no I/O. Existing records are immutable once
//! persisted: an incoming record whose key is already known is not new
//! and never overwrites the stored fields.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::constants::fields;
use crate::record::Record;
use crate::types::IdentityKey;

/// Result of merging an incoming batch against the persisted set.
#[derive(Clone, Debug, Default)]
pub struct MergeOutcome {
    /// Full merged record set, sorted by identity key.
    pub updated: Vec<Record>,
    /// Records never seen before, stamped with `fetched_at`.
    pub delta: Vec<Record>,
    /// Incoming records dropped for lacking an identity key.
    pub dropped: usize,
}

/// Merge `incoming` against `existing`, returning the updated set and
/// the truly-new delta.
///
/// Within each side, later records win duplicate keys before comparison
/// (the persisted set should never contain duplicates, but the merge
/// tolerates them). Delta records are stamped with `stamp` in
/// `fetched_at`; existing records pass through unchanged.
pub fn merge(existing: Vec<Record>, incoming: Vec<Record>, stamp: DateTime<Utc>) -> MergeOutcome {
    let existing_by_key = index_by_key(existing, &mut 0);
    let mut dropped = 0;
    let incoming_by_key = index_by_key(incoming, &mut dropped);

    let existing_keys: HashSet<&IdentityKey> = existing_by_key.keys().collect();
    let stamp_text = stamp.format(fields::FETCHED_AT_FMT).to_string();

    let mut delta: Vec<Record> = Vec::new();
    for (key, mut record) in incoming_by_key {
        if existing_keys.contains(&key) {
            continue;
        }
        record.insert(fields::FETCHED_AT, stamp_text.clone());
        delta.push(record);
    }

    let mut updated: Vec<Record> = existing_by_key.into_values().collect();
    updated.extend(delta.iter().cloned());
    updated.sort_by(|a, b| {
        key_order(
            a.identity_key().unwrap_or_default(),
            b.identity_key().unwrap_or_default(),
        )
    });

    debug!(
        new = delta.len(),
        total = updated.len(),
        dropped,
        "merge computed delta"
    );
    MergeOutcome {
        updated,
        delta,
        dropped,
    }
}

/// Order identity keys numerically, falling back for non-numeric keys.
///
/// Numeric keys sort before non-numeric ones, which compare
/// lexicographically among themselves; the comparator is total and
/// never panics on mixed key sets.
pub fn key_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Index records by identity key, dropping keyless records and letting
/// later duplicates win.
fn index_by_key(records: Vec<Record>, dropped: &mut usize) -> IndexMap<IdentityKey, Record> {
    let mut indexed = IndexMap::with_capacity(records.len());
    for record in records {
        match record.identity_key() {
            Some(key) => {
                indexed.insert(key.to_string(), record);
            }
            None => {
                warn!(fields = record.len(), "dropping record without identity key");
                *dropped += 1;
            }
        }
    }
    indexed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 27, 10, 0, 0).unwrap()
    }

    fn record(key: &str, code: &str) -> Record {
        [
            (fields::IDENTITY_KEY.to_string(), key.to_string()),
            ("fundCode".to_string(), code.to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn known_keys_are_not_new_and_never_overwrite() {
        let existing = vec![record("100", "A")];
        let incoming = vec![record("100", "CHANGED"), record("200", "B")];
        let outcome = merge(existing, incoming, stamp());

        assert_eq!(outcome.delta.len(), 1);
        assert_eq!(outcome.delta[0].identity_key(), Some("200"));
        assert_eq!(outcome.updated.len(), 2);
        // first write wins: the stored fields survive a re-fetch
        assert_eq!(outcome.updated[0].get("fundCode"), Some("A"));
        assert_eq!(outcome.updated[1].get("fundCode"), Some("B"));
    }

    #[test]
    fn delta_records_are_stamped_existing_pass_through() {
        let outcome = merge(vec![record("1", "A")], vec![record("2", "B")], stamp());
        assert_eq!(outcome.updated[0].get(fields::FETCHED_AT), None);
        assert_eq!(
            outcome.delta[0].get(fields::FETCHED_AT),
            Some("2025-11-27 10:00:00")
        );
    }

    #[test]
    fn later_incoming_duplicates_win_before_comparison() {
        let incoming = vec![record("5", "first"), record("5", "second")];
        let outcome = merge(Vec::new(), incoming, stamp());
        assert_eq!(outcome.delta.len(), 1);
        assert_eq!(outcome.delta[0].get("fundCode"), Some("second"));
    }

    #[test]
    fn keyless_records_are_dropped_and_counted() {
        let mut keyless = Record::new();
        keyless.insert("fundCode", "X");
        let outcome = merge(Vec::new(), vec![keyless, record("3", "C")], stamp());
        assert_eq!(outcome.dropped, 1);
        assert_eq!(outcome.delta.len(), 1);
        assert_eq!(outcome.updated.len(), 1);
    }

    #[test]
    fn updated_is_sorted_numerically_with_lexicographic_fallback() {
        let incoming = vec![
            record("10", "a"),
            record("9", "b"),
            record("beta", "c"),
            record("alpha", "d"),
            record("100", "e"),
        ];
        let outcome = merge(Vec::new(), incoming, stamp());
        let keys: Vec<&str> = outcome
            .updated
            .iter()
            .filter_map(Record::identity_key)
            .collect();
        assert_eq!(keys, ["9", "10", "100", "alpha", "beta"]);
    }

    #[test]
    fn key_order_is_total_over_mixed_keys() {
        assert_eq!(key_order("9", "10"), Ordering::Less);
        assert_eq!(key_order("10", "1a"), Ordering::Less);
        assert_eq!(key_order("1a", "9"), Ordering::Greater);
    }
}
