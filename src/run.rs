//! Run orchestration: one watch cycle and the polling loop.
//!
//! Failure policy per stage: fetch failure aborts the run with no store
//! mutation; a malformed payload is zero new records; a store read
//! failure degrades to an empty baseline with a warning; a store write
//! failure aborts the run; a notify failure is logged and swallowed.
//! The store has no locking discipline; one watcher process per
//! archive is assumed.

use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::errors::WatchError;
use crate::fetch::DisclosureSource;
use crate::merge::merge;
use crate::normalize::normalize;
use crate::notify::Notifier;
use crate::store::CsvStore;

/// Counters describing one completed run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records produced by normalization.
    pub fetched: usize,
    /// Truly-new records persisted this run.
    pub new_records: usize,
    /// Archive size after the merge.
    pub total: usize,
    /// Incoming records dropped for lacking an identity key.
    pub dropped: usize,
    /// Whether a notification was delivered.
    pub notified: bool,
}

/// Execute one fetch → normalize → merge → persist → notify cycle.
///
/// A first run against an empty archive persists everything as new and
/// notifies the full set; callers not wanting that flood can inspect
/// the summary counters and gate their notifier accordingly.
pub fn run_once(
    source: &dyn DisclosureSource,
    store: &CsvStore,
    notifier: Option<&dyn Notifier>,
) -> Result<RunSummary, WatchError> {
    let payload = source.fetch()?;
    let now = Utc::now();
    let incoming = normalize(payload, now);
    let fetched = incoming.len();
    info!(source = source.id(), fetched, "payload normalized");

    // Lenient baseline: a transiently unreadable archive is treated as
    // empty, at the cost of a possible everything-is-new notification.
    let existing = match store.load() {
        Ok(existing) => existing,
        Err(err) => {
            warn!(%err, "archive unreadable, merging against empty baseline");
            Vec::new()
        }
    };

    let outcome = merge(existing, incoming, now);
    let mut summary = RunSummary {
        fetched,
        new_records: outcome.delta.len(),
        total: outcome.updated.len(),
        dropped: outcome.dropped,
        notified: false,
    };

    if outcome.delta.is_empty() {
        info!(total = outcome.updated.len(), "no new filings; archive untouched");
        return Ok(summary);
    }

    store.replace(&outcome.updated)?;
    info!(
        new = outcome.delta.len(),
        total = outcome.updated.len(),
        "archive committed"
    );

    // The write above is already committed; a notify failure must not
    // roll it back, and there is no redelivery on the next run.
    if let Some(notifier) = notifier {
        match notifier.notify(&outcome.delta) {
            Ok(()) => summary.notified = true,
            Err(err) => warn!(%err, "notification failed; continuing"),
        }
    }
    Ok(summary)
}

/// Repeat [`run_once`] forever at `interval`, logging each outcome.
/// Per-run failures never stop the loop.
pub fn run_forever(
    source: &dyn DisclosureSource,
    store: &CsvStore,
    notifier: Option<&dyn Notifier>,
    interval: Duration,
) {
    info!(interval_secs = interval.as_secs(), "entering scheduled mode");
    loop {
        match run_once(source, store, notifier) {
            Ok(summary) => info!(
                new = summary.new_records,
                total = summary.total,
                notified = summary.notified,
                "run complete"
            ),
            Err(err) => error!(%err, "run failed"),
        }
        thread::sleep(interval);
    }
}
