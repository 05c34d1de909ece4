//! Normalization of raw fetch payloads into flat records.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::constants::{fetch, fields};
use crate::record::{flatten_value, RawPayload, Record};

/// Convert one raw payload into a sequence of flat records.
///
/// Pure transform: shape problems are logged and skipped, never raised.
/// `fetched` supplies the timestamp embedded in synthetic identity keys
/// and the upload date synthesized for tabular rows, which carry
/// neither.
pub fn normalize(payload: RawPayload, fetched: DateTime<Utc>) -> Vec<Record> {
    match payload {
        RawPayload::Tabular(rows) => {
            debug!(rows = rows.len(), "normalizing tabular payload");
            rows.iter()
                .enumerate()
                .filter_map(|(index, row)| tabular_record(index, row, fetched))
                .collect()
        }
        RawPayload::Wrapped(items) => {
            debug!(items = items.len(), "normalizing wrapped payload");
            items
                .iter()
                .filter_map(|item| match item.as_object() {
                    Some(object) => Some(Record::from_object(object)),
                    None => {
                        warn!(?item, "skipping non-object entry in wrapped payload");
                        None
                    }
                })
                .collect()
        }
        RawPayload::Single(object) => vec![Record::from_object(&object)],
        RawPayload::Opaque(text) => {
            warn!(
                length = text.len(),
                "opaque payload yields no records; refusing to guess-parse"
            );
            Vec::new()
        }
    }
}

/// Map one fixed-width row to named fields positionally.
///
/// The first six columns map to the advanced-search column order; extra
/// columns are retained by index. Rows narrower than six columns carry
/// no usable filing and are skipped.
fn tabular_record(
    index: usize,
    row: &[serde_json::Value],
    fetched: DateTime<Utc>,
) -> Option<Record> {
    if row.len() < fetch::MIN_TABULAR_COLUMNS {
        warn!(index, columns = row.len(), "skipping short tabular row");
        return None;
    }
    let mut record = Record::new();
    for (column, value) in row.iter().enumerate() {
        match fields::TABULAR_COLUMNS.get(column) {
            Some(name) => record.insert(*name, flatten_value(value)),
            None => record.insert(
                format!("{}{column}", fields::EXTRA_COLUMN_PREFIX),
                flatten_value(value),
            ),
        }
    }
    // Rows from the direct search API do not carry the canonical
    // upload-detail id, so the key is synthesized from position and
    // fetch time.
    record.insert(
        fields::IDENTITY_KEY,
        format!(
            "{}_{index}_{}",
            fields::SYNTHETIC_ID_PREFIX,
            fetched.timestamp()
        ),
    );
    record.insert(
        fields::UPLOAD_DATE,
        fetched.format(fields::DATE_FMT).to_string(),
    );
    Some(record)
}
