//! Persisted CSV store for the filing archive.
//!
//! The store holds every record ever seen, one CSV row per record, with
//! a fixed header contract: core fields first in a fixed order, then
//! all other observed fields lexicographically. Writes replace the
//! whole file through a temp-file-and-rename so a crash mid-write
//! leaves the previous archive intact.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::constants::fields;
use crate::errors::WatchError;
use crate::record::Record;
use crate::types::FieldName;

/// Reader/writer for the persisted filing archive.
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    /// Create a store over `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the archive file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted set. A missing file is an empty set, not an
    /// error.
    pub fn load(&self) -> Result<Vec<Record>, WatchError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no persisted archive yet");
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)
            .map_err(|err| WatchError::StoreRead(err.to_string()))?;
        let headers = reader
            .headers()
            .map_err(|err| WatchError::StoreRead(err.to_string()))?
            .clone();
        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|err| WatchError::StoreRead(err.to_string()))?;
            let record: Record = headers
                .iter()
                .zip(row.iter())
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();
            records.push(record);
        }
        debug!(
            path = %self.path.display(),
            records = records.len(),
            "loaded persisted archive"
        );
        Ok(records)
    }

    /// Replace the archive with `records`, atomically.
    ///
    /// The new content is serialized to a temporary file in the target
    /// directory and renamed over the archive, creating the directory
    /// when absent.
    pub fn replace(&self, records: &[Record]) -> Result<(), WatchError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|err| WatchError::StoreWrite(err.to_string()))?;

        let header = field_order(records);
        let temp =
            NamedTempFile::new_in(dir).map_err(|err| WatchError::StoreWrite(err.to_string()))?;
        {
            let mut writer = csv::Writer::from_writer(temp.as_file());
            writer
                .write_record(&header)
                .map_err(|err| WatchError::StoreWrite(err.to_string()))?;
            for record in records {
                let row: Vec<&str> = header
                    .iter()
                    .map(|name| record.get(name).unwrap_or_default())
                    .collect();
                writer
                    .write_record(&row)
                    .map_err(|err| WatchError::StoreWrite(err.to_string()))?;
            }
            writer
                .flush()
                .map_err(|err| WatchError::StoreWrite(err.to_string()))?;
        }
        temp.persist(&self.path)
            .map_err(|err| WatchError::StoreWrite(err.to_string()))?;
        info!(
            path = %self.path.display(),
            records = records.len(),
            "archive replaced"
        );
        Ok(())
    }
}

/// Compute the header for a record set: core fields first in fixed
/// order, then every other observed field lexicographically.
pub fn field_order(records: &[Record]) -> Vec<FieldName> {
    let mut other: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        for (name, _) in record.fields() {
            if !fields::CORE_FIELDS.contains(&name.as_str()) {
                other.insert(name.as_str());
            }
        }
    }
    fields::CORE_FIELDS
        .iter()
        .map(|name| name.to_string())
        .chain(other.into_iter().map(|name| name.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn field_order_puts_core_fields_first_then_lexicographic() {
        let records = vec![
            record(&[("uploadInfoDetailId", "1"), ("zeta", "z")]),
            record(&[("uploadInfoDetailId", "2"), ("alpha", "a")]),
        ];
        let header = field_order(&records);
        assert_eq!(header[0], fields::IDENTITY_KEY);
        assert_eq!(header[8], fields::FETCHED_AT);
        assert_eq!(&header[9..], ["alpha", "zeta"]);
    }

    #[test]
    fn field_order_is_stable_for_empty_sets() {
        assert_eq!(field_order(&[]).len(), fields::CORE_FIELDS.len());
    }
}
