use std::io;

use thiserror::Error;

use crate::types::{NotifierId, SourceId};

/// Error type for fetch, store, notification, and configuration failures.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("disclosure source '{source_id}' fetch failed: {reason}")]
    Fetch { source_id: SourceId, reason: String },
    #[error("persisted store read failure: {0}")]
    StoreRead(String),
    #[error("persisted store write failure: {0}")]
    StoreWrite(String),
    #[error("notifier '{notifier_id}' failed: {reason}")]
    Notify {
        notifier_id: NotifierId,
        reason: String,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("configuration error: {0}")]
    Configuration(String),
}
