#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Centralized constants used across fetching, merging, and storage.
pub mod constants;
mod errors;
/// Disclosure source trait and the CSRC advanced-search client.
pub mod fetch;
/// Delta merge engine (the incremental synchronization core).
pub mod merge;
/// Raw payload normalization into flat records.
pub mod normalize;
/// Notification gateway trait and SMTP email implementation.
pub mod notify;
/// Flat record model and raw payload classification.
pub mod record;
/// Run orchestration and the polling loop.
pub mod run;
/// Persisted CSV store for the filing archive.
pub mod store;
/// Shared type aliases.
pub mod types;

pub use errors::WatchError;
pub use fetch::{CsrcSearchClient, CsrcSearchConfig, DisclosureSource};
pub use merge::{merge, MergeOutcome};
pub use normalize::normalize;
pub use notify::{EmailConfig, EmailNotifier, Notifier};
pub use record::{RawPayload, Record};
pub use run::{run_forever, run_once, RunSummary};
pub use store::CsvStore;
pub use types::{FieldName, FieldValue, IdentityKey, NotifierId, ProviderName, SourceId};
