/// Unique record identifier assigned upstream (stable across runs).
/// Example: `1440955`
pub type IdentityKey = String;
/// Name of one flat record field.
/// Examples: `fundCode`, `reportName`, `fetched_at`
pub type FieldName = String;
/// String value stored under a record field.
/// Examples: `025587`, `2025-11-27`
pub type FieldValue = String;
/// Identifier for the source that produced a payload.
/// Example: `csrc_advanced_search`
pub type SourceId = String;
/// Identifier for a notification gateway.
/// Example: `smtp_email`
pub type NotifierId = String;
/// Named SMTP provider selector.
/// Examples: `qq`, `gmail`, `163`
pub type ProviderName = String;
