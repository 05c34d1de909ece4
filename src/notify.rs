//! Notification gateway interface and the SMTP email implementation.
//!
//! The run layer invokes a notifier only for non-empty deltas and
//! swallows failures: notification is best-effort, at-most-once, with
//! no redelivery queue. A failed send is logged and that notification
//! is gone for good.

use std::env;

use chrono::Utc;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, info};

use crate::constants::fields;
use crate::constants::notify as consts;
use crate::errors::WatchError;
use crate::record::Record;
use crate::types::ProviderName;

/// Run-facing notification gateway invoked with the merge delta.
pub trait Notifier: Send + Sync {
    /// Stable notifier identifier used in errors and logs.
    fn id(&self) -> &str;
    /// Deliver a notification describing `delta`.
    fn notify(&self, delta: &[Record]) -> Result<(), WatchError>;
}

/// Explicit SMTP configuration for the email notifier.
///
/// Environment reads happen only in [`EmailConfig::from_env`]; core
/// logic never touches the process environment.
#[derive(Clone, Debug)]
pub struct EmailConfig {
    /// Sender address, also the login account.
    pub sender: String,
    /// Authorization code or app password for the sender account.
    pub credential: String,
    /// Named SMTP provider selecting the relay host and port.
    pub provider: ProviderName,
    /// Recipient addresses; empty means send to the sender.
    pub recipients: Vec<String>,
}

impl EmailConfig {
    /// Create a config with the default provider and self-delivery.
    pub fn new(sender: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            credential: credential.into(),
            provider: consts::DEFAULT_PROVIDER.to_string(),
            recipients: Vec::new(),
        }
    }

    /// Select an SMTP provider by name.
    pub fn with_provider(mut self, provider: impl Into<ProviderName>) -> Self {
        self.provider = provider.into().to_lowercase();
        self
    }

    /// Override the recipient list.
    pub fn with_recipients(mut self, recipients: Vec<String>) -> Self {
        self.recipients = recipients;
        self
    }

    /// Build a config from `EMAIL_ADDRESS`, `EMAIL_PASSWORD`,
    /// `EMAIL_PROVIDER`, and `EMAIL_RECIPIENTS`.
    ///
    /// Returns `None` when the address or credential is unset, which
    /// disables email without failing the run.
    pub fn from_env() -> Option<Self> {
        let sender = env::var(consts::ENV_SENDER).ok().filter(|s| !s.is_empty())?;
        let credential = env::var(consts::ENV_CREDENTIAL)
            .ok()
            .filter(|s| !s.is_empty())?;
        let mut config = Self::new(sender, credential);
        if let Ok(provider) = env::var(consts::ENV_PROVIDER) {
            config = config.with_provider(provider);
        }
        if let Ok(recipients) = env::var(consts::ENV_RECIPIENTS) {
            let recipients: Vec<String> = recipients
                .split(',')
                .map(str::trim)
                .filter(|address| !address.is_empty())
                .map(str::to_string)
                .collect();
            config = config.with_recipients(recipients);
        }
        Some(config)
    }

    /// Effective recipient list (the sender when none are configured).
    pub fn recipient_list(&self) -> Vec<&str> {
        if self.recipients.is_empty() {
            vec![self.sender.as_str()]
        } else {
            self.recipients.iter().map(String::as_str).collect()
        }
    }
}

/// Resolve a provider name to its SMTP relay host and port.
/// Unknown names fall back to the default provider.
pub fn smtp_relay(provider: &str) -> (&'static str, u16) {
    let lookup = |name: &str| {
        consts::PROVIDER_RELAYS
            .iter()
            .find(|(candidate, _, _)| *candidate == name)
            .map(|(_, host, port)| (*host, *port))
    };
    lookup(provider).unwrap_or_else(|| {
        lookup(consts::DEFAULT_PROVIDER).expect("default provider present in relay table")
    })
}

/// SMTP email notifier for new filing deltas.
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    /// Create a notifier over an explicit configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn error(&self, reason: impl Into<String>) -> WatchError {
        WatchError::Notify {
            notifier_id: self.id().to_string(),
            reason: reason.into(),
        }
    }

    fn transport(&self) -> Result<SmtpTransport, WatchError> {
        let (host, port) = smtp_relay(&self.config.provider);
        // Port 465 speaks implicit TLS; submission ports use STARTTLS.
        let builder = if port == 465 {
            SmtpTransport::relay(host)
        } else {
            SmtpTransport::starttls_relay(host)
        }
        .map_err(|err| self.error(err.to_string()))?;
        Ok(builder
            .port(port)
            .credentials(Credentials::new(
                self.config.sender.clone(),
                self.config.credential.clone(),
            ))
            .build())
    }

    fn compose(&self, delta: &[Record]) -> Result<Message, WatchError> {
        let sender: Mailbox = self
            .config
            .sender
            .parse()
            .map_err(|_| self.error(format!("invalid sender address '{}'", self.config.sender)))?;
        let mut builder = Message::builder().from(sender);
        for recipient in self.config.recipient_list() {
            let mailbox: Mailbox = recipient
                .parse()
                .map_err(|_| self.error(format!("invalid recipient address '{recipient}'")))?;
            builder = builder.to(mailbox);
        }
        builder
            .subject(subject(delta))
            .multipart(MultiPart::alternative_plain_html(
                text_body(delta),
                html_body(delta),
            ))
            .map_err(|err| self.error(err.to_string()))
    }
}

impl Notifier for EmailNotifier {
    fn id(&self) -> &str {
        consts::NOTIFIER_ID
    }

    fn notify(&self, delta: &[Record]) -> Result<(), WatchError> {
        debug!(notifier = self.id(), filings = delta.len(), "composing notification");
        let message = self.compose(delta)?;
        let transport = self.transport()?;
        transport
            .send(&message)
            .map_err(|err| self.error(err.to_string()))?;
        info!(
            notifier = self.id(),
            recipients = self.config.recipient_list().len(),
            filings = delta.len(),
            "notification sent"
        );
        Ok(())
    }
}

fn subject(delta: &[Record]) -> String {
    format!(
        "[QDII Fund Watch] {} - {} new filings",
        Utc::now().format(fields::DATE_FMT),
        delta.len()
    )
}

fn field_or_na<'a>(record: &'a Record, name: &str) -> &'a str {
    record.get(name).filter(|value| !value.is_empty()).unwrap_or("N/A")
}

fn text_body(delta: &[Record]) -> String {
    let mut body = format!(
        "QDII fund disclosure update\n\n{} new filings:\n",
        delta.len()
    );
    for (index, record) in delta.iter().enumerate() {
        body.push_str(&format!(
            "\n{}. fund code: {}\n   fund name: {}\n   report: {}\n   \
             organization: {}\n   upload date: {}\n   report date: {}\n",
            index + 1,
            field_or_na(record, "fundCode"),
            field_or_na(record, "fundShortName"),
            field_or_na(record, "reportName"),
            field_or_na(record, "organName"),
            field_or_na(record, fields::UPLOAD_DATE),
            field_or_na(record, "reportSendDate"),
        ));
    }
    body.push_str(&format!(
        "\nFetched at {}\n",
        Utc::now().format(fields::FETCHED_AT_FMT)
    ));
    body
}

fn html_body(delta: &[Record]) -> String {
    let mut rows = String::new();
    for record in delta {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            field_or_na(record, "fundCode"),
            field_or_na(record, "fundShortName"),
            field_or_na(record, "reportName"),
            field_or_na(record, "organName"),
            field_or_na(record, fields::UPLOAD_DATE),
            field_or_na(record, "reportSendDate"),
        ));
    }
    format!(
        "<html><body><h2>QDII fund disclosure update</h2>\
         <p>{} new filings, fetched at {}.</p>\
         <table border=\"1\" cellpadding=\"6\" cellspacing=\"0\">\
         <tr><th>Code</th><th>Name</th><th>Report</th>\
         <th>Organization</th><th>Upload date</th><th>Report date</th></tr>\
         {rows}</table></body></html>",
        delta.len(),
        Utc::now().format(fields::FETCHED_AT_FMT)
    )
}
