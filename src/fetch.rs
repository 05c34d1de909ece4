//! Disclosure source interface and the CSRC advanced-search client.
//!
//! Ownership model:
//! - `DisclosureSource` is the run-facing interface that produces one
//!   raw payload per fetch.
//! - `CsrcSearchClient` implements it against the advanced-search API
//!   with browser-like request headers. Anti-bot evasion beyond plain
//!   headers (sessions, headless browsers) is out of scope; such a
//!   fetcher would be another implementor of the same trait.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use serde_json::{json, Value};
use tracing::debug;

use crate::constants::fetch as consts;
use crate::constants::fields;
use crate::errors::WatchError;
use crate::record::RawPayload;

/// Run-facing source of raw disclosure payloads.
pub trait DisclosureSource: Send + Sync {
    /// Stable source identifier used in errors and logs.
    fn id(&self) -> &str;
    /// Fetch one raw payload covering the source's current window.
    fn fetch(&self) -> Result<RawPayload, WatchError>;
}

/// Configuration for the CSRC advanced-search client.
#[derive(Clone, Debug)]
pub struct CsrcSearchConfig {
    /// Advanced-search endpoint URL.
    pub base_url: String,
    /// Fund-type filter (QDII by default).
    pub fund_type: String,
    /// Report-type filter (prospectus filings by default).
    pub report_type: String,
    /// Days of upload-date history requested per fetch.
    pub window_days: i64,
    /// Rows requested per fetch.
    pub page_size: u32,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for CsrcSearchConfig {
    fn default() -> Self {
        Self {
            base_url: consts::DEFAULT_BASE_URL.to_string(),
            fund_type: consts::FUND_TYPE_QDII.to_string(),
            report_type: consts::REPORT_TYPE_PROSPECTUS.to_string(),
            window_days: consts::DEFAULT_WINDOW_DAYS,
            page_size: consts::DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(consts::TIMEOUT_SECS),
        }
    }
}

/// Blocking HTTP client for the CSRC advanced-search endpoint.
pub struct CsrcSearchClient {
    config: CsrcSearchConfig,
    http: Client,
}

impl CsrcSearchClient {
    /// Build a client from `config`.
    pub fn new(config: CsrcSearchConfig) -> Result<Self, WatchError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| WatchError::Configuration(err.to_string()))?;
        Ok(Self { config, http })
    }

    /// Build the DataTables-style `aoData` parameter array for an
    /// upload-date window.
    fn ao_data(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Value> {
        let pair = |name: &str, value: Value| json!({ "name": name, "value": value });
        let mut params = vec![
            pair("sEcho", json!(2)),
            pair("iColumns", json!(6)),
            pair("sColumns", json!(",,,,,,")),
            pair("iDisplayStart", json!(0)),
            pair("iDisplayLength", json!(self.config.page_size)),
        ];
        for (index, property) in fields::TABULAR_COLUMNS.iter().enumerate() {
            params.push(pair(&format!("mDataProp_{index}"), json!(property)));
        }
        params.extend([
            pair("fundType", json!(self.config.fund_type)),
            pair("reportType", json!(self.config.report_type)),
            pair("reportYear", json!("")),
            pair("fundCompanyShortName", json!("")),
            pair("fundCode", json!("")),
            pair("fundShortName", json!("")),
            pair(
                "startUploadDate",
                json!(start.format(fields::DATE_FMT).to_string()),
            ),
            pair(
                "endUploadDate",
                json!(end.format(fields::DATE_FMT).to_string()),
            ),
        ]);
        params
    }

    fn fetch_error(&self, reason: impl Into<String>) -> WatchError {
        WatchError::Fetch {
            source_id: self.id().to_string(),
            reason: reason.into(),
        }
    }
}

impl DisclosureSource for CsrcSearchClient {
    fn id(&self) -> &str {
        consts::SOURCE_ID
    }

    fn fetch(&self) -> Result<RawPayload, WatchError> {
        let now = Utc::now();
        let start = now - chrono::Duration::days(self.config.window_days);
        let ao_data = serde_json::to_string(&self.ao_data(start, now))
            .map_err(|err| self.fetch_error(err.to_string()))?;
        let cache_buster = now.timestamp_millis().to_string();
        let referer = format!(
            "{}?fundId=15977&rnd={}",
            consts::REFERER_BASE_URL,
            rand::random::<f64>()
        );

        debug!(source = self.id(), url = %self.config.base_url, "fetching disclosure window");
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[("aoData", ao_data.as_str()), ("_", cache_buster.as_str())])
            .header(USER_AGENT, consts::USER_AGENT)
            .header(ACCEPT, "application/json, text/javascript, */*; q=0.01")
            .header(ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9")
            .header(REFERER, referer)
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .map_err(|err| self.fetch_error(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.fetch_error(format!("HTTP status {status}")));
        }
        let body = response
            .text()
            .map_err(|err| self.fetch_error(err.to_string()))?;
        if body.trim().is_empty() {
            return Err(self.fetch_error("empty response body"));
        }
        debug!(source = self.id(), length = body.len(), "payload received");
        Ok(RawPayload::from_text(&body))
    }
}
