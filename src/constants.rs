/// Constants used by record fields and the persisted field-ordering contract.
pub mod fields {
    /// Field carrying the upstream upload-detail identifier (the merge key).
    pub const IDENTITY_KEY: &str = "uploadInfoDetailId";
    /// Field stamped once when a record is first persisted.
    pub const FETCHED_AT: &str = "fetched_at";
    /// Timestamp format used for `fetched_at` values.
    pub const FETCHED_AT_FMT: &str = "%Y-%m-%d %H:%M:%S";
    /// Field carrying the upload date reported by the platform.
    pub const UPLOAD_DATE: &str = "uploadDate";
    /// Date format used for synthesized upload dates and search windows.
    pub const DATE_FMT: &str = "%Y-%m-%d";

    /// Core fields written first, in this order, in every persisted header.
    /// All other observed fields follow in lexicographic order.
    pub const CORE_FIELDS: [&str; 9] = [
        IDENTITY_KEY,
        "fundCode",
        "fundShortName",
        "reportName",
        "organName",
        "reportDesp",
        UPLOAD_DATE,
        "reportSendDate",
        FETCHED_AT,
    ];

    /// Positional field mapping for tabular (array-of-arrays) payload rows.
    pub const TABULAR_COLUMNS: [&str; 6] = [
        "fundCode",
        "fundId",
        "reportName",
        "organName",
        "reportDesp",
        "reportSendDate",
    ];
    /// Field-name prefix for tabular columns past the mapped six.
    pub const EXTRA_COLUMN_PREFIX: &str = "col";
    /// Prefix for identity keys synthesized when a row carries no detail id.
    pub const SYNTHETIC_ID_PREFIX: &str = "api";
}

/// Constants used by the persisted CSV store.
pub mod store {
    /// Default location of the persisted filing archive.
    pub const DEFAULT_STORE_PATH: &str = "data/csrc_fund_data.csv";
}

/// Constants used by the CSRC advanced-search fetch client.
pub mod fetch {
    /// Source id used in records, errors, and logs.
    pub const SOURCE_ID: &str = "csrc_advanced_search";
    /// Advanced-search endpoint for fund disclosure reports.
    pub const DEFAULT_BASE_URL: &str =
        "http://eid.csrc.gov.cn/fund/disclose/advanced_search_report.do";
    /// Referer page presented alongside API requests.
    pub const REFERER_BASE_URL: &str = "http://eid.csrc.gov.cn/fund/disclose/fund_detail.do";
    /// Fund-type filter selecting QDII funds.
    pub const FUND_TYPE_QDII: &str = "6020-6050";
    /// Report-type filter selecting prospectus filings.
    pub const REPORT_TYPE_PROSPECTUS: &str = "FA010010";
    /// Days of history requested per fetch (upload-date window).
    pub const DEFAULT_WINDOW_DAYS: i64 = 30;
    /// Rows requested per fetch.
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    /// Request timeout in seconds.
    pub const TIMEOUT_SECS: u64 = 60;
    /// Browser-like user agent presented to the endpoint.
    pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";
    /// Wrapper field names that may carry the record list in a payload object.
    pub const WRAPPER_FIELDS: [&str; 2] = ["aaData", "data"];
    /// Minimum column count for a tabular row to map positionally.
    pub const MIN_TABULAR_COLUMNS: usize = 6;
}

/// Constants used by the SMTP notification gateway.
pub mod notify {
    /// Notifier id used in errors and logs.
    pub const NOTIFIER_ID: &str = "smtp_email";
    /// Environment variable carrying the sender address.
    pub const ENV_SENDER: &str = "EMAIL_ADDRESS";
    /// Environment variable carrying the authorization code or app password.
    pub const ENV_CREDENTIAL: &str = "EMAIL_PASSWORD";
    /// Environment variable selecting the SMTP provider.
    pub const ENV_PROVIDER: &str = "EMAIL_PROVIDER";
    /// Environment variable carrying a comma-separated recipient list.
    pub const ENV_RECIPIENTS: &str = "EMAIL_RECIPIENTS";
    /// Provider used when none is configured or the name is unknown.
    pub const DEFAULT_PROVIDER: &str = "qq";
    /// Provider name, relay host, and submission port.
    /// Port 465 uses implicit TLS; the rest use STARTTLS.
    pub const PROVIDER_RELAYS: [(&str, &str, u16); 6] = [
        ("qq", "smtp.qq.com", 465),
        ("gmail", "smtp.gmail.com", 587),
        ("163", "smtp.163.com", 25),
        ("outlook", "smtp.office365.com", 587),
        ("126", "smtp.126.com", 25),
        ("sina", "smtp.sina.com", 587),
    ];
}

/// Constants used by run orchestration and scheduling.
pub mod run {
    /// Default polling interval in minutes for scheduled mode.
    pub const DEFAULT_INTERVAL_MINUTES: u64 = 30;
}
