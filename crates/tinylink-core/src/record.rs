use crate::datetime;
use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Free-form key/value data attached to records.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A stored URL mapping.
///
/// Records are values: updates go through the `with_*` methods, which return a
/// new record that the caller stores again in place of the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    short_code: ShortCode,
    original_url: String,
    #[serde(with = "datetime::serde_format")]
    created_at: Timestamp,
    #[serde(with = "datetime::serde_format::option", default)]
    expires_at: Option<Timestamp>,
    #[serde(default)]
    click_count: u64,
    #[serde(default)]
    metadata: Metadata,
}

impl UrlRecord {
    /// Creates an unclicked, non-expiring record without metadata.
    pub fn new(
        short_code: ShortCode,
        original_url: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            short_code,
            original_url: original_url.into(),
            created_at,
            expires_at: None,
            click_count: 0,
            metadata: Metadata::new(),
        }
    }

    pub fn short_code(&self) -> &ShortCode {
        &self.short_code
    }

    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at
    }

    pub fn click_count(&self) -> u64 {
        self.click_count
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Whether the record has expired at the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }

    /// Whether the record is expired at `now`. A record expires at exactly its
    /// `expires_at` instant.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    pub fn with_expires_at(self, expires_at: Option<Timestamp>) -> Self {
        Self { expires_at, ..self }
    }

    pub fn with_click_count(self, click_count: u64) -> Self {
        Self {
            click_count,
            ..self
        }
    }

    pub fn with_metadata(self, metadata: Metadata) -> Self {
        Self { metadata, ..self }
    }
}

/// Client details captured alongside a click.
///
/// Supplied by whoever resolves the code (a web handler would fill it from the
/// request); every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub additional_data: Metadata,
}

/// One recorded click on a short code. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    short_code: ShortCode,
    #[serde(with = "datetime::serde_format")]
    clicked_at: Timestamp,
    #[serde(default)]
    ip_address: Option<String>,
    #[serde(default)]
    user_agent: Option<String>,
    #[serde(default)]
    referrer: Option<String>,
    #[serde(default)]
    additional_data: Metadata,
}

impl AnalyticsRecord {
    pub fn new(short_code: ShortCode, clicked_at: Timestamp, context: ClickContext) -> Self {
        Self {
            short_code,
            clicked_at,
            ip_address: context.ip_address,
            user_agent: context.user_agent,
            referrer: context.referrer,
            additional_data: context.additional_data,
        }
    }

    pub fn short_code(&self) -> &ShortCode {
        &self.short_code
    }

    pub fn clicked_at(&self) -> Timestamp {
        self.clicked_at
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn referrer(&self) -> Option<&str> {
        self.referrer.as_deref()
    }

    pub fn additional_data(&self) -> &Metadata {
        &self.additional_data
    }
}

/// Everything known about a short code: the record plus its clicks,
/// newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlAnalytics {
    pub short_code: ShortCode,
    pub original_url: String,
    #[serde(with = "datetime::serde_format")]
    pub created_at: Timestamp,
    #[serde(with = "datetime::serde_format::option")]
    pub expires_at: Option<Timestamp>,
    pub total_clicks: u64,
    pub clicks: Vec<AnalyticsRecord>,
    pub metadata: Metadata,
}

impl UrlAnalytics {
    pub fn new(record: UrlRecord, clicks: Vec<AnalyticsRecord>) -> Self {
        Self {
            short_code: record.short_code,
            original_url: record.original_url,
            created_at: record.created_at,
            expires_at: record.expires_at,
            total_clicks: record.click_count,
            clicks,
            metadata: record.metadata,
        }
    }
}
