use crate::error::ShortenerError;
use crate::record::{ClickContext, Metadata, UrlAnalytics, UrlRecord};
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use std::time::Duration;
use typed_builder::TypedBuilder;

type Result<T> = std::result::Result<T, ShortenerError>;

/// Expiration policy for a shortened URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ExpirationPolicy {
    /// The shortened URL never expires.
    #[default]
    Never,
    /// The shortened URL expires after a certain duration from now.
    AfterDuration(Duration),
    /// The shortened URL expires at a specific timestamp.
    AtTimestamp(Timestamp),
}

impl ExpirationPolicy {
    /// Resolves the policy into the absolute expiry instant, relative to `now`.
    pub fn expires_at(&self, now: Timestamp) -> Result<Option<Timestamp>> {
        match self {
            ExpirationPolicy::Never => Ok(None),
            ExpirationPolicy::AfterDuration(duration) => {
                let duration = SignedDuration::try_from(*duration)
                    .map_err(|e| ShortenerError::InvalidExpiration(e.to_string()))?;
                now.checked_add(duration)
                    .map(Some)
                    .map_err(|e| ShortenerError::InvalidExpiration(e.to_string()))
            }
            ExpirationPolicy::AtTimestamp(timestamp) => Ok(Some(*timestamp)),
        }
    }
}

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    #[builder(setter(into))]
    pub original_url: String,
    /// The expiration policy for the shortened URL.
    #[builder(default)]
    pub expiration: ExpirationPolicy,
    /// Arbitrary data stored with the record.
    #[builder(default)]
    pub metadata: Metadata,
}

/// The short-code lifecycle: create, resolve, inspect, update and delete.
///
/// A code is active from `shorten` until it is deleted or its expiry passes.
/// Expired codes behave as missing for `expand` and `exists`, but their record
/// and analytics stay readable until deleted.
#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates a shortened URL and returns the generated short code.
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode>;

    /// Resolves an active short code to its original URL.
    ///
    /// With `Some(context)` the click is counted and recorded; `None` only
    /// resolves.
    async fn expand(&self, code: &ShortCode, tracking: Option<ClickContext>) -> Result<String>;

    /// Returns `true` if the code is stored and not expired.
    async fn exists(&self, code: &ShortCode) -> Result<bool>;

    /// Deletes a shortened URL and its analytics.
    /// Returns `true` if the record existed and was removed.
    async fn delete(&self, code: &ShortCode) -> Result<bool>;

    /// Returns the record and its clicks, whether or not the code has expired.
    async fn analytics(&self, code: &ShortCode) -> Result<UrlAnalytics>;

    /// Returns the stored record, whether or not the code has expired.
    async fn url_record(&self, code: &ShortCode) -> Result<UrlRecord>;

    /// Replaces the metadata of a stored record and returns the new record.
    async fn update_metadata(&self, code: &ShortCode, metadata: Metadata) -> Result<UrlRecord>;
}
