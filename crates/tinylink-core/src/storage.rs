use crate::error::Result;
use crate::record::{AnalyticsRecord, UrlRecord};
use crate::shortcode::ShortCode;
use async_trait::async_trait;

/// Persistence contract shared by every backend.
///
/// Implementations store URL records keyed by short code and an append-only
/// list of clicks per code. Expiration is not evaluated here; callers compare
/// `expires_at` against the clock after retrieval.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Inserts the record, replacing any record stored under the same code.
    ///
    /// The write is atomic per record: readers see either the old or the new
    /// record, never a mix.
    async fn store(&self, record: UrlRecord) -> Result<()>;

    /// Retrieves the record for a given short code, expired or not.
    async fn retrieve(&self, code: &ShortCode) -> Result<Option<UrlRecord>>;

    /// Checks whether a record is stored under the short code.
    async fn exists(&self, code: &ShortCode) -> Result<bool>;

    /// Deletes the record and every click recorded for it.
    /// Returns `true` if the record existed and was removed.
    async fn delete(&self, code: &ShortCode) -> Result<bool>;

    /// Appends a click. Clicks carry no uniqueness constraint.
    async fn store_analytics(&self, record: AnalyticsRecord) -> Result<()>;

    /// Returns the clicks recorded for a short code, newest first.
    async fn analytics(&self, code: &ShortCode) -> Result<Vec<AnalyticsRecord>>;
}
