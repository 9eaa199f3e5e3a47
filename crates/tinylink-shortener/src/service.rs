use crate::validator::UrlValidator;
use async_trait::async_trait;
use std::sync::Arc;
use tinylink_core::{
    datetime, AnalyticsRecord, ClickContext, Metadata, ShortCode, ShortenParams, Shortener,
    ShortenerError, Storage, UrlAnalytics, UrlRecord,
};
use tinylink_generator::Generator;
use tracing::{debug, trace, warn};

type Result<T> = std::result::Result<T, ShortenerError>;

/// How many generated codes are tried before `shorten` gives up.
pub const MAX_GENERATION_ATTEMPTS: usize = 10;

/// A concrete implementation of the `Shortener` trait.
///
/// Wraps a `Storage` and a `Generator`. Generated codes are checked against
/// storage and regenerated on collision, up to [`MAX_GENERATION_ATTEMPTS`]
/// times.
///
/// Click tracking is a read-modify-write of the record: two concurrent clicks
/// on the same code may both read the old count, and one increment is lost.
/// Both analytics entries are still written.
#[derive(Debug)]
pub struct ShortenerService<S, G> {
    storage: Arc<S>,
    generator: Arc<G>,
    validator: UrlValidator,
}

// Clones share the storage and generator.
impl<S, G> Clone for ShortenerService<S, G> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            generator: Arc::clone(&self.generator),
            validator: self.validator.clone(),
        }
    }
}

impl<S: Storage, G: Generator> ShortenerService<S, G> {
    /// Creates a service accepting http and https URLs of up to 2048 bytes.
    pub fn new(storage: S, generator: G) -> Self {
        Self::with_validator(storage, generator, UrlValidator::default())
    }

    pub fn with_validator(storage: S, generator: G, validator: UrlValidator) -> Self {
        Self {
            storage: Arc::new(storage),
            generator: Arc::new(generator),
            validator,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn validator(&self) -> &UrlValidator {
        &self.validator
    }

    async fn generate_unique_code(&self) -> Result<ShortCode> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let code = self.generator.generate();
            if !self.storage.exists(&code).await? {
                return Ok(code);
            }
            warn!(code = %code, attempt, "generated short code is already taken");
        }

        warn!(
            attempts = MAX_GENERATION_ATTEMPTS,
            "could not generate an unused short code"
        );
        Err(ShortenerError::GenerationExhausted {
            attempts: MAX_GENERATION_ATTEMPTS,
        })
    }

    async fn find(&self, code: &ShortCode) -> Result<UrlRecord> {
        self.storage
            .retrieve(code)
            .await?
            .ok_or_else(|| ShortenerError::ShortCodeNotFound(code.to_string()))
    }

    async fn track_click(&self, record: UrlRecord, context: ClickContext) -> Result<()> {
        let code = record.short_code().clone();
        let clicks = record.click_count().saturating_add(1);

        self.storage.store(record.with_click_count(clicks)).await?;
        self.storage
            .store_analytics(AnalyticsRecord::new(code.clone(), datetime::now(), context))
            .await?;

        debug!(code = %code, clicks, "click recorded");
        Ok(())
    }
}

#[async_trait]
impl<S: Storage, G: Generator> Shortener for ShortenerService<S, G> {
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode> {
        trace!(url = %params.original_url, "shortening url");
        if let Err(reason) = self.validator.validate(&params.original_url) {
            debug!(url = %params.original_url, %reason, "rejected url");
            return Err(ShortenerError::InvalidUrl(params.original_url));
        }

        let now = datetime::now();
        // Stored timestamps have whole-second precision on every backend.
        let expires_at = params.expiration.expires_at(now)?.map(datetime::truncate);

        let code = self.generate_unique_code().await?;
        let record = UrlRecord::new(code.clone(), params.original_url, now)
            .with_expires_at(expires_at)
            .with_metadata(params.metadata);
        self.storage.store(record).await?;

        debug!(code = %code, "url shortened");
        Ok(code)
    }

    async fn expand(&self, code: &ShortCode, tracking: Option<ClickContext>) -> Result<String> {
        trace!(code = %code, track = tracking.is_some(), "expanding short code");
        let record = self.find(code).await?;
        if record.is_expired() {
            debug!(code = %code, "short code has expired");
            return Err(ShortenerError::ShortCodeNotFound(code.to_string()));
        }

        let url = record.original_url().to_string();
        if let Some(context) = tracking {
            self.track_click(record, context).await?;
        }
        Ok(url)
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self
            .storage
            .retrieve(code)
            .await?
            .is_some_and(|record| !record.is_expired()))
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let deleted = self.storage.delete(code).await?;
        if deleted {
            debug!(code = %code, "short code deleted");
        }
        Ok(deleted)
    }

    async fn analytics(&self, code: &ShortCode) -> Result<UrlAnalytics> {
        let record = self.find(code).await?;
        let clicks = self.storage.analytics(code).await?;
        Ok(UrlAnalytics::new(record, clicks))
    }

    async fn url_record(&self, code: &ShortCode) -> Result<UrlRecord> {
        self.find(code).await
    }

    async fn update_metadata(&self, code: &ShortCode, metadata: Metadata) -> Result<UrlRecord> {
        let record = self.find(code).await?.with_metadata(metadata);
        self.storage.store(record.clone()).await?;
        debug!(code = %code, "metadata replaced");
        Ok(record)
    }
}
