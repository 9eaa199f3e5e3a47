use crate::error::{map_json_error, Result, StorageError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tinylink_core::{AnalyticsRecord, ShortCode, Storage, UrlRecord};
use tokio::sync::Mutex;
use tracing::{debug, trace};

pub const URLS_FILE: &str = "urls.json";
pub const ANALYTICS_FILE: &str = "analytics.json";

type UrlDocument = BTreeMap<ShortCode, UrlRecord>;
type AnalyticsDocument = BTreeMap<ShortCode, Vec<AnalyticsRecord>>;

/// Storage backed by two JSON documents in a data directory.
///
/// `urls.json` maps short codes to records and `analytics.json` maps short
/// codes to their clicks in arrival order. Every mutation loads the affected
/// document, changes it and writes the whole document back through a
/// temporary file that is renamed over the original, so readers only ever
/// see complete documents.
///
/// Mutations through one `FileStorage` are serialized; nothing coordinates
/// separate instances or processes writing to the same directory.
#[derive(Debug)]
pub struct FileStorage {
    urls_path: PathBuf,
    analytics_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Opens (and creates if needed) a data directory.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();

        tokio::fs::create_dir_all(data_dir).await.map_err(|e| {
            StorageError::Unavailable(format!(
                "cannot create data directory {}: {e}",
                data_dir.display()
            ))
        })?;

        let metadata = tokio::fs::metadata(data_dir).await?;
        if metadata.permissions().readonly() {
            return Err(StorageError::Unavailable(format!(
                "data directory is not writable: {}",
                data_dir.display()
            )));
        }

        Ok(Self {
            urls_path: data_dir.join(URLS_FILE),
            analytics_path: data_dir.join(ANALYTICS_FILE),
            write_lock: Mutex::new(()),
        })
    }

    pub fn urls_path(&self) -> &Path {
        &self.urls_path
    }

    pub fn analytics_path(&self) -> &Path {
        &self.analytics_path
    }

    async fn load_urls(&self) -> Result<UrlDocument> {
        load(&self.urls_path).await
    }

    async fn load_analytics(&self) -> Result<AnalyticsDocument> {
        load(&self.analytics_path).await
    }
}

/// Reads a document; a missing or blank file is an empty document.
async fn load<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e.into()),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(&bytes).map_err(|e| match map_json_error(e) {
        StorageError::InvalidData(message) => {
            StorageError::InvalidData(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

async fn save<T>(path: &Path, document: &T) -> Result<()>
where
    T: Serialize,
{
    let bytes = serde_json::to_vec_pretty(document)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, bytes).await?;
    tokio::fs::rename(&staging, path).await?;

    debug!(path = %path.display(), "rewrote document");
    Ok(())
}

#[async_trait]
impl Storage for FileStorage {
    async fn store(&self, record: UrlRecord) -> Result<()> {
        trace!(code = %record.short_code(), "storing record on disk");
        let _guard = self.write_lock.lock().await;

        let mut urls = self.load_urls().await?;
        urls.insert(record.short_code().clone(), record);
        save(&self.urls_path, &urls).await
    }

    async fn retrieve(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let mut urls = self.load_urls().await?;
        Ok(urls.remove(code))
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.load_urls().await?.contains_key(code))
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let mut urls = self.load_urls().await?;
        if urls.remove(code).is_none() {
            return Ok(false);
        }

        let mut analytics = self.load_analytics().await?;
        let had_clicks = analytics.remove(code).is_some();

        save(&self.urls_path, &urls).await?;
        if had_clicks {
            save(&self.analytics_path, &analytics).await?;
        }
        Ok(true)
    }

    async fn store_analytics(&self, record: AnalyticsRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut analytics = self.load_analytics().await?;
        analytics
            .entry(record.short_code().clone())
            .or_default()
            .push(record);
        save(&self.analytics_path, &analytics).await
    }

    async fn analytics(&self, code: &ShortCode) -> Result<Vec<AnalyticsRecord>> {
        let mut analytics = self.load_analytics().await?;
        let mut clicks = analytics.remove(code).unwrap_or_default();
        clicks.reverse();
        Ok(clicks)
    }
}
