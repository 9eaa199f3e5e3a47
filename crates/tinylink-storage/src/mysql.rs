use crate::error::{map_sqlx_error, Result, StorageError};
use async_trait::async_trait;
use jiff::Timestamp;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tinylink_core::{
    datetime, AnalyticsRecord, ClickContext, Metadata, ShortCode, Storage, UrlRecord,
};
use tracing::debug;

const URLS_DDL: &str = include_str!("../ddl/mysql/urls.sql");
const ANALYTICS_DDL: &str = include_str!("../ddl/mysql/analytics.sql");

/// MySQL implementation of the storage contract.
///
/// Uses an `urls` table keyed by short code and an `analytics` table whose
/// rows reference `urls` with `ON DELETE CASCADE`. Both tables are created on
/// construction when missing. Timestamps are `DATETIME` values in UTC.
#[derive(Debug, Clone)]
pub struct MySqlStorage {
    pool: MySqlPool,
}

impl MySqlStorage {
    /// Creates a storage from an existing pool, creating the tables if needed.
    pub async fn new(pool: MySqlPool) -> Result<Self> {
        let storage = Self { pool };
        storage.ensure_schema().await?;
        Ok(storage)
    }

    /// Opens a new MySQL connection pool and prepares the schema.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Self::new(pool).await
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        for ddl in [URLS_DDL, ANALYTICS_DDL] {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        }
        debug!("mysql schema is ready");
        Ok(())
    }
}

fn parse_timestamp(column: &str, value: &str) -> Result<Timestamp> {
    datetime::parse(value).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{value}': {e}"))
    })
}

fn parse_json(column: &str, value: Option<String>) -> Result<Metadata> {
    match value {
        None => Ok(Metadata::new()),
        Some(raw) => match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(serde_json::Value::Null) => Ok(Metadata::new()),
            Ok(serde_json::Value::Array(items)) if items.is_empty() => Ok(Metadata::new()),
            Ok(other) => Err(StorageError::InvalidData(format!(
                "{column} must be a JSON object, got {other}"
            ))),
            Err(e) => Err(StorageError::InvalidData(format!("invalid {column}: {e}"))),
        },
    }
}

fn encode_json(value: &Metadata) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

fn url_record_from_row(row: &MySqlRow) -> Result<UrlRecord> {
    let short_code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let created_at: String = row.try_get("created_at").map_err(map_sqlx_error)?;
    let expires_at: Option<String> = row.try_get("expires_at").map_err(map_sqlx_error)?;
    let click_count: u64 = row.try_get("click_count").map_err(map_sqlx_error)?;
    let metadata: Option<String> = row.try_get("metadata").map_err(map_sqlx_error)?;

    let expires_at = expires_at
        .map(|value| parse_timestamp("expires_at", &value))
        .transpose()?;

    Ok(UrlRecord::new(
        ShortCode::new_unchecked(short_code),
        original_url,
        parse_timestamp("created_at", &created_at)?,
    )
    .with_expires_at(expires_at)
    .with_click_count(click_count)
    .with_metadata(parse_json("metadata", metadata)?))
}

fn analytics_record_from_row(row: &MySqlRow) -> Result<AnalyticsRecord> {
    let short_code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let clicked_at: String = row.try_get("clicked_at").map_err(map_sqlx_error)?;
    let additional_data: Option<String> =
        row.try_get("additional_data").map_err(map_sqlx_error)?;

    let context = ClickContext {
        ip_address: row.try_get("ip_address").map_err(map_sqlx_error)?,
        user_agent: row.try_get("user_agent").map_err(map_sqlx_error)?,
        referrer: row.try_get("referrer").map_err(map_sqlx_error)?,
        additional_data: parse_json("additional_data", additional_data)?,
    };

    Ok(AnalyticsRecord::new(
        ShortCode::new_unchecked(short_code),
        parse_timestamp("clicked_at", &clicked_at)?,
        context,
    ))
}

#[async_trait]
impl Storage for MySqlStorage {
    async fn store(&self, record: UrlRecord) -> Result<()> {
        let metadata = encode_json(record.metadata())?;

        sqlx::query(
            r#"
            INSERT INTO urls (short_code, original_url, created_at, expires_at, click_count, metadata)
            VALUES (?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                original_url = VALUES(original_url),
                created_at = VALUES(created_at),
                expires_at = VALUES(expires_at),
                click_count = VALUES(click_count),
                metadata = VALUES(metadata)
            "#,
        )
        .bind(record.short_code().as_str())
        .bind(record.original_url())
        .bind(datetime::format(record.created_at()))
        .bind(record.expires_at().map(datetime::format))
        .bind(record.click_count())
        .bind(metadata)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn retrieve(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let row = sqlx::query(
            r#"
            SELECT short_code,
                   original_url,
                   DATE_FORMAT(created_at, '%Y-%m-%d %H:%i:%s') AS created_at,
                   DATE_FORMAT(expires_at, '%Y-%m-%d %H:%i:%s') AS expires_at,
                   click_count,
                   CAST(metadata AS CHAR) AS metadata
            FROM urls
            WHERE short_code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(url_record_from_row).transpose()
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM urls
            WHERE short_code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM analytics WHERE short_code = ?")
            .bind(code.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let result = sqlx::query("DELETE FROM urls WHERE short_code = ?")
            .bind(code.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn store_analytics(&self, record: AnalyticsRecord) -> Result<()> {
        let additional_data = encode_json(record.additional_data())?;

        sqlx::query(
            r#"
            INSERT INTO analytics (short_code, clicked_at, ip_address, user_agent, referrer, additional_data)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.short_code().as_str())
        .bind(datetime::format(record.clicked_at()))
        .bind(record.ip_address())
        .bind(record.user_agent())
        .bind(record.referrer())
        .bind(additional_data)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn analytics(&self, code: &ShortCode) -> Result<Vec<AnalyticsRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT short_code,
                   DATE_FORMAT(clicked_at, '%Y-%m-%d %H:%i:%s') AS clicked_at,
                   ip_address,
                   user_agent,
                   referrer,
                   CAST(additional_data AS CHAR) AS additional_data
            FROM analytics
            WHERE short_code = ?
            ORDER BY clicked_at DESC, id DESC
            "#,
        )
        .bind(code.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(analytics_record_from_row).collect()
    }
}
