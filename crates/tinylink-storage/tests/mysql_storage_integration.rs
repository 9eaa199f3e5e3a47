//! Runs against a disposable MySQL container; needs a Docker daemon.
//! `cargo test -p tinylink-storage -- --ignored` to run.

use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use serde_json::json;
use sqlx::mysql::MySqlPoolOptions;
use tinylink_core::{AnalyticsRecord, ClickContext, Metadata, ShortCode, UrlRecord};
use tinylink_storage::{MySqlStorage, Storage, StorageError};
use tinylink_test_infra::mysql::{MySqlServer, MysqlConfig};

struct Fixture {
    _mysql: MySqlServer,
    storage: MySqlStorage,
}

impl Fixture {
    async fn start() -> Self {
        let mysql = MySqlServer::new(MysqlConfig::builder().build())
            .await
            .expect("start mysql");
        let url = mysql.database_url().await.expect("mysql url");
        let pool = connect_with_retry(&url).await;

        Self {
            _mysql: mysql,
            storage: MySqlStorage::new(pool).await.expect("create schema"),
        }
    }
}

async fn connect_with_retry(url: &str) -> sqlx::MySqlPool {
    let mut last_error = None;

    for _ in 0..20 {
        match MySqlPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
        {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect mysql: {last_error:?}");
}

fn code(value: &str) -> ShortCode {
    ShortCode::new_unchecked(value)
}

fn created() -> Timestamp {
    Timestamp::from_second(1_700_000_000).unwrap()
}

fn record(value: &str, url: &str) -> UrlRecord {
    UrlRecord::new(code(value), url, created())
}

fn click(value: &str, offset_secs: i64) -> AnalyticsRecord {
    let context = ClickContext {
        ip_address: Some("192.0.2.10".into()),
        user_agent: Some("integration".into()),
        referrer: Some("https://referrer.example".into()),
        additional_data: Metadata::new(),
    };
    AnalyticsRecord::new(
        code(value),
        created() + SignedDuration::from_secs(offset_secs),
        context,
    )
}

#[tokio::test]
#[ignore = "requires docker"]
async fn store_and_retrieve_round_trips_every_column() {
    let fixture = Fixture::start().await;
    let mut metadata = Metadata::new();
    metadata.insert("campaign".into(), json!({"name": "spring", "week": 3}));
    let stored = record("abc123", "https://example.com")
        .with_expires_at(Some(created() + SignedDuration::from_hours(1)))
        .with_click_count(4)
        .with_metadata(metadata);

    fixture.storage.store(stored.clone()).await.unwrap();

    let got = fixture.storage.retrieve(&code("abc123")).await.unwrap();
    assert_eq!(got, Some(stored));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn store_upserts_click_count_and_metadata() {
    let fixture = Fixture::start().await;
    let first = record("abc123", "https://example.com");
    fixture.storage.store(first.clone()).await.unwrap();

    let mut metadata = Metadata::new();
    metadata.insert("v".into(), json!(2));
    fixture
        .storage
        .store(first.with_click_count(1).with_metadata(metadata.clone()))
        .await
        .unwrap();

    let got = fixture
        .storage
        .retrieve(&code("abc123"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(got.click_count(), 1);
    assert_eq!(got.metadata(), &metadata);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn codes_are_case_sensitive() {
    let fixture = Fixture::start().await;
    fixture
        .storage
        .store(record("AbC", "https://upper.example"))
        .await
        .unwrap();
    fixture
        .storage
        .store(record("abc", "https://lower.example"))
        .await
        .unwrap();

    let upper = fixture
        .storage
        .retrieve(&code("AbC"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(upper.original_url(), "https://upper.example");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn analytics_are_newest_first_and_cascade_on_delete() {
    let fixture = Fixture::start().await;
    fixture
        .storage
        .store(record("abc123", "https://example.com"))
        .await
        .unwrap();
    fixture
        .storage
        .store_analytics(click("abc123", 1))
        .await
        .unwrap();
    fixture
        .storage
        .store_analytics(click("abc123", 5))
        .await
        .unwrap();
    fixture
        .storage
        .store_analytics(click("abc123", 3))
        .await
        .unwrap();

    let clicks = fixture.storage.analytics(&code("abc123")).await.unwrap();
    let offsets: Vec<i64> = clicks
        .iter()
        .map(|c| c.clicked_at().as_second() - created().as_second())
        .collect();
    assert_eq!(offsets, vec![5, 3, 1]);
    assert_eq!(clicks[0].referrer(), Some("https://referrer.example"));

    assert!(fixture.storage.delete(&code("abc123")).await.unwrap());
    assert!(fixture
            .storage
            .analytics(&code("abc123"))
            .await
            .unwrap()
            .is_empty());
    assert!(!fixture.storage.delete(&code("abc123")).await.unwrap());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn analytics_for_unknown_code_violate_the_foreign_key() {
    let fixture = Fixture::start().await;

    let err = fixture
        .storage
        .store_analytics(click("missing", 1))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Query(_)));
}
