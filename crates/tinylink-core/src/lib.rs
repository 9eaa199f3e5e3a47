//! Core types and traits for the tinylink URL shortener.
//!
//! This crate provides the record types, the error taxonomy, the
//! [`Storage`] contract implemented by every backend and the [`Shortener`]
//! contract implemented by the service.

pub mod datetime;
pub mod error;
pub mod record;
pub mod shortcode;
pub mod shortener;
pub mod storage;

pub use error::{ShortenerError, StorageError};
pub use record::{AnalyticsRecord, ClickContext, Metadata, UrlAnalytics, UrlRecord};
pub use shortcode::ShortCode;
pub use shortener::{ExpirationPolicy, ShortenParams, Shortener};
pub use storage::Storage;
