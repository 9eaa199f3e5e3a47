//! URL shortener service implementation.
//!
//! This crate ties storage and code generation together behind the
//! `Shortener` trait, and validates URLs before they are stored. Core types
//! are re-exported from `tinylink_core`.

pub mod service;
pub mod validator;

pub use service::{ShortenerService, MAX_GENERATION_ATTEMPTS};
pub use tinylink_core::{
    ClickContext, ExpirationPolicy, Metadata, ShortCode, ShortenParams, Shortener, ShortenerError,
    UrlAnalytics, UrlRecord,
};
pub use validator::{UrlValidator, ValidationError};
