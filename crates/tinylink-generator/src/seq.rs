use crate::error::GeneratorError;
use crate::{invalid_code_char, Generator};
use std::sync::atomic::{AtomicU64, Ordering};
use tinylink_core::ShortCode;
use typed_builder::TypedBuilder;

/// Digits in `u64::MAX`.
const MAX_COUNTER_DIGITS: usize = 20;

/// Configures a [`SeqGenerator`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct SeqSettings {
    /// Fixed text put in front of every code.
    #[builder(default, setter(into))]
    pub prefix: String,
    /// Minimum number of digits; shorter counters are left-padded with zeros.
    #[builder(default = 3)]
    pub padding: usize,
    /// First counter value handed out.
    #[builder(default = 1)]
    pub start: u64,
}

impl Default for SeqSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Produces `prefix + zero-padded counter` codes: "url001", "url002", ...
///
/// Codes are unique per instance as long as the counter is not rewound with
/// [`SeqGenerator::set_counter`]. A fresh process starts again at `start`, so
/// callers persisting codes should resume from a known counter value.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
    prefix: String,
    padding: usize,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
            prefix: self.prefix.clone(),
            padding: self.padding,
        }
    }
}

impl SeqGenerator {
    pub fn new(settings: SeqSettings) -> Result<Self, GeneratorError> {
        if settings.padding < 1 {
            return Err(GeneratorError::InvalidArgument(
                "padding must be at least 1".to_string(),
            ));
        }
        if settings.start < 1 {
            return Err(GeneratorError::InvalidArgument(
                "start must be at least 1".to_string(),
            ));
        }
        if let Some(c) = invalid_code_char(&settings.prefix) {
            return Err(GeneratorError::InvalidArgument(format!(
                "prefix contains '{c}', codes only allow [A-Za-z0-9_-]"
            )));
        }
        let widest = settings.prefix.len() + settings.padding.max(MAX_COUNTER_DIGITS);
        if widest > ShortCode::MAX_LENGTH {
            return Err(GeneratorError::InvalidArgument(format!(
                "prefix and padding would exceed {} characters",
                ShortCode::MAX_LENGTH
            )));
        }

        Ok(Self {
            counter: AtomicU64::new(settings.start),
            prefix: settings.prefix,
            padding: settings.padding,
        })
    }

    /// Creates a generator with the given prefix, padding 3, starting at 1.
    ///
    /// The prefix is not checked; use [`SeqGenerator::new`] for prefixes that
    /// come from configuration.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            counter: AtomicU64::new(1),
            prefix: prefix.into(),
            padding: 3,
        }
    }

    /// The value the next call to `generate` will use.
    pub fn counter(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Moves the counter, e.g. to resume after a restart.
    pub fn set_counter(&self, counter: u64) -> Result<(), GeneratorError> {
        if counter < 1 {
            return Err(GeneratorError::InvalidArgument(
                "counter must be at least 1".to_string(),
            ));
        }
        self.counter.store(counter, Ordering::SeqCst);
        Ok(())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn padding(&self) -> usize {
        self.padding
    }
}

impl Generator for SeqGenerator {
    fn generate(&self) -> ShortCode {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        let code = format!("{}{:0width$}", self.prefix, count, width = self.padding);
        ShortCode::new_unchecked(code)
    }
}
