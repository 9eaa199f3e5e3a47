pub mod error;
pub mod random;
pub mod seq;

pub use error::GeneratorError;
pub use random::RandomGenerator;
pub use seq::{SeqGenerator, SeqSettings};

use tinylink_core::ShortCode;

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
/// A generated code may collide with one that is already stored; callers
/// check uniqueness and ask again.
pub trait Generator: Send + Sync + 'static {
    /// Produces the next candidate short code.
    fn generate(&self) -> ShortCode;
}

/// First character of `text` that [`ShortCode::new`] would reject.
pub(crate) fn invalid_code_char(text: &str) -> Option<char> {
    text.chars().find(|c| !ShortCode::is_valid_char(*c))
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self) -> ShortCode {
        (**self).generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxed_generator_delegates() {
        let settings = SeqSettings::builder().prefix("bx").build();
        let generator: Box<dyn Generator> = Box::new(SeqGenerator::new(settings).unwrap());

        assert_eq!(generator.generate().as_str(), "bx001");
        assert_eq!(generator.generate().as_str(), "bx002");
    }
}
