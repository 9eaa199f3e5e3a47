use crate::error::GeneratorError;
use crate::{invalid_code_char, Generator};
use rand::Rng;
use tinylink_core::ShortCode;

/// Upper- and lower-case ASCII letters plus digits.
pub const DEFAULT_ALPHABET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const DEFAULT_LENGTH: usize = 6;

/// Draws every character of a code independently and uniformly from an
/// alphabet.
///
/// The generator keeps no history, so two calls can return the same code.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    length: usize,
    alphabet: Vec<char>,
}

impl RandomGenerator {
    /// Creates a generator producing `length` characters from `alphabet`.
    pub fn new(length: usize, alphabet: &str) -> Result<Self, GeneratorError> {
        if length < 1 || length > ShortCode::MAX_LENGTH {
            return Err(GeneratorError::InvalidArgument(format!(
                "code length must be between 1 and {}, got {length}",
                ShortCode::MAX_LENGTH
            )));
        }

        if let Some(c) = invalid_code_char(alphabet) {
            return Err(GeneratorError::InvalidArgument(format!(
                "alphabet contains '{c}', codes only allow [A-Za-z0-9_-]"
            )));
        }

        let alphabet: Vec<char> = alphabet.chars().collect();
        if alphabet.is_empty() {
            return Err(GeneratorError::InvalidArgument(
                "alphabet cannot be empty".to_string(),
            ));
        }

        Ok(Self { length, alphabet })
    }

    /// Creates a generator using the default alphanumeric alphabet.
    pub fn with_length(length: usize) -> Result<Self, GeneratorError> {
        Self::new(length, DEFAULT_ALPHABET)
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn alphabet(&self) -> String {
        self.alphabet.iter().collect()
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            alphabet: DEFAULT_ALPHABET.chars().collect(),
        }
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> ShortCode {
        let mut rng = rand::thread_rng();
        let code: String = (0..self.length)
            .map(|_| self.alphabet[rng.gen_range(0..self.alphabet.len())])
            .collect();
        ShortCode::new_unchecked(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_produces_six_alphanumerics() {
        let generator = RandomGenerator::default();

        for _ in 0..100 {
            let code = generator.generate();
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn respects_length() {
        let generator = RandomGenerator::with_length(12).unwrap();
        assert_eq!(generator.generate().as_str().len(), 12);
        assert_eq!(generator.length(), 12);
    }

    #[test]
    fn only_uses_alphabet() {
        let generator = RandomGenerator::new(32, "ab").unwrap();
        let code = generator.generate();
        assert!(code.as_str().chars().all(|c| c == 'a' || c == 'b'));
        assert_eq!(generator.alphabet(), "ab");
    }

    #[test]
    fn single_symbol_alphabet_is_deterministic() {
        let generator = RandomGenerator::new(4, "z").unwrap();
        assert_eq!(generator.generate().as_str(), "zzzz");
    }

    #[test]
    fn alphabet_outside_code_charset_is_rejected() {
        for alphabet in ["äö", "ab.", "a b", "a/b"] {
            assert!(
                matches!(
                    RandomGenerator::new(6, alphabet),
                    Err(GeneratorError::InvalidArgument(_))
                ),
                "{alphabet} should be rejected"
            );
        }
        assert!(RandomGenerator::new(6, "ab-_").is_ok());
    }

    #[test]
    fn generated_codes_pass_code_validation() {
        let generator = RandomGenerator::new(ShortCode::MAX_LENGTH, "xy-_9")
            .unwrap();
        let code = generator.generate();
        assert!(ShortCode::new(code.into_inner()).is_ok());
    }

    #[test]
    fn codes_vary() {
        let generator = RandomGenerator::default();
        let codes: HashSet<String> = (0..50)
            .map(|_| generator.generate().into_inner())
            .collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn out_of_range_length_is_rejected() {
        assert!(matches!(
            RandomGenerator::with_length(0),
            Err(GeneratorError::InvalidArgument(_))
        ));
        assert!(matches!(
            RandomGenerator::with_length(ShortCode::MAX_LENGTH + 1),
            Err(GeneratorError::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_alphabet_is_rejected() {
        assert!(matches!(
            RandomGenerator::new(6, ""),
            Err(GeneratorError::InvalidArgument(_))
        ));
    }
}
