//! Collision-resistant record identifiers.
//!
//! Every row except the junction tables is keyed by a randomly generated
//! lowercase alphanumeric string. Identifiers are opaque: the only validation
//! is that they are non-empty, trimmed, and drawn from the expected alphabet.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters used by generated identifiers.
const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of generated identifiers; 24 characters of base-36 comfortably
/// exceed the collision resistance of a UUID.
const ID_LEN: usize = 24;

/// Validation errors returned by [`RecordId::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdValidationError {
    /// Identifier was empty.
    #[error("identifier must not be empty")]
    Empty,
    /// Identifier contained characters outside `[a-z0-9_-]`.
    #[error("identifier contains invalid characters")]
    InvalidCharacters,
}

/// Opaque primary-key value for persisted records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Validate and construct an identifier from existing input.
    pub fn new(id: impl Into<String>) -> Result<Self, IdValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdValidationError::Empty);
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err(IdValidationError::InvalidCharacters);
        }
        Ok(Self(id))
    }

    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        let id = (0..ID_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..ID_ALPHABET.len());
                char::from(ID_ALPHABET[idx])
            })
            .collect();
        Self(id)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

impl TryFrom<String> for RecordId {
    type Error = IdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn random_ids_use_expected_shape() {
        let id = RecordId::random();
        assert_eq!(id.as_ref().len(), 24);
        assert!(
            id.as_ref()
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[rstest]
    fn random_ids_do_not_repeat_in_small_batches() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(RecordId::random()));
        }
    }

    #[rstest]
    #[case("d27a197e")]
    #[case("note-1")]
    #[case("user_2")]
    fn accepts_existing_identifiers(#[case] raw: &str) {
        let id = RecordId::new(raw).expect("valid id");
        assert_eq!(id.as_ref(), raw);
    }

    #[rstest]
    #[case("", IdValidationError::Empty)]
    #[case("Has Upper", IdValidationError::InvalidCharacters)]
    #[case("space d", IdValidationError::InvalidCharacters)]
    fn rejects_malformed_identifiers(#[case] raw: &str, #[case] expected: IdValidationError) {
        assert_eq!(RecordId::new(raw).expect_err("must fail"), expected);
    }
}
