//! Seeded generation of demo accounts and notes.
//!
//! Uses a ChaCha RNG so the same seed always yields the same data, which keeps
//! seeded environments reproducible across machines.

use fake::Fake;
use fake::faker::internet::en::{SafeEmail, Username};
use fake::faker::lorem::en::{Paragraphs, Sentence};
use fake::faker::name::en::Name;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{NOTES_PER_ACCOUNT_MAX, NOTES_PER_ACCOUNT_MIN};

/// A generated account plus the notes it should own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoAccount {
    pub username: String,
    pub email: String,
    pub name: String,
    pub notes: Vec<DemoNote>,
}

/// A generated note body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoNote {
    pub title: String,
    pub content: String,
}

/// Deterministic generator over a seeded ChaCha RNG.
pub struct DemoDataGenerator {
    rng: ChaCha8Rng,
}

impl DemoDataGenerator {
    /// Create a generator whose output is fully determined by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generate `count` accounts, each with 1 to 3 notes.
    ///
    /// Usernames are lowercased, restricted to `[a-z0-9_]`, and suffixed with
    /// their ordinal so a batch never collides with itself.
    pub fn accounts(&mut self, count: usize) -> Vec<DemoAccount> {
        (0..count).map(|ordinal| self.account(ordinal)).collect()
    }

    fn account(&mut self, ordinal: usize) -> DemoAccount {
        let raw_username: String = Username().fake_with_rng(&mut self.rng);
        let username = format!("{}_{ordinal}", sanitize_username(&raw_username));
        let email = format!("{username}@example.com");
        let name: String = Name().fake_with_rng(&mut self.rng);

        let note_count = self
            .rng
            .random_range(NOTES_PER_ACCOUNT_MIN..=NOTES_PER_ACCOUNT_MAX);
        let notes = (0..note_count).map(|_| self.note()).collect();

        DemoAccount {
            username,
            email,
            name,
            notes,
        }
    }

    /// Generate a single note with a short title and a few paragraphs.
    pub fn note(&mut self) -> DemoNote {
        let title: String = Sentence(3..8).fake_with_rng(&mut self.rng);
        let paragraphs: Vec<String> = Paragraphs(1..4).fake_with_rng(&mut self.rng);

        DemoNote {
            title,
            content: paragraphs.join("\n\n"),
        }
    }

    /// Generate a standalone address unrelated to any username.
    pub fn email(&mut self) -> String {
        SafeEmail().fake_with_rng(&mut self.rng)
    }
}

fn sanitize_username(raw: &str) -> String {
    let mut cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    // Leave room for the ordinal suffix under common username length caps.
    cleaned.truncate(16);
    if cleaned.is_empty() {
        "account".to_owned()
    } else {
        cleaned
    }
}
