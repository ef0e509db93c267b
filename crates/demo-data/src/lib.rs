//! Deterministic demo account and note generation for seeding.
//!
//! This crate produces believable, reproducible account and note data from a
//! numeric seed. It is independent of backend domain types to avoid circular
//! dependencies: the seeder maps these plain records into its own entities.
//!
//! # Example
//!
//! ```
//! use demo_data::DemoDataGenerator;
//!
//! let mut generator = DemoDataGenerator::new(42);
//! let accounts = generator.accounts(5);
//!
//! assert_eq!(accounts.len(), 5);
//! let mut replay = DemoDataGenerator::new(42);
//! assert_eq!(replay.accounts(5), accounts);
//! ```

mod generator;

pub use generator::{DemoAccount, DemoDataGenerator, DemoNote};

/// Inclusive bounds for the per-account note count produced by
/// [`DemoDataGenerator::accounts`].
pub const NOTES_PER_ACCOUNT_MIN: usize = 1;
/// Upper bound companion to [`NOTES_PER_ACCOUNT_MIN`].
pub const NOTES_PER_ACCOUNT_MAX: usize = 3;
