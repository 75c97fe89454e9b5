//! commitwall core library.
//!
//! Builds a single chronological journal of a person's commits scattered
//! across many local repositories, and mirrors it as a linear history of
//! replay commits in one target repository. Source repositories are only
//! ever read.

pub mod builder;
pub mod collector;
pub mod config;
pub mod errors;
pub mod git;
pub mod journal;
pub mod merger;
pub mod models;
pub mod replay;
pub mod scanner;

// Re-exports for convenience.
pub use builder::{BuildOptions, BuildOutcome, BuildStats, WallBuilder};
pub use config::WallConfig;
pub use errors::WallError;
pub use models::{Identity, JournalEntry, MergedSequence, SourceCommit};
