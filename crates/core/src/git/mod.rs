//! Git operations for commitwall.

pub mod client;

pub use client::{GitClient, GitCommitInfo};
