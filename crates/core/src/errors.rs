//! Error types for the commitwall core library.
//!
//! Each pipeline stage has its own error type derived with `thiserror`, and a
//! top-level [`WallError`] enum unifies them for callers that want a single
//! error type. Every variant is fatal for the run; a bare source repository
//! is not an error and never shows up here.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for a commit wall build.
#[derive(Debug, Error)]
pub enum WallError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Scan errors
// ---------------------------------------------------------------------------

/// Errors from repository discovery.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan root does not exist.
    #[error("scan root not found: '{}'", .0.display())]
    PathNotFound(PathBuf),
}

// ---------------------------------------------------------------------------
// Source repository errors
// ---------------------------------------------------------------------------

/// Errors reading a discovered source repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The repository could not be opened, configured, or walked.
    #[error("cannot access repository at '{}': {source}", path.display())]
    AccessFailed {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// A matching commit carries a timestamp chrono cannot represent.
    #[error(
        "commit {sha} in '{}' has an unrepresentable timestamp ({seconds}s, {offset_minutes}min)",
        path.display()
    )]
    InvalidTimestamp {
        path: PathBuf,
        sha: String,
        seconds: i64,
        offset_minutes: i32,
    },
}

impl RepositoryError {
    pub(crate) fn access(path: impl Into<PathBuf>) -> impl FnOnce(git2::Error) -> Self {
        let path = path.into();
        move |source| Self::AccessFailed { path, source }
    }
}

// ---------------------------------------------------------------------------
// Journal errors
// ---------------------------------------------------------------------------

/// Errors writing the journal file.
#[derive(Debug, Error)]
pub enum JournalError {
    /// A stale journal from a previous run could not be deleted.
    #[error("failed to remove journal '{}': {source}", path.display())]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The parent directory of the journal could not be created.
    #[error("failed to create journal directory '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An entry could not be appended.
    #[error("failed to append to journal '{}': {source}", path.display())]
    AppendFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Replay errors
// ---------------------------------------------------------------------------

/// Errors replaying the merged sequence into the target repository.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The target repository could not be opened.
    #[error("target repository not found at '{}': {source}", path.display())]
    TargetNotFound {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// The target repository is bare and cannot hold a journal file.
    #[error("target repository at '{}' has no working tree", .0.display())]
    NoWorkingTree(PathBuf),

    /// The journal file could not be staged.
    #[error("failed to stage '{}': {source}", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// The target repository has no usable committer identity.
    #[error("no committer signature in target repository: {0}")]
    Signature(#[source] git2::Error),

    /// A replay commit could not be created.
    #[error("failed to create replay commit for {sha}: {source}")]
    CommitCreate {
        sha: String,
        #[source]
        source: git2::Error,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading or writing the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
