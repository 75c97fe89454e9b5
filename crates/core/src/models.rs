//! Domain model types shared by the pipeline stages.
//!
//! These types flow from the collector through the merger to the journal
//! writer and the replay committer.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in journal lines, e.g. `2024-03-01 09:15:00+01:00`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A `(name, email)` pair claimed as a commit author or configured in a
/// repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Two identities belong to the same actor when either the name or the
    /// email matches.
    pub fn same_actor(&self, other: &Identity) -> bool {
        self.name == other.name || self.email == other.email
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

// ---------------------------------------------------------------------------
// Source repository
// ---------------------------------------------------------------------------

/// A discovered repository, as seen by the collector.
#[derive(Debug, Clone)]
pub struct SourceRepository {
    /// Path the repository was opened from.
    pub path: PathBuf,
    /// Working tree root, `None` for bare repositories.
    pub workdir: Option<PathBuf>,
    /// Identity configured in the repository.
    pub identity: Identity,
}

impl SourceRepository {
    pub fn has_working_tree(&self) -> bool {
        self.workdir.is_some()
    }

    /// Final path component of the working tree, falling back to the opened
    /// path for bare repositories.
    pub fn display_name(&self) -> String {
        display_name(self.workdir.as_deref().unwrap_or(&self.path))
    }
}

/// Last component of `path`, ignoring trailing separators.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// An authored commit collected from a source repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCommit {
    /// Full hex object id.
    pub sha: String,
    pub author: Identity,
    /// Committer time in the committer's own offset.
    pub committed_at: DateTime<FixedOffset>,
    /// Full commit message, untrimmed.
    pub message: String,
    /// Display name of the repository the commit was first found in.
    pub repo_name: String,
}

impl SourceCommit {
    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.split('\n').next().unwrap_or("")
    }
}

/// Convert a git timestamp (seconds plus offset in minutes) to a chrono value.
///
/// Out-of-range offsets fall back to UTC.
pub fn timestamp_from_git(seconds: i64, offset_minutes: i32) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(offset_minutes * 60)
        .or_else(|| FixedOffset::east_opt(0))?;
    offset.timestamp_opt(seconds, 0).single()
}

// ---------------------------------------------------------------------------
// Merged sequence
// ---------------------------------------------------------------------------

/// Deduplicated commits in non-decreasing committed-time order.
///
/// Only [`crate::merger::CommitMerger`] constructs one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedSequence {
    commits: Vec<SourceCommit>,
}

impl MergedSequence {
    pub(crate) fn from_sorted(commits: Vec<SourceCommit>) -> Self {
        Self { commits }
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceCommit> {
        self.commits.iter()
    }

    pub fn as_slice(&self) -> &[SourceCommit] {
        &self.commits
    }

    /// Journal projection, one entry per commit in the same order.
    pub fn journal_entries(&self) -> Vec<JournalEntry> {
        self.commits.iter().map(JournalEntry::from).collect()
    }
}

impl<'a> IntoIterator for &'a MergedSequence {
    type Item = &'a SourceCommit;
    type IntoIter = std::slice::Iter<'a, SourceCommit>;

    fn into_iter(self) -> Self::IntoIter {
        self.commits.iter()
    }
}

// ---------------------------------------------------------------------------
// Journal entry
// ---------------------------------------------------------------------------

/// One journal line: `<timestamp> <sha> <repo-name> <summary>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: DateTime<FixedOffset>,
    pub sha: String,
    pub repo_name: String,
    pub summary: String,
}

impl From<&SourceCommit> for JournalEntry {
    fn from(commit: &SourceCommit) -> Self {
        Self {
            timestamp: commit.committed_at,
            sha: commit.sha.clone(),
            repo_name: commit.repo_name.clone(),
            summary: commit.summary().to_string(),
        }
    }
}

impl fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.sha,
            self.repo_name,
            self.summary
        )
    }
}

impl JournalEntry {
    /// Parse a journal line (with or without its trailing newline).
    ///
    /// The repository name runs up to the next space. Directory names that
    /// contain spaces need [`JournalEntry::parse_with_repos`].
    pub fn parse(line: &str) -> Option<Self> {
        let (timestamp, sha, rest) = Self::parse_head(line)?;
        let (repo_name, summary) = rest.split_once(' ').unwrap_or((rest, ""));
        Some(Self::assemble(timestamp, sha, repo_name, summary))
    }

    /// Parse a journal line whose repository name is one of `repo_names`.
    /// The longest name that fits wins.
    pub fn parse_with_repos<'a, I>(line: &str, repo_names: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (timestamp, sha, rest) = Self::parse_head(line)?;
        let repo_name = repo_names
            .into_iter()
            .filter(|name| !name.is_empty())
            .filter(|name| match rest.strip_prefix(*name) {
                Some(tail) => tail.is_empty() || tail.starts_with(' '),
                None => false,
            })
            .max_by_key(|name| name.len())?;
        let tail = &rest[repo_name.len()..];
        let summary = tail.strip_prefix(' ').unwrap_or(tail);
        Some(Self::assemble(timestamp, sha, repo_name, summary))
    }

    /// Split off the timestamp and hash, leaving `<repo-name> <summary>`.
    fn parse_head(line: &str) -> Option<(DateTime<FixedOffset>, &str, &str)> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let mut parts = line.splitn(4, ' ');
        let date = parts.next()?;
        let time = parts.next()?;
        let sha = parts.next()?;
        let rest = parts.next()?;

        let timestamp =
            DateTime::parse_from_str(&format!("{date} {time}"), TIMESTAMP_FORMAT).ok()?;
        if sha.is_empty() || !sha.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some((timestamp, sha, rest))
    }

    fn assemble(timestamp: DateTime<FixedOffset>, sha: &str, repo_name: &str, summary: &str) -> Self {
        Self {
            timestamp,
            sha: sha.to_string(),
            repo_name: repo_name.to_string(),
            summary: summary.to_string(),
        }
    }
}
