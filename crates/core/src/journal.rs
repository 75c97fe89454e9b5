//! Journal file writer.
//!
//! The journal is rebuilt from scratch on every run. Each entry is appended
//! with its own open/write so an interrupted run leaves a valid prefix.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::JournalError;
use crate::models::{JournalEntry, MergedSequence};

pub struct JournalWriter {
    path: PathBuf,
}

impl JournalWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete any existing journal, then append one line per commit.
    ///
    /// Returns the number of entries written. An empty sequence leaves no
    /// file behind.
    pub fn write(&self, sequence: &MergedSequence) -> Result<usize, JournalError> {
        self.remove_existing()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !sequence.is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| JournalError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        for commit in sequence {
            self.append(&JournalEntry::from(commit))?;
        }

        info!(path = %self.path.display(), entries = sequence.len(), "journal written");
        Ok(sequence.len())
    }

    fn remove_existing(&self) -> Result<(), JournalError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed previous journal");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(JournalError::RemoveFailed { path: self.path.clone(), source }),
        }
    }

    fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        let append_failed = |source: std::io::Error| JournalError::AppendFailed {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(append_failed)?;
        file.write_all(format!("{entry}\n").as_bytes()).map_err(append_failed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merger::merge;
    use crate::models::{timestamp_from_git, Identity, SourceCommit};

    fn sequence() -> MergedSequence {
        let commit = |sha: &str, secs: i64, msg: &str| SourceCommit {
            sha: sha.into(),
            author: Identity::new("Ada", "ada@x"),
            committed_at: timestamp_from_git(secs, 0).unwrap(),
            message: msg.into(),
            repo_name: "engine".into(),
        };
        merge([vec![commit("bb", 20, "Second\n\nbody"), commit("aa", 10, "First\n")]])
    }

    #[test]
    fn test_writes_one_line_per_commit() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JournalWriter::new(dir.path().join("WALL.log"));
        assert_eq!(writer.write(&sequence()).unwrap(), 2);

        let content = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(
            content,
            "1970-01-01 00:00:10+00:00 aa engine First\n\
             1970-01-01 00:00:20+00:00 bb engine Second\n"
        );
    }

    #[test]
    fn test_rebuilds_instead_of_appending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("WALL.log");
        std::fs::write(&path, "stale line\n").unwrap();

        let writer = JournalWriter::new(&path);
        writer.write(&sequence()).unwrap();
        let first = std::fs::read(&path).unwrap();
        writer.write(&sequence()).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert!(!String::from_utf8(first).unwrap().contains("stale"));
    }

    #[test]
    fn test_empty_sequence_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/WALL.log");
        let writer = JournalWriter::new(&path);
        assert_eq!(writer.write(&MergedSequence::default()).unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs/wall/WALL.log");
        JournalWriter::new(&path).write(&sequence()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_unremovable_journal_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the journal's place cannot be removed with remove_file.
        let path = dir.path().join("WALL.log");
        std::fs::create_dir_all(&path).unwrap();
        let result = JournalWriter::new(&path).write(&sequence());
        assert!(matches!(result, Err(JournalError::RemoveFailed { .. })));
    }
}
