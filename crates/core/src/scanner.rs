//! Discovery of repository roots under a directory tree.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::errors::ScanError;

/// Name of the metadata directory that marks a repository root.
pub const GIT_DIR_NAME: &str = ".git";

/// Finds every directory below a root that contains a `.git` directory.
///
/// Traversal is depth-first with siblings in file-name order, so repeated
/// scans of an unchanged tree yield the same sequence. Symlinks are not
/// followed and unreadable directories are skipped.
#[derive(Debug, Clone)]
pub struct RepositoryScanner {
    root: PathBuf,
}

impl RepositoryScanner {
    /// Create a scanner rooted at `root`, which must exist.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, ScanError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ScanError::PathNotFound(root.to_path_buf()));
        }
        Ok(Self { root: root.to_path_buf() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily yield repository roots. Each call starts a fresh traversal.
    pub fn scan(&self) -> impl Iterator<Item = PathBuf> {
        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            // Nothing to discover inside a metadata directory.
            .filter_entry(|entry| !is_git_dir(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!(error = %e, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_dir() && entry.path().join(GIT_DIR_NAME).is_dir())
            .map(|entry| {
                debug!(path = %entry.path().display(), "found repository");
                entry.into_path()
            })
    }
}

fn is_git_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == GIT_DIR_NAME
}
