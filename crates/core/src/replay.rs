//! Replay of the merged sequence as commits in the target repository.
//!
//! The journal file is staged once, then one commit is created per merged
//! commit, in order, on top of the target's `HEAD`. Commit `i` carries the
//! journal truncated to its first `i + 1` lines and is dated with the
//! original commit's committer time, so the target history reads like the
//! journal being written entry by entry. The last replay commit's tree
//! matches the journal on disk.
//!
//! Nothing records which commits were replayed before: running twice
//! appends a second identical batch.

use std::path::{Path, PathBuf};

use git2::Oid;
use tracing::info;

use crate::errors::ReplayError;
use crate::git::GitClient;
use crate::models::MergedSequence;

pub struct ReplayCommitter {
    client: GitClient,
    workdir: PathBuf,
}

impl ReplayCommitter {
    /// Open the target repository, which must have a working tree.
    pub fn open<P: AsRef<Path>>(target: P) -> Result<Self, ReplayError> {
        let target = target.as_ref();
        let client = GitClient::open(target).map_err(|source| ReplayError::TargetNotFound {
            path: target.to_path_buf(),
            source,
        })?;
        let workdir = client
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| ReplayError::NoWorkingTree(target.to_path_buf()))?;
        Ok(Self { client, workdir })
    }

    /// Working tree root of the target repository.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Create one commit per entry of `sequence`. `journal` is the already
    /// written journal file, relative to the working tree.
    ///
    /// Commits created before a failure are kept.
    pub fn replay(&self, sequence: &MergedSequence, journal: &Path) -> Result<Vec<Oid>, ReplayError> {
        if sequence.is_empty() {
            return Ok(Vec::new());
        }

        let base_tree = self.client.stage_path(journal).map_err(|source| ReplayError::Staging {
            path: journal.to_path_buf(),
            source,
        })?;

        let mut content = String::new();
        let mut created = Vec::with_capacity(sequence.len());
        for (commit, entry) in sequence.iter().zip(sequence.journal_entries()) {
            content.push_str(&format!("{entry}\n"));

            let signature = self
                .client
                .signature_at(&commit.committed_at)
                .map_err(ReplayError::Signature)?;
            let message = format!("{} {}", commit.repo_name, commit.message);
            let oid = self
                .client
                .commit_file_at(base_tree, journal, content.as_bytes(), &message, &signature)
                .map_err(|source| ReplayError::CommitCreate {
                    sha: commit.sha.clone(),
                    source,
                })?;

            info!(sha = %oid, source_sha = %commit.sha, "committed {}", entry.summary);
            created.push(oid);
        }
        Ok(created)
    }
}
