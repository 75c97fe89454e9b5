//! Per-repository collection of commits authored by the configured identity.

use std::path::Path;

use tracing::{info, warn};

use crate::config::IdentityScope;
use crate::errors::RepositoryError;
use crate::git::GitClient;
use crate::models::{timestamp_from_git, Identity, SourceCommit, SourceRepository};

/// Result of collecting from one repository.
#[derive(Debug, Clone)]
pub struct Collected {
    pub repository: SourceRepository,
    /// Matching commits, newest first. Always empty for a bare repository.
    pub commits: Vec<SourceCommit>,
}

impl Collected {
    pub fn skipped(&self) -> bool {
        !self.repository.has_working_tree()
    }
}

/// Collects every commit whose author matches the repository's configured
/// identity by name or by email.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitCollector {
    scope: IdentityScope,
}

impl CommitCollector {
    pub fn new(scope: IdentityScope) -> Self {
        Self { scope }
    }

    /// Open the repository at `path`, drain its matching commits and release
    /// it before returning.
    pub fn collect(&self, path: &Path) -> Result<Collected, RepositoryError> {
        let client = GitClient::open(path).map_err(RepositoryError::access(path))?;

        let repository = SourceRepository {
            path: path.to_path_buf(),
            workdir: client.workdir().map(Path::to_path_buf),
            identity: client
                .identity(self.scope)
                .map_err(RepositoryError::access(path))?,
        };

        if !repository.has_working_tree() {
            warn!(path = %path.display(), "ignoring bare repository");
            return Ok(Collected { repository, commits: Vec::new() });
        }

        let repo_name = repository.display_name();
        let mut commits = Vec::new();
        for info in client.all_commits().map_err(RepositoryError::access(path))? {
            let author = Identity::new(info.author_name, info.author_email);
            if !repository.identity.same_actor(&author) {
                continue;
            }
            let committed_at = timestamp_from_git(info.commit_time, info.commit_offset)
                .ok_or_else(|| RepositoryError::InvalidTimestamp {
                    path: path.to_path_buf(),
                    sha: info.sha.clone(),
                    seconds: info.commit_time,
                    offset_minutes: info.commit_offset,
                })?;
            info!(repo = %repo_name, message = %info.message.trim_end(), "matched commit");
            commits.push(SourceCommit {
                sha: info.sha,
                author,
                committed_at,
                message: info.message,
                repo_name: repo_name.clone(),
            });
        }

        Ok(Collected { repository, commits })
    }
}
