//! Local Git repository operations via `git2`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use git2::{
    build::TreeUpdateBuilder, ConfigLevel, ErrorCode, FileMode, Oid, Repository, Signature, Sort,
    Time,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::IdentityScope;
use crate::models::Identity;

/// High-level Git client wrapping a `git2::Repository`.
pub struct GitClient {
    repo: Repository,
    repo_path: PathBuf,
}

/// Information about a single Git commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitCommitInfo {
    pub sha: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub commit_time: i64,
    /// Committer offset from UTC in minutes.
    pub commit_offset: i32,
}

impl GitClient {
    /// Open an existing Git repository at `repo_path`.
    pub fn open<P: AsRef<Path>>(repo_path: P) -> Result<Self, git2::Error> {
        let path = repo_path.as_ref();
        debug!(path = %path.display(), "opening git repository");
        let repo = Repository::open(path)?;
        Ok(Self { repo, repo_path: path.to_path_buf() })
    }

    /// Working tree root, or `None` for a bare repository.
    pub fn workdir(&self) -> Option<&Path> {
        if self.repo.is_bare() {
            None
        } else {
            self.repo.workdir()
        }
    }

    /// Read `user.name` / `user.email`. Missing values come back empty.
    pub fn identity(&self, scope: IdentityScope) -> Result<Identity, git2::Error> {
        let config = self.repo.config()?;
        let config = match scope {
            IdentityScope::Merged => config,
            IdentityScope::Local => match config.open_level(ConfigLevel::Local) {
                Ok(local) => local,
                Err(e) if e.code() == ErrorCode::NotFound => return Ok(Identity::default()),
                Err(e) => return Err(e),
            },
        };
        let read = |key: &str| match config.get_string(key) {
            Ok(value) => Ok(value),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(String::new()),
            Err(e) => Err(e),
        };
        Ok(Identity::new(read("user.name")?, read("user.email")?))
    }

    /// Every commit reachable from any reference or from `HEAD`, newest first.
    pub fn all_commits(&self) -> Result<Vec<GitCommitInfo>, git2::Error> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push_glob("*")?;
        // Detached HEAD is not under refs/.
        if let Ok(head) = self.repo.head() {
            if let Some(oid) = head.target() {
                revwalk.push(oid)?;
            }
        }

        let mut commits = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;
            let author = commit.author();
            let time = commit.time();
            commits.push(GitCommitInfo {
                sha: oid.to_string(),
                message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
                author_name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
                author_email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
                commit_time: time.seconds(),
                commit_offset: time.offset_minutes(),
            });
        }
        debug!(count = commits.len(), path = %self.repo_path.display(), "walked commits");
        Ok(commits)
    }

    /// Stage `rel_path` (relative to the working tree) and return the tree
    /// id of the resulting index.
    #[instrument(skip(self))]
    pub fn stage_path(&self, rel_path: &Path) -> Result<Oid, git2::Error> {
        let mut index = self.repo.index()?;
        index.add_path(rel_path)?;
        index.write()?;
        let tree_oid = index.write_tree()?;
        debug!(tree = %tree_oid, "staged path");
        Ok(tree_oid)
    }

    /// The configured committer identity, stamped with `when`.
    pub fn signature_at(
        &self,
        when: &DateTime<FixedOffset>,
    ) -> Result<Signature<'static>, git2::Error> {
        let configured = self.repo.signature()?;
        let time = Time::new(when.timestamp(), when.offset().local_minus_utc() / 60);
        Signature::new(
            &String::from_utf8_lossy(configured.name_bytes()),
            &String::from_utf8_lossy(configured.email_bytes()),
            &time,
        )
    }

    /// Commit `base_tree` with `rel_path` replaced by `content` on top of `HEAD`.
    pub fn commit_file_at(
        &self,
        base_tree: Oid,
        rel_path: &Path,
        content: &[u8],
        message: &str,
        signature: &Signature<'_>,
    ) -> Result<Oid, git2::Error> {
        let blob = self.repo.blob(content)?;
        let baseline = self.repo.find_tree(base_tree)?;
        let tree_oid = TreeUpdateBuilder::new()
            .upsert(rel_path, blob, FileMode::Blob)
            .create_updated(&self.repo, &baseline)?;
        let tree = self.repo.find_tree(tree_oid)?;
        let parent_commit = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => None,
            Err(e) => return Err(e),
        };
        let parents: Vec<&git2::Commit> = parent_commit.iter().collect();
        let oid = self.repo.commit(Some("HEAD"), signature, signature, message, &tree, &parents)?;
        debug!(sha = %oid, "created commit");
        Ok(oid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit_at(
        repo: &Repository,
        refname: &str,
        name: &str,
        email: &str,
        secs: i64,
        msg: &str,
    ) -> Oid {
        let sig = Signature::new(name, email, &Time::new(secs, 0)).unwrap();
        let tree_oid = repo.treebuilder(None).unwrap().write().unwrap();
        let tree = repo.find_tree(tree_oid).unwrap();
        let parent = repo.refname_to_id(refname).ok().map(|id| repo.find_commit(id).unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some(refname), &sig, &sig, msg, &tree, &parents).unwrap()
    }

    #[test]
    fn test_identity_local_scope() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let mut cfg = repo.config().unwrap().open_level(ConfigLevel::Local).unwrap();
        cfg.set_str("user.name", "Ada").unwrap();

        let client = GitClient::open(dir.path()).unwrap();
        let identity = client.identity(IdentityScope::Local).unwrap();
        assert_eq!(identity.name, "Ada");
        assert_eq!(identity.email, "");
    }

    #[test]
    fn test_all_commits_spans_every_branch() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit_at(&repo, "HEAD", "Ada", "ada@x", 100, "main work");
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.branch("feature", &head, false).unwrap();
        commit_at(&repo, "refs/heads/feature", "Ada", "ada@x", 200, "feature work\n\nbody");

        let client = GitClient::open(dir.path()).unwrap();
        let commits = client.all_commits().unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].message, "feature work\n\nbody");
        assert_eq!(commits[0].commit_time, 200);
        assert_eq!(commits[1].author_name, "Ada");
    }

    #[test]
    fn test_all_commits_on_empty_repo() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let client = GitClient::open(dir.path()).unwrap();
        assert!(client.all_commits().unwrap().is_empty());
    }

    #[test]
    fn test_commit_file_at_sets_time_and_tree() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let mut cfg = repo.config().unwrap().open_level(ConfigLevel::Local).unwrap();
        cfg.set_str("user.name", "Wall").unwrap();
        cfg.set_str("user.email", "wall@x").unwrap();
        std::fs::write(dir.path().join("WALL.log"), "a\nb\n").unwrap();

        let client = GitClient::open(dir.path()).unwrap();
        let base = client.stage_path(Path::new("WALL.log")).unwrap();
        let when = crate::models::timestamp_from_git(1_000, 120).unwrap();
        let sig = client.signature_at(&when).unwrap();
        let oid = client
            .commit_file_at(base, Path::new("WALL.log"), b"a\n", "first", &sig)
            .unwrap();

        let commit = repo.find_commit(oid).unwrap();
        assert_eq!(commit.time().seconds(), 1_000);
        assert_eq!(commit.time().offset_minutes(), 120);
        assert_eq!(commit.author().when().seconds(), 1_000);
        let entry = commit.tree().unwrap().get_name("WALL.log").unwrap().id();
        assert_eq!(repo.find_blob(entry).unwrap().content(), b"a\n");
        assert_eq!(repo.head().unwrap().target(), Some(oid));
    }

    #[test]
    fn test_open_missing_repo_fails() {
        assert!(GitClient::open("/nonexistent/commitwall").is_err());
    }
}
