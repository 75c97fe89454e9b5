//! The commit wall build pipeline.
//!
//! [`WallBuilder::build`] runs one full pass:
//!
//! 1. Discover repositories under the collection path.
//! 2. Collect authored commits from each, one repository at a time.
//! 3. Deduplicate and sort them into a [`MergedSequence`].
//! 4. Rewrite the journal file in the target working tree.
//! 5. Replay the sequence as commits in the target repository.
//!
//! Any failure aborts the run and leaves the journal and target history as
//! far as they got.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::collector::CommitCollector;
use crate::config::{validate_journal_file, IdentityScope, WallConfig};
use crate::errors::WallError;
use crate::journal::JournalWriter;
use crate::merger::CommitMerger;
use crate::models::MergedSequence;
use crate::replay::ReplayCommitter;
use crate::scanner::RepositoryScanner;

/// Knobs for a build.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub identity_scope: IdentityScope,
    /// When `false`, only the journal is written.
    pub replay: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { identity_scope: IdentityScope::Merged, replay: true }
    }
}

impl From<&WallConfig> for BuildOptions {
    fn from(config: &WallConfig) -> Self {
        Self {
            identity_scope: config.identity.scope,
            replay: config.replay.enabled,
        }
    }
}

/// Statistics from a single build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub repositories_found: usize,
    pub repositories_skipped: usize,
    pub commits_matched: usize,
    pub duplicates_dropped: usize,
    pub journal_entries: usize,
    pub replay_commits: usize,
    pub journal_path: PathBuf,
}

/// A completed build: the merged sequence plus its statistics.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub sequence: MergedSequence,
    pub stats: BuildStats,
}

#[derive(Debug, Clone, Default)]
pub struct WallBuilder {
    options: BuildOptions,
}

impl WallBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Scan, collect and merge without touching the target.
    pub fn merge_collection(&self, collection: &Path) -> Result<BuildOutcome, WallError> {
        let scanner = RepositoryScanner::new(collection)?;
        let collector = CommitCollector::new(self.options.identity_scope);

        let mut stats = BuildStats::default();
        let mut merger = CommitMerger::new();
        for path in scanner.scan() {
            stats.repositories_found += 1;
            let collected = collector.collect(&path)?;
            if collected.skipped() {
                stats.repositories_skipped += 1;
                continue;
            }
            stats.commits_matched += collected.commits.len();
            merger.extend(collected.commits);
        }
        stats.duplicates_dropped = merger.duplicates();

        let sequence = merger.finish();
        info!(
            repositories = stats.repositories_found,
            skipped = stats.repositories_skipped,
            commits = sequence.len(),
            duplicates = stats.duplicates_dropped,
            "merged commits"
        );
        Ok(BuildOutcome { sequence, stats })
    }

    /// Run the full pipeline into `target`, writing `journal_file` in its
    /// working tree.
    pub fn build(
        &self,
        collection: &Path,
        target: &Path,
        journal_file: &str,
    ) -> Result<BuildOutcome, WallError> {
        let journal_rel = validate_journal_file(journal_file)?;
        warn_if_nested(collection, target);

        let mut outcome = self.merge_collection(collection)?;
        let committer = ReplayCommitter::open(target)?;

        let writer = JournalWriter::new(committer.workdir().join(&journal_rel));
        outcome.stats.journal_path = writer.path().to_path_buf();
        outcome.stats.journal_entries = writer.write(&outcome.sequence)?;

        if self.options.replay {
            let created = committer.replay(&outcome.sequence, &journal_rel)?;
            outcome.stats.replay_commits = created.len();
        } else {
            info!("replay disabled, target history left untouched");
        }

        info!(
            entries = outcome.stats.journal_entries,
            replayed = outcome.stats.replay_commits,
            "commit wall built"
        );
        Ok(outcome)
    }
}

/// A target inside the collection gets scanned like any other repository.
fn warn_if_nested(collection: &Path, target: &Path) {
    if let (Ok(collection), Ok(target)) = (collection.canonicalize(), target.canonicalize()) {
        if target.starts_with(&collection) {
            warn!(
                target = %target.display(),
                "target repository lies inside the collection and will be scanned too"
            );
        }
    }
}
