//! Global deduplication and chronological ordering of collected commits.
//!
//! Commits are accumulated in discovery order. A commit whose hash has been
//! seen before is dropped, so when forks share history the repository that
//! was scanned first keeps the attribution. [`CommitMerger::finish`] then
//! stable-sorts by committed time, which keeps discovery order among equal
//! timestamps.
//!
//! Everything is held in memory until the sort. Each repository's commits
//! already arrive newest first, so a k-way merge of per-repository streams
//! would produce the same output should collections ever grow too large for
//! that.

use std::collections::HashSet;

use crate::models::{MergedSequence, SourceCommit};

#[derive(Debug, Default)]
pub struct CommitMerger {
    seen: HashSet<String>,
    commits: Vec<SourceCommit>,
    duplicates: usize,
}

impl CommitMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate one commit. Returns `false` if its hash was already seen.
    pub fn push(&mut self, commit: SourceCommit) -> bool {
        if !self.seen.insert(commit.sha.clone()) {
            self.duplicates += 1;
            return false;
        }
        self.commits.push(commit);
        true
    }

    /// Accumulate a batch, returning how many commits were new.
    pub fn extend<I: IntoIterator<Item = SourceCommit>>(&mut self, commits: I) -> usize {
        let mut added = 0;
        for commit in commits {
            if self.push(commit) {
                added += 1;
            }
        }
        added
    }

    /// Number of commits dropped as duplicates so far.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn finish(self) -> MergedSequence {
        let mut commits = self.commits;
        // `sort_by_key` is stable.
        commits.sort_by_key(|c| c.committed_at);
        MergedSequence::from_sorted(commits)
    }
}

/// Merge batches given in scan order.
pub fn merge<I, B>(batches: I) -> MergedSequence
where
    I: IntoIterator<Item = B>,
    B: IntoIterator<Item = SourceCommit>,
{
    let mut merger = CommitMerger::new();
    for batch in batches {
        merger.extend(batch);
    }
    merger.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{timestamp_from_git, Identity};

    fn commit(sha: &str, secs: i64, repo: &str) -> SourceCommit {
        SourceCommit {
            sha: sha.into(),
            author: Identity::new("Ada", "ada@x"),
            committed_at: timestamp_from_git(secs, 0).unwrap(),
            message: format!("{sha} message\n"),
            repo_name: repo.into(),
        }
    }

    fn shas(seq: &MergedSequence) -> Vec<&str> {
        seq.iter().map(|c| c.sha.as_str()).collect()
    }

    #[test]
    fn test_interleaves_repositories_by_time() {
        let a = vec![commit("a3", 3000, "a"), commit("a2", 2000, "a"), commit("a1", 1000, "a")];
        let b = vec![commit("b1", 1500, "b")];
        let merged = merge([a, b]);
        assert_eq!(shas(&merged), vec!["a1", "b1", "a2", "a3"]);
    }

    #[test]
    fn test_first_discovered_duplicate_wins() {
        let fork_a = vec![commit("shared", 100, "upstream"), commit("mine", 200, "upstream")];
        let fork_b = vec![commit("shared", 100, "fork"), commit("theirs", 150, "fork")];

        let mut merger = CommitMerger::new();
        assert_eq!(merger.extend(fork_a), 2);
        assert_eq!(merger.extend(fork_b), 1);
        assert_eq!(merger.duplicates(), 1);

        let merged = merger.finish();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.as_slice()[0].repo_name, "upstream");
        assert_eq!(shas(&merged), vec!["shared", "theirs", "mine"]);
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let merged = merge([
            vec![commit("x", 500, "a"), commit("early", 10, "a")],
            vec![commit("y", 500, "b")],
            vec![commit("z", 500, "c")],
        ]);
        assert_eq!(shas(&merged), vec!["early", "x", "y", "z"]);
    }

    #[test]
    fn test_orders_instants_across_offsets() {
        let mut east = commit("east", 1000, "a");
        east.committed_at = timestamp_from_git(1000, 600).unwrap();
        let west = commit("west", 999, "b");
        let merged = merge([vec![east], vec![west]]);
        assert_eq!(shas(&merged), vec!["west", "east"]);
    }

    #[test]
    fn test_output_is_non_decreasing() {
        let batch: Vec<_> = [7, 3, 9, 3, 1, 8, 2]
            .iter()
            .enumerate()
            .map(|(i, t)| commit(&format!("c{i}"), *t, "r"))
            .collect();
        let merged = merge([batch]);
        let times: Vec<i64> = merged.iter().map(|c| c.committed_at.timestamp()).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(merged.len(), 7);
    }

    #[test]
    fn test_empty_input() {
        let merged = merge(Vec::<Vec<SourceCommit>>::new());
        assert!(merged.is_empty());
    }
}
