//! repo::snapshot
//!
//! Value types captured from the engine at well-defined points: the
//! persisted configuration (at open/clone, refreshed after pull) and a
//! working-tree status summary (before each commit).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{RepoError, Result};

/// Snapshot of the repository's persisted configuration.
///
/// Captured when the handle binds its engine and refreshed after pull.
/// It may be stale between refreshes; callers must not assume it reflects
/// concurrent external changes to the on-disk config.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSnapshot {
    /// Configured `user.name`, if any
    pub user_name: Option<String>,
    /// Configured `user.email`, if any
    pub user_email: Option<String>,
    /// Every configured remote, mapped to its ordered URL list
    pub remotes: BTreeMap<String, Vec<String>>,
}

impl ConfigSnapshot {
    /// Read the persisted configuration out of the engine.
    pub(crate) fn read(repo: &git2::Repository) -> Result<Self> {
        let config = repo
            .config()
            .and_then(|mut c| c.snapshot())
            .map_err(RepoError::engine("read repo config"))?;

        let user_name = config.get_string("user.name").ok();
        let user_email = config.get_string("user.email").ok();

        let mut remotes = BTreeMap::new();
        let names = repo
            .remotes()
            .map_err(RepoError::engine("read repo config"))?;
        for name in names.iter().flatten() {
            // remote.<name>.url is a multivar; collect every URL in order
            let mut urls = Vec::new();
            let key = format!("remote.{name}.url");
            if let Ok(mut entries) = config.entries(Some(&key)) {
                while let Some(Ok(entry)) = entries.next() {
                    if let Some(value) = entry.value() {
                        urls.push(value.to_string());
                    }
                }
            }
            remotes.insert(name.to_string(), urls);
        }

        Ok(Self {
            user_name,
            user_email,
            remotes,
        })
    }
}

/// Summary of working-tree status, read before each commit.
///
/// Attached to [`RepoError::Status`] as diagnostic context when the status
/// read itself fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    /// Number of staged changes
    pub staged: usize,
    /// Number of unstaged changes to tracked files
    pub unstaged: usize,
    /// Number of untracked files
    pub untracked: usize,
    /// Number of unresolved conflicts
    pub conflicted: usize,
}

impl StatusSummary {
    /// Whether the working tree has no changes at all.
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.unstaged == 0 && self.untracked == 0 && self.conflicted == 0
    }

    /// Walk the engine's status list into a summary.
    pub(crate) fn read(repo: &git2::Repository) -> std::result::Result<Self, git2::Error> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true).include_ignored(false);

        let statuses = repo.statuses(Some(&mut opts))?;

        let mut summary = StatusSummary::default();
        for entry in statuses.iter() {
            let status = entry.status();

            if status.is_conflicted() {
                summary.conflicted += 1;
            }
            if status.is_index_new()
                || status.is_index_modified()
                || status.is_index_deleted()
                || status.is_index_renamed()
                || status.is_index_typechange()
            {
                summary.staged += 1;
            }
            if status.is_wt_modified()
                || status.is_wt_deleted()
                || status.is_wt_renamed()
                || status.is_wt_typechange()
            {
                summary.unstaged += 1;
            }
            if status.is_wt_new() {
                summary.untracked += 1;
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod status_summary {
        use super::*;

        #[test]
        fn default_is_clean() {
            assert!(StatusSummary::default().is_clean());
        }

        #[test]
        fn staged_changes_are_not_clean() {
            let summary = StatusSummary {
                staged: 2,
                ..Default::default()
            };
            assert!(!summary.is_clean());
        }

        #[test]
        fn untracked_files_are_not_clean() {
            let summary = StatusSummary {
                untracked: 1,
                ..Default::default()
            };
            assert!(!summary.is_clean());
        }
    }

    #[test]
    fn config_snapshot_defaults_to_no_remotes() {
        let snapshot = ConfigSnapshot::default();
        assert!(snapshot.remotes.is_empty());
        assert!(snapshot.user_name.is_none());
    }
}
