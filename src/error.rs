//! Error taxonomy for the repository facade.
//!
//! Errors fall into three categories:
//!
//! - **Precondition errors**: returned before any engine call, with stable
//!   identity: [`RepoError::WrongRepoPath`], [`RepoError::RepoPathNotEmpty`].
//!   Callers compare these structurally with `matches!`, never by message.
//! - **Engine errors**: any failure from the underlying git engine, wrapped
//!   with a short stage label ("open repo", "clone repository", "send push",
//!   ...) so the failing step is identifiable without a call stack. The
//!   originating [`git2::Error`] is preserved as the source.
//! - **Benign non-errors**: the engine's "already up to date" outcome from
//!   pull is success, not an error, and never appears here.
//!
//! There is no internal retry. Every non-benign failure is surfaced
//! immediately to the caller, who owns any retry policy.

use std::path::PathBuf;

use thiserror::Error;

use crate::repo::StatusSummary;

/// Errors from facade operations.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Path exists on disk but holds no recognizable repository metadata.
    #[error("wrong repo path: {path} is not a repository")]
    WrongRepoPath {
        /// The offending path
        path: PathBuf,
    },

    /// Path already contains a repository; refuse to clone over it.
    #[error("repo path {path} already contains a repository")]
    RepoPathNotEmpty {
        /// The offending path
        path: PathBuf,
    },

    /// An engine primitive failed. `stage` names the failing step.
    #[error("{stage}: {source}")]
    Engine {
        /// Short label for the failing stage, e.g. "clone repository"
        stage: &'static str,
        /// The underlying engine error
        #[source]
        source: git2::Error,
    },

    /// Filesystem preparation failed before the engine was invoked.
    #[error("{stage}: {source}")]
    Io {
        /// Short label for the failing stage, e.g. "create repo path"
        stage: &'static str,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The pre-commit status read failed.
    ///
    /// Carries the last-observed (possibly partial) status summary as
    /// diagnostic context rather than discarding it.
    #[error("check work tree status: {source}")]
    Status {
        /// Whatever status was observed before the failure
        snapshot: StatusSummary,
        /// The underlying engine error
        #[source]
        source: git2::Error,
    },

    /// Pull found diverged histories.
    ///
    /// Merging is out of scope for this crate; resolve the divergence with
    /// your merge tool of choice and pull again.
    #[error("pull from {remote}: histories have diverged and need a merge")]
    MergeRequired {
        /// The remote that was pulled from
        remote: String,
    },

    /// No author identity was supplied and none is configured.
    #[error("no commit identity: supply an author or configure user.name and user.email")]
    MissingIdentity,

    /// The index matches HEAD; there is nothing staged to commit.
    #[error("clean work tree: nothing staged to commit")]
    NothingToCommit,

    /// HEAD is not on a branch, so there is no ref to push.
    #[error("cannot push: HEAD is detached")]
    DetachedHead,
}

impl RepoError {
    /// Wrap an engine error with a stage label.
    ///
    /// Returns a closure so call sites read as
    /// `.map_err(RepoError::engine("send push"))`.
    pub(crate) fn engine(stage: &'static str) -> impl FnOnce(git2::Error) -> RepoError {
        move |source| RepoError::Engine { stage, source }
    }
}

/// Result type alias using [`RepoError`].
pub type Result<T> = std::result::Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_compare_structurally() {
        let err = RepoError::WrongRepoPath {
            path: PathBuf::from("/tmp/not-a-repo"),
        };
        assert!(matches!(err, RepoError::WrongRepoPath { .. }));
        assert!(!matches!(err, RepoError::RepoPathNotEmpty { .. }));
    }

    #[test]
    fn engine_errors_carry_the_stage_label() {
        let err = RepoError::engine("send push")(git2::Error::from_str("boom"));
        assert!(err.to_string().starts_with("send push"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn status_error_keeps_the_snapshot() {
        let err = RepoError::Status {
            snapshot: StatusSummary::default(),
            source: git2::Error::from_str("status walk failed"),
        };
        match err {
            RepoError::Status { snapshot, .. } => assert!(snapshot.is_clean()),
            _ => unreachable!(),
        }
    }
}
