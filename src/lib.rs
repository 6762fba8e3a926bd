//! gitshed - a concurrency-safe facade over a local git working copy
//!
//! This crate opens, clones, synchronizes, and mutates a single local
//! checkout behind a narrow, stable operation set, so callers never touch
//! the git engine's native API. The engine (libgit2 via `git2`) is an
//! external collaborator reached only through a handful of primitives.
//!
//! # Architecture
//!
//! - [`repo`] - the lock-guarded repository handle and its value types
//! - [`options`] - composable per-operation configuration
//! - [`auth`] - credential rendering for network operations
//! - [`error`] - precondition sentinels and stage-labelled engine errors
//!
//! # Correctness invariants
//!
//! 1. Mutating operations on one handle never interleave
//! 2. The raw engine handle never escapes the facade
//! 3. The handle's bound credential overrides caller-supplied auth
//! 4. Precondition errors are returned before the engine is invoked
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gitshed::{CloneConfig, PushConfig, Repo, TokenAuth};
//!
//! # fn main() -> gitshed::Result<()> {
//! let auth = Arc::new(TokenAuth::new("ci-bot", "", "job-token-value", ""));
//!
//! // Open is idempotent: a missing path clones instead.
//! let repo = Repo::open(
//!     "checkouts/project",
//!     vec![
//!         CloneConfig::with_uri("https://example.com/team/project.git"),
//!         CloneConfig::with_auth(auth),
//!     ],
//! )?;
//!
//! repo.pull(Vec::new())?;
//! let head = repo.head()?;
//! println!("at {head}");
//!
//! repo.push(vec![PushConfig::follow_tags()])?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod options;
pub mod repo;

pub use auth::{AuthSource, BasicCredential, TokenAuth, TokenKind};
pub use error::{RepoError, Result};
pub use options::{
    compose, AddConfig, CheckoutConfig, CloneConfig, CommitConfig, Identity, Opt, PullConfig,
    PushConfig, RefTarget,
};
pub use repo::{ConfigSnapshot, Reference, Repo, StatusSummary};
