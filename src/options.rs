//! Composable per-operation configuration.
//!
//! Every facade operation accepts a list of option mutators instead of a
//! long parameter list. Each mutator is a boxed closure over the operation's
//! config struct; [`compose`] folds them, in call order, into a freshly
//! defaulted value. Later mutators may overwrite fields set by earlier ones
//! (last-write-wins, no conflict detection), and an empty list yields the
//! struct's `Default`, meaning all engine defaults.
//!
//! Mutator constructors live on the config struct they target, so the same
//! spelling can exist for different operations without colliding:
//!
//! ```
//! use gitshed::{CloneConfig, PullConfig};
//!
//! let clone_opts = vec![
//!     CloneConfig::with_uri("https://example.com/team/project.git"),
//!     CloneConfig::with_branch("main"),
//! ];
//! let pull_opts = vec![PullConfig::with_remote("upstream")];
//! # drop((clone_opts, pull_opts));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::auth::AuthSource;

/// A single configuration mutator for the config type `C`.
pub type Opt<C> = Box<dyn FnOnce(&mut C)>;

/// Fold a list of mutators into one config value.
///
/// Applies each mutator in call order to `C::default()`. Generic over every
/// config shape in this module; the fold logic exists exactly once.
pub fn compose<C: Default>(opts: Vec<Opt<C>>) -> C {
    let mut config = C::default();
    for opt in opts {
        opt(&mut config);
    }
    config
}

/// Where a clone or pull should land: a branch or a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    /// A branch short name, e.g. "main"
    Branch(String),
    /// A tag name, e.g. "v1.2.0"
    Tag(String),
}

// =============================================================================
// Clone
// =============================================================================

/// Configuration for [`Repo::clone`](crate::Repo::clone) and
/// [`Repo::open`](crate::Repo::open).
#[derive(Default)]
pub struct CloneConfig {
    pub(crate) uri: String,
    pub(crate) target: Option<RefTarget>,
    pub(crate) auth: Option<Arc<dyn AuthSource>>,
}

impl CloneConfig {
    /// Set the remote URI to clone from.
    pub fn with_uri(uri: impl Into<String>) -> Opt<Self> {
        let uri = uri.into();
        Box::new(move |c| c.uri = uri)
    }

    /// Clone a specific branch and check it out.
    pub fn with_branch(branch: impl Into<String>) -> Opt<Self> {
        let branch = branch.into();
        Box::new(move |c| c.target = Some(RefTarget::Branch(branch)))
    }

    /// Clone and check out a specific tag (detached).
    pub fn with_tag(tag: impl Into<String>) -> Opt<Self> {
        let tag = tag.into();
        Box::new(move |c| c.target = Some(RefTarget::Tag(tag)))
    }

    /// Authenticate network operations with the given credential.
    ///
    /// The credential is bound to the resulting handle for its lifetime.
    pub fn with_auth(auth: Arc<dyn AuthSource>) -> Opt<Self> {
        Box::new(move |c| c.auth = Some(auth))
    }
}

// =============================================================================
// Pull
// =============================================================================

/// Configuration for [`Repo::pull`](crate::Repo::pull).
#[derive(Default)]
pub struct PullConfig {
    pub(crate) remote: Option<String>,
    pub(crate) remote_url: Option<String>,
    pub(crate) target: Option<RefTarget>,
    pub(crate) auth: Option<Arc<dyn AuthSource>>,
}

impl PullConfig {
    /// Pull from a named remote instead of the default "origin".
    pub fn with_remote(remote: impl Into<String>) -> Opt<Self> {
        let remote = remote.into();
        Box::new(move |c| c.remote = Some(remote))
    }

    /// Pull from an explicit URL rather than a configured remote.
    pub fn with_remote_url(url: impl Into<String>) -> Opt<Self> {
        let url = url.into();
        Box::new(move |c| c.remote_url = Some(url))
    }

    /// Fetch a specific branch.
    pub fn with_branch(branch: impl Into<String>) -> Opt<Self> {
        let branch = branch.into();
        Box::new(move |c| c.target = Some(RefTarget::Branch(branch)))
    }

    /// Fetch a specific tag.
    pub fn with_tag(tag: impl Into<String>) -> Opt<Self> {
        let tag = tag.into();
        Box::new(move |c| c.target = Some(RefTarget::Tag(tag)))
    }

    /// Supply a credential for this pull.
    ///
    /// Honored only when the handle has no bound credential; a bound
    /// credential always wins.
    pub fn with_auth(auth: Arc<dyn AuthSource>) -> Opt<Self> {
        Box::new(move |c| c.auth = Some(auth))
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// Configuration for [`Repo::checkout`](crate::Repo::checkout).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub(crate) create: bool,
    pub(crate) force: bool,
    pub(crate) keep: bool,
}

impl CheckoutConfig {
    /// Create the branch at HEAD if it does not exist yet.
    pub fn create_branch() -> Opt<Self> {
        Box::new(|c| c.create = true)
    }

    /// Discard conflicting local modifications instead of failing.
    pub fn force_checkout() -> Opt<Self> {
        Box::new(|c| c.force = true)
    }

    /// Keep local modifications where they do not collide with the target.
    pub fn keep_checkout() -> Opt<Self> {
        Box::new(|c| c.keep = true)
    }
}

// =============================================================================
// Add
// =============================================================================

/// Configuration for [`Repo::add`](crate::Repo::add).
///
/// The selections are not mutually exclusive; the engine index combines
/// whatever was supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddConfig {
    pub(crate) all: bool,
    pub(crate) path: Option<String>,
    pub(crate) glob: Option<String>,
}

impl AddConfig {
    /// Stage every change in the working tree, untracked files included.
    pub fn add_all() -> Opt<Self> {
        Box::new(|c| c.all = true)
    }

    /// Stage a single path, relative to the repository root.
    pub fn add_path(path: impl Into<String>) -> Opt<Self> {
        let path = path.into();
        Box::new(move |c| c.path = Some(path))
    }

    /// Stage everything matching a glob pattern, e.g. `docs/*.md`.
    pub fn add_glob(glob: impl Into<String>) -> Opt<Self> {
        let glob = glob.into();
        Box::new(move |c| c.glob = Some(glob))
    }
}

// =============================================================================
// Commit
// =============================================================================

/// A commit identity: who, plus when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Person's name
    pub name: String,
    /// Person's email
    pub email: String,
    /// Signature timestamp
    pub when: DateTime<Utc>,
}

/// Configuration for [`Repo::commit`](crate::Repo::commit).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitConfig {
    pub(crate) author: Option<Identity>,
    pub(crate) committer: Option<Identity>,
    pub(crate) all: bool,
}

impl CommitConfig {
    /// Set the commit author.
    ///
    /// When absent, the repository's configured identity is used with the
    /// current time.
    pub fn with_author(
        name: impl Into<String>,
        email: impl Into<String>,
        when: DateTime<Utc>,
    ) -> Opt<Self> {
        let identity = Identity {
            name: name.into(),
            email: email.into(),
            when,
        };
        Box::new(move |c| c.author = Some(identity))
    }

    /// Set the committer separately from the author.
    ///
    /// When absent, the committer is the author.
    pub fn with_committer(
        name: impl Into<String>,
        email: impl Into<String>,
        when: DateTime<Utc>,
    ) -> Opt<Self> {
        let identity = Identity {
            name: name.into(),
            email: email.into(),
            when,
        };
        Box::new(move |c| c.committer = Some(identity))
    }

    /// Stage modified and deleted tracked files before committing,
    /// like `git commit -a`.
    pub fn commit_all() -> Opt<Self> {
        Box::new(|c| c.all = true)
    }
}

// =============================================================================
// Push
// =============================================================================

/// Configuration for [`Repo::push`](crate::Repo::push).
#[derive(Default)]
pub struct PushConfig {
    pub(crate) force: bool,
    pub(crate) remote: Option<String>,
    pub(crate) remote_url: Option<String>,
    pub(crate) follow_tags: bool,
    pub(crate) atomic: bool,
    pub(crate) options: BTreeMap<String, String>,
    pub(crate) auth: Option<Arc<dyn AuthSource>>,
}

impl PushConfig {
    /// Force-push, overwriting rejected (non-fast-forward) updates.
    pub fn force_push() -> Opt<Self> {
        Box::new(|c| c.force = true)
    }

    /// Push to a named remote instead of the default "origin".
    pub fn with_remote(remote: impl Into<String>) -> Opt<Self> {
        let remote = remote.into();
        Box::new(move |c| c.remote = Some(remote))
    }

    /// Push to an explicit URL rather than a configured remote.
    pub fn with_remote_url(url: impl Into<String>) -> Opt<Self> {
        let url = url.into();
        Box::new(move |c| c.remote_url = Some(url))
    }

    /// Also push all tags.
    pub fn follow_tags() -> Opt<Self> {
        Box::new(|c| c.follow_tags = true)
    }

    /// Send every refspec in a single engine push rather than one push
    /// per refspec.
    pub fn atomic_push() -> Opt<Self> {
        Box::new(|c| c.atomic = true)
    }

    /// Opaque server-side push options, forwarded verbatim as
    /// `key=value` pairs.
    pub fn with_push_options(options: BTreeMap<String, String>) -> Opt<Self> {
        Box::new(move |c| c.options = options)
    }

    /// Supply a credential for this push.
    ///
    /// Honored only when the handle has no bound credential; a bound
    /// credential always wins.
    pub fn with_auth(auth: Arc<dyn AuthSource>) -> Opt<Self> {
        Box::new(move |c| c.auth = Some(auth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod defaulting {
        use super::*;

        #[test]
        fn zero_mutators_yield_engine_defaults() {
            let clone = compose::<CloneConfig>(Vec::new());
            assert!(clone.uri.is_empty());
            assert!(clone.target.is_none());
            assert!(clone.auth.is_none());

            let pull = compose::<PullConfig>(Vec::new());
            assert!(pull.remote.is_none());
            assert!(pull.remote_url.is_none());
            assert!(pull.target.is_none());
            assert!(pull.auth.is_none());

            assert_eq!(
                compose::<CheckoutConfig>(Vec::new()),
                CheckoutConfig::default()
            );
            assert_eq!(compose::<AddConfig>(Vec::new()), AddConfig::default());
            assert_eq!(compose::<CommitConfig>(Vec::new()), CommitConfig::default());

            let push = compose::<PushConfig>(Vec::new());
            assert!(!push.force);
            assert!(push.remote.is_none());
            assert!(push.remote_url.is_none());
            assert!(!push.follow_tags);
            assert!(!push.atomic);
            assert!(push.options.is_empty());
            assert!(push.auth.is_none());
        }
    }

    mod ordering {
        use super::*;

        #[test]
        fn last_write_wins() {
            let pull = compose(vec![
                PullConfig::with_remote("first"),
                PullConfig::with_remote("second"),
            ]);
            assert_eq!(pull.remote.as_deref(), Some("second"));
        }

        #[test]
        fn mutators_apply_in_call_order() {
            let clone = compose(vec![
                CloneConfig::with_branch("main"),
                CloneConfig::with_tag("v1.0.0"),
            ]);
            assert_eq!(clone.target, Some(RefTarget::Tag("v1.0.0".into())));
        }
    }

    mod shapes {
        use super::*;
        use chrono::TimeZone;

        #[test]
        fn clone_mutators_set_fields() {
            let config = compose(vec![
                CloneConfig::with_uri("https://example.com/a/b.git"),
                CloneConfig::with_branch("develop"),
            ]);
            assert_eq!(config.uri, "https://example.com/a/b.git");
            assert_eq!(config.target, Some(RefTarget::Branch("develop".into())));
        }

        #[test]
        fn checkout_flags_accumulate() {
            let config = compose(vec![
                CheckoutConfig::create_branch(),
                CheckoutConfig::force_checkout(),
            ]);
            assert!(config.create);
            assert!(config.force);
            assert!(!config.keep);
        }

        #[test]
        fn add_selections_are_not_exclusive() {
            let config = compose(vec![
                AddConfig::add_all(),
                AddConfig::add_path("src/lib.rs"),
                AddConfig::add_glob("docs/*.md"),
            ]);
            assert!(config.all);
            assert_eq!(config.path.as_deref(), Some("src/lib.rs"));
            assert_eq!(config.glob.as_deref(), Some("docs/*.md"));
        }

        #[test]
        fn commit_identities_carry_timestamps() {
            let when = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
            let config = compose(vec![
                CommitConfig::with_author("Ada", "ada@example.com", when),
                CommitConfig::commit_all(),
            ]);
            let author = config.author.expect("author set");
            assert_eq!(author.name, "Ada");
            assert_eq!(author.when, when);
            assert!(config.committer.is_none());
            assert!(config.all);
        }

        #[test]
        fn push_options_pass_through() {
            let mut kv = BTreeMap::new();
            kv.insert("ci.skip".to_string(), "true".to_string());
            let config = compose(vec![
                PushConfig::force_push(),
                PushConfig::follow_tags(),
                PushConfig::atomic_push(),
                PushConfig::with_push_options(kv),
            ]);
            assert!(config.force);
            assert!(config.follow_tags);
            assert!(config.atomic);
            assert_eq!(
                config.options.get("ci.skip").map(String::as_str),
                Some("true")
            );
        }
    }
}
