//! repo::handle
//!
//! The repository handle: the stateful, lock-guarded owner of one local
//! working copy. All engine interaction flows through this type; the raw
//! [`git2::Repository`] is never exposed.
//!
//! # Locking
//!
//! Each handle carries one read/write lock over its facade state. Mutating
//! operations (pull, checkout, add, commit, push) hold the write side for
//! their whole duration, network round-trips included, so they are fully
//! serialized against each other and against reads on the same handle.
//! Reads (head, remotes) share the read side.
//!
//! The engine object itself sits behind a second, inner mutex because
//! libgit2 repository objects are not safe for shared use from multiple
//! threads. Concurrent readers overlap freely in facade state and only
//! serialize for the brief engine primitive call itself. Lock order is
//! always facade lock first, engine mutex second; the engine mutex is never
//! held across a facade lock acquisition, so the pair cannot deadlock.
//!
//! There is no re-entrancy: an operation never invokes another locking
//! operation on the same handle. No cancellation, no timeouts, no retries;
//! long-running network primitives run to completion or failure as the
//! engine decides.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::debug;

use crate::auth::AuthSource;
use crate::error::{RepoError, Result};
use crate::options::{
    compose, AddConfig, CheckoutConfig, CloneConfig, CommitConfig, Identity, Opt, PullConfig,
    PushConfig, RefTarget,
};
use crate::repo::reference::{is_commit_hash, Reference};
use crate::repo::snapshot::{ConfigSnapshot, StatusSummary};

/// Facade state guarded by the handle's read/write lock.
struct FacadeState {
    /// The engine handle. Exclusive to this repository handle; never
    /// shared, never absent once the handle exists.
    engine: Mutex<git2::Repository>,
    /// Persisted-config snapshot; refreshed after clone and pull.
    config: ConfigSnapshot,
}

impl FacadeState {
    fn new(repo: git2::Repository, config: ConfigSnapshot) -> Self {
        Self {
            engine: Mutex::new(repo),
            config,
        }
    }

    /// Lock the engine. A poisoned mutex still holds a structurally valid
    /// engine handle (the panicking operation never commits partial facade
    /// state), so recover the inner value.
    fn engine(&self) -> MutexGuard<'_, git2::Repository> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A handle to one local working copy bound to one remote configuration.
///
/// Obtained from [`Repo::open`] or [`Repo::clone`]; every subsequent
/// operation is a method on the handle. The handle assumes exclusive
/// ownership of the on-disk working copy for its lifetime; opening the
/// same path from two handles (or two processes) is a caller error this
/// crate makes no provision for.
///
/// # Example
///
/// ```no_run
/// use gitshed::{AddConfig, CloneConfig, Repo};
///
/// # fn main() -> gitshed::Result<()> {
/// let repo = Repo::open(
///     "/srv/checkouts/project",
///     vec![CloneConfig::with_uri("https://example.com/team/project.git")],
/// )?;
///
/// repo.add(vec![AddConfig::add_path("notes.md")])?;
/// let hash = repo.commit("add notes", Vec::new())?;
/// repo.push(Vec::new())?;
/// # drop(hash);
/// # Ok(())
/// # }
/// ```
pub struct Repo {
    path: PathBuf,
    /// Bound credential; absent means network operations go unauthenticated
    /// unless the caller supplies one per call.
    auth: Option<Arc<dyn AuthSource>>,
    state: RwLock<FacadeState>,
}

impl std::fmt::Debug for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repo")
            .field("path", &self.path)
            .field("auth", &self.auth.is_some())
            .finish()
    }
}

impl Repo {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Open an existing working copy at `path`.
    ///
    /// Idempotent with respect to path existence: a missing path delegates
    /// entirely to [`Repo::clone`] with the same options, so callers can use
    /// `open` unconditionally.
    ///
    /// # Errors
    ///
    /// - [`RepoError::WrongRepoPath`] when `path` exists but holds no
    ///   repository metadata
    /// - any error [`Repo::clone`] can return, when delegating
    pub fn open(path: impl AsRef<Path>, opts: Vec<Opt<CloneConfig>>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Self::clone(path, opts);
        }
        if !path.join(".git").exists() {
            return Err(RepoError::WrongRepoPath {
                path: path.to_path_buf(),
            });
        }

        let config = compose(opts);
        let repo = git2::Repository::open(path).map_err(RepoError::engine("open repo"))?;
        let snapshot = ConfigSnapshot::read(&repo)?;

        debug!(path = %path.display(), "opened existing working copy");

        Ok(Self {
            path: path.to_path_buf(),
            auth: config.auth,
            state: RwLock::new(FacadeState::new(repo, snapshot)),
        })
    }

    /// Populate `path` from a remote and return a handle to it.
    ///
    /// Creates the directory chain as needed. Refuses to clone over an
    /// existing checkout.
    ///
    /// # Errors
    ///
    /// - [`RepoError::RepoPathNotEmpty`] when `path` already contains a
    ///   repository; nothing on disk is touched in that case
    /// - wrapped engine or I/O errors from directory creation, the clone
    ///   itself, or the config read-back
    pub fn clone(path: impl AsRef<Path>, opts: Vec<Opt<CloneConfig>>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() && path.join(".git").exists() {
            return Err(RepoError::RepoPathNotEmpty {
                path: path.to_path_buf(),
            });
        }

        std::fs::create_dir_all(path).map_err(|source| RepoError::Io {
            stage: "create repo path",
            source,
        })?;

        let config = compose(opts);

        let mut fetch = git2::FetchOptions::new();
        fetch.remote_callbacks(callbacks_for(config.auth.as_deref()));

        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(fetch);
        if let Some(RefTarget::Branch(branch)) = &config.target {
            builder.branch(branch);
        }

        let repo = builder
            .clone(&config.uri, path)
            .map_err(RepoError::engine("clone repository"))?;

        // The builder only understands branches; land on a tag afterwards.
        if let Some(RefTarget::Tag(tag)) = &config.target {
            checkout_tag(&repo, tag)?;
        }

        let snapshot = ConfigSnapshot::read(&repo)?;

        debug!(path = %path.display(), uri = %config.uri, "cloned repository");

        Ok(Self {
            path: path.to_path_buf(),
            auth: config.auth,
            state: RwLock::new(FacadeState::new(repo, snapshot)),
        })
    }

    /// The working copy's filesystem location, as given at construction.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot the current HEAD position.
    ///
    /// # Errors
    ///
    /// Fails when no commit exists yet or HEAD cannot be resolved.
    pub fn head(&self) -> Result<Reference> {
        let state = self.read_state();
        let engine = state.engine();

        let head = engine.head().map_err(RepoError::engine("get repo head"))?;
        let short_name = head.shorthand().unwrap_or("HEAD").to_string();
        let hash = head
            .peel_to_commit()
            .map_err(RepoError::engine("get repo head"))?
            .id()
            .to_string();

        Ok(Reference::new(short_name, hash))
    }

    /// Every configured remote, mapped to its ordered URL list.
    ///
    /// Derived purely from the config snapshot; an empty map (never an
    /// error) when no configuration has been loaded.
    pub fn remotes(&self) -> std::collections::BTreeMap<String, Vec<String>> {
        self.read_state().config.remotes.clone()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Fetch from a remote and merge into the current branch.
    ///
    /// Defaults to the "origin" remote. The engine's "already up to date"
    /// outcome is the success case, not an error. Only fast-forward merges
    /// are performed; diverged histories surface as
    /// [`RepoError::MergeRequired`], since merge resolution is out of scope.
    /// On success the config snapshot is refreshed.
    pub fn pull(&self, opts: Vec<Opt<PullConfig>>) -> Result<()> {
        let config = compose(opts);
        let mut state = self.write_state();
        let state = &mut *state;

        let remote_name = config.remote.as_deref().unwrap_or("origin").to_string();
        let engine = state.engine.get_mut().unwrap_or_else(PoisonError::into_inner);

        let mut remote = match &config.remote_url {
            Some(url) => engine.remote_anonymous(url),
            None => engine.find_remote(&remote_name),
        }
        .map_err(RepoError::engine("look up remote"))?;

        let mut fetch = git2::FetchOptions::new();
        fetch.remote_callbacks(callbacks_for(self.effective_auth(config.auth.as_deref())));

        // Empty refspec list means the remote's configured fetch refspecs.
        let refspecs: Vec<String> = match &config.target {
            Some(RefTarget::Branch(b)) => {
                vec![format!("refs/heads/{b}:refs/remotes/{remote_name}/{b}")]
            }
            Some(RefTarget::Tag(t)) => vec![format!("refs/tags/{t}:refs/tags/{t}")],
            None => Vec::new(),
        };

        remote
            .fetch(&refspecs, Some(&mut fetch), None)
            .map_err(RepoError::engine("fetch from remote"))?;
        drop(remote);

        let fetched = {
            let fetch_head = engine
                .find_reference("FETCH_HEAD")
                .map_err(RepoError::engine("read fetch head"))?;
            engine
                .reference_to_annotated_commit(&fetch_head)
                .map_err(RepoError::engine("read fetch head"))?
        };

        let (analysis, _) = engine
            .merge_analysis(&[&fetched])
            .map_err(RepoError::engine("analyze fetched commits"))?;

        if analysis.is_up_to_date() {
            debug!(remote = %remote_name, "already up to date");
            return Ok(());
        }
        if !analysis.is_fast_forward() {
            return Err(RepoError::MergeRequired {
                remote: remote_name,
            });
        }

        // Fast-forward: advance the current ref and realign the work tree.
        let refname = {
            let head = engine.head().map_err(RepoError::engine("get repo head"))?;
            head.name().unwrap_or("HEAD").to_string()
        };
        let fetched_id = fetched.id();
        drop(fetched);

        engine
            .find_reference(&refname)
            .and_then(|mut r| r.set_target(fetched_id, "pull: fast-forward").map(|_| ()))
            .map_err(RepoError::engine("advance branch"))?;
        engine
            .checkout_head(Some(git2::build::CheckoutBuilder::new().force()))
            .map_err(RepoError::engine("checkout fetched tree"))?;

        state.config = ConfigSnapshot::read(engine)?;

        debug!(remote = %remote_name, hash = %fetched_id, "fast-forwarded");
        Ok(())
    }

    /// Check out a branch or an exact commit.
    ///
    /// A full hex hash checks out that commit detached; anything else is a
    /// branch short name, created at HEAD first when
    /// [`CheckoutConfig::create_branch`] was supplied. Conflicting local
    /// modifications fail the checkout unless forced.
    pub fn checkout(&self, target: &str, opts: Vec<Opt<CheckoutConfig>>) -> Result<()> {
        let config = compose(opts);
        let state = self.write_state();
        let engine = state.engine();

        let mut builder = git2::build::CheckoutBuilder::new();
        if config.force {
            builder.force();
        } else {
            builder.safe();
        }
        if config.keep {
            builder.allow_conflicts(true);
        }

        if is_commit_hash(target) {
            let oid =
                git2::Oid::from_str(target).map_err(RepoError::engine("checkout to commit"))?;
            let commit = engine
                .find_commit(oid)
                .map_err(RepoError::engine("checkout to commit"))?;
            engine
                .checkout_tree(commit.as_object(), Some(&mut builder))
                .map_err(RepoError::engine("checkout to commit"))?;
            engine
                .set_head_detached(oid)
                .map_err(RepoError::engine("checkout to commit"))?;
            debug!(%target, "checked out detached commit");
            return Ok(());
        }

        match engine.find_branch(target, git2::BranchType::Local) {
            Ok(_) => {}
            Err(_) if config.create => {
                let head = engine
                    .head()
                    .and_then(|h| h.peel_to_commit())
                    .map_err(RepoError::engine("checkout branch"))?;
                engine
                    .branch(target, &head, false)
                    .map_err(RepoError::engine("checkout branch"))?;
            }
            Err(e) => return Err(RepoError::engine("checkout branch")(e)),
        }

        let refname = format!("refs/heads/{target}");
        let object = engine
            .revparse_single(&refname)
            .map_err(RepoError::engine("checkout branch"))?;
        engine
            .checkout_tree(&object, Some(&mut builder))
            .map_err(RepoError::engine("checkout branch"))?;
        engine
            .set_head(&refname)
            .map_err(RepoError::engine("checkout branch"))?;

        debug!(%target, create = config.create, "checked out branch");
        Ok(())
    }

    /// Stage files into the index.
    ///
    /// Path, glob, and all selections are not mutually exclusive; whatever
    /// was supplied is applied to the index in turn.
    pub fn add(&self, opts: Vec<Opt<AddConfig>>) -> Result<()> {
        let config = compose(opts);
        let state = self.write_state();
        let engine = state.engine();

        let mut index = engine
            .index()
            .map_err(RepoError::engine("get repo index"))?;

        if config.all {
            index
                .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
                .map_err(RepoError::engine("add files to index"))?;
        }
        if let Some(path) = &config.path {
            let relative = Path::new(path);
            // A vanished file means the caller is staging a deletion.
            let staged = if self.path.join(relative).exists() {
                index.add_path(relative)
            } else {
                index.remove_path(relative)
            };
            staged.map_err(RepoError::engine("add files to index"))?;
        }
        if let Some(glob) = &config.glob {
            index
                .add_all([glob.as_str()], git2::IndexAddOption::DEFAULT, None)
                .map_err(RepoError::engine("add files to index"))?;
        }

        index
            .write()
            .map_err(RepoError::engine("write repo index"))?;
        Ok(())
    }

    /// Create a commit from the staged changes and return its hash.
    ///
    /// With no author supplied, the repository's persisted identity is used
    /// with the current time; the committer defaults to the author. The
    /// working-tree status is read first for diagnostic context; a status
    /// read failure is surfaced as [`RepoError::Status`] with the
    /// last-observed summary attached.
    ///
    /// # Errors
    ///
    /// - [`RepoError::MissingIdentity`] when neither an author option nor a
    ///   configured identity exists
    /// - [`RepoError::NothingToCommit`] when the index matches HEAD
    pub fn commit(&self, message: &str, opts: Vec<Opt<CommitConfig>>) -> Result<String> {
        let config = compose(opts);
        let state = self.write_state();
        let engine = state.engine();

        let author = match config.author {
            Some(identity) => identity,
            None => {
                let name = state.config.user_name.clone().unwrap_or_default();
                let email = state.config.user_email.clone().unwrap_or_default();
                if name.is_empty() && email.is_empty() {
                    return Err(RepoError::MissingIdentity);
                }
                Identity {
                    name,
                    email,
                    when: Utc::now(),
                }
            }
        };
        let committer = config.committer.clone().unwrap_or_else(|| author.clone());

        let status = match StatusSummary::read(&engine) {
            Ok(summary) => summary,
            Err(source) => {
                return Err(RepoError::Status {
                    snapshot: StatusSummary::default(),
                    source,
                })
            }
        };
        debug!(
            staged = status.staged,
            unstaged = status.unstaged,
            untracked = status.untracked,
            "work tree status before commit"
        );

        let mut index = engine
            .index()
            .map_err(RepoError::engine("get repo index"))?;

        if config.all {
            // Stage tracked modifications and deletions, as `git commit -a`.
            index
                .update_all(["*"], None)
                .map_err(RepoError::engine("add files to index"))?;
            index
                .write()
                .map_err(RepoError::engine("write repo index"))?;
        }

        let tree_id = index
            .write_tree()
            .map_err(RepoError::engine("send commit"))?;
        let tree = engine
            .find_tree(tree_id)
            .map_err(RepoError::engine("send commit"))?;

        let parent = match engine.head() {
            Ok(head) => Some(
                head.peel_to_commit()
                    .map_err(RepoError::engine("send commit"))?,
            ),
            // First commit on an unborn branch has no parent.
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                None
            }
            Err(e) => return Err(RepoError::engine("send commit")(e)),
        };

        if let Some(parent) = &parent {
            if parent.tree_id() == tree_id {
                return Err(RepoError::NothingToCommit);
            }
        }

        let author_sig = to_signature(&author)?;
        let committer_sig = to_signature(&committer)?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = engine
            .commit(
                Some("HEAD"),
                &author_sig,
                &committer_sig,
                message,
                &tree,
                &parents,
            )
            .map_err(RepoError::engine("send commit"))?;

        debug!(hash = %oid, "created commit");
        Ok(oid.to_string())
    }

    /// Push the current branch to a remote.
    ///
    /// Defaults to "origin". The effective credential is the handle's bound
    /// one when present, otherwise whatever the caller supplied in options.
    /// Rejected (non-fast-forward) updates surface as engine errors unless
    /// forced.
    pub fn push(&self, opts: Vec<Opt<PushConfig>>) -> Result<()> {
        let config = compose(opts);
        let state = self.write_state();
        let engine = state.engine();

        let refname = {
            let head = engine.head().map_err(RepoError::engine("get repo head"))?;
            if !head.is_branch() {
                return Err(RepoError::DetachedHead);
            }
            head.name().unwrap_or("HEAD").to_string()
        };

        let remote_name = config.remote.as_deref().unwrap_or("origin");
        let mut remote = match &config.remote_url {
            Some(url) => engine.remote_anonymous(url),
            None => engine.find_remote(remote_name),
        }
        .map_err(RepoError::engine("look up remote"))?;

        let prefix = if config.force { "+" } else { "" };
        let mut refspecs = vec![format!("{prefix}{refname}:{refname}")];
        if config.follow_tags {
            // The engine resolves no glob refspecs on push; name each tag.
            let tags = engine
                .references_glob("refs/tags/*")
                .map_err(RepoError::engine("list tags"))?;
            for tag in tags {
                let tag = tag.map_err(RepoError::engine("list tags"))?;
                if let Some(name) = tag.name() {
                    refspecs.push(format!("{prefix}{name}:{name}"));
                }
            }
        }

        let kv: Vec<String> = config
            .options
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        let kv_refs: Vec<&str> = kv.iter().map(String::as_str).collect();

        let mut push_opts = git2::PushOptions::new();
        push_opts.remote_callbacks(callbacks_for(self.effective_auth(config.auth.as_deref())));
        if !kv_refs.is_empty() {
            push_opts.remote_push_options(&kv_refs);
        }

        if config.atomic {
            // One engine push carries every refspec in a single update.
            remote
                .push(&refspecs, Some(&mut push_opts))
                .map_err(RepoError::engine("send push"))?;
        } else {
            for spec in &refspecs {
                remote
                    .push(&[spec.as_str()], Some(&mut push_opts))
                    .map_err(RepoError::engine("send push"))?;
            }
        }

        debug!(remote = %remote_name, force = config.force, "pushed");
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn read_state(&self) -> RwLockReadGuard<'_, FacadeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, FacadeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The credential a network operation should use: the handle's bound
    /// credential wins; a caller-supplied one is honored only in its absence.
    fn effective_auth<'a>(
        &'a self,
        from_opts: Option<&'a dyn AuthSource>,
    ) -> Option<&'a dyn AuthSource> {
        self.auth.as_deref().or(from_opts)
    }
}

/// Build engine callbacks carrying the basic rendering of a credential.
///
/// Without a credential the engine's default (unauthenticated) transport
/// behavior applies.
fn callbacks_for(auth: Option<&dyn AuthSource>) -> git2::RemoteCallbacks<'static> {
    let mut callbacks = git2::RemoteCallbacks::new();
    if let Some(auth) = auth {
        let basic = auth.basic();
        callbacks.credentials(move |_url, username_from_url, allowed| {
            if allowed.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
                let username = if basic.username.is_empty() {
                    username_from_url.unwrap_or("git")
                } else {
                    basic.username.as_str()
                };
                return git2::Cred::userpass_plaintext(username, &basic.secret);
            }
            git2::Cred::default()
        });
    }
    callbacks
}

/// Detach HEAD onto the commit a tag points at.
fn checkout_tag(repo: &git2::Repository, tag: &str) -> Result<()> {
    let refname = format!("refs/tags/{tag}");
    let commit = repo
        .find_reference(&refname)
        .and_then(|r| r.peel_to_commit())
        .map_err(RepoError::engine("checkout to tag"))?;
    repo.checkout_tree(
        commit.as_object(),
        Some(git2::build::CheckoutBuilder::new().force()),
    )
    .map_err(RepoError::engine("checkout to tag"))?;
    repo.set_head_detached(commit.id())
        .map_err(RepoError::engine("checkout to tag"))?;
    Ok(())
}

/// Translate a facade identity into an engine signature.
fn to_signature(identity: &Identity) -> Result<git2::Signature<'static>> {
    let time = git2::Time::new(identity.when.timestamp(), 0);
    git2::Signature::new(&identity.name, &identity.email, &time)
        .map_err(RepoError::engine("resolve commit identity"))
}
