//! repo - the repository handle and its value types
//!
//! The handle is the single doorway to the working copy. All engine
//! interaction flows through [`Repo`]; no other module touches `git2`
//! repository state directly, and the raw engine handle never escapes.
//!
//! # Responsibilities
//!
//! - Lifecycle: idempotent open, clone-into-empty-path
//! - Mutations: pull, checkout, add, commit, push (serialized per handle)
//! - Reads: head snapshot, remote listing (concurrent per handle)
//! - Credential injection for every network primitive
//!
//! # Invariants
//!
//! - At most one mutating operation runs at a time against a handle
//! - The engine handle is owned exclusively and never exposed
//! - Sentinel errors are returned before the engine is ever invoked

mod handle;
mod reference;
mod snapshot;

pub use handle::Repo;
pub use reference::Reference;
pub use snapshot::{ConfigSnapshot, StatusSummary};
