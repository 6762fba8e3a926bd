//! repo::reference
//!
//! Read-only view of a named pointer into history.

use std::fmt;

use serde::Serialize;

/// An immutable snapshot of a ref: short name plus resolved commit hash.
///
/// Produced only by [`Repo::head`](crate::Repo::head). It has no lifecycle
/// of its own: it reflects the position at the time of the call and goes
/// stale the moment the handle mutates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    short_name: String,
    hash: String,
}

impl Reference {
    pub(crate) fn new(short_name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            hash: hash.into(),
        }
    }

    /// The ref's short name, e.g. "main", or "HEAD" when detached.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// The resolved commit hash as a lowercase hex string.
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.short_name, self.hash)
    }
}

/// Check whether a checkout target is a full commit hash.
///
/// SHA-1 hashes are 40 hex characters, SHA-256 hashes are 64. Anything else
/// is treated as a branch short name.
pub(crate) fn is_commit_hash(target: &str) -> bool {
    (target.len() == 40 || target.len() == 64)
        && target.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_and_display() {
        let reference = Reference::new("main", "a".repeat(40));
        assert_eq!(reference.short_name(), "main");
        assert_eq!(reference.hash().len(), 40);
        assert!(reference.to_string().starts_with("main ("));
    }

    #[test]
    fn serializes_with_named_fields() {
        let reference = Reference::new("main", "b".repeat(40));
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json["short_name"], "main");
        assert_eq!(json["hash"].as_str().unwrap().len(), 40);
    }

    #[test]
    fn hash_detection() {
        assert!(is_commit_hash(&"a".repeat(40)));
        assert!(is_commit_hash(&"F".repeat(64)));
        assert!(!is_commit_hash("main"));
        assert!(!is_commit_hash(&"g".repeat(40)));
        assert!(!is_commit_hash(&"a".repeat(39)));
    }
}
