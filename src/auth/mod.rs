//! auth - credential rendering for network operations
//!
//! A credential bound to a repository handle is opaque to the handle: all it
//! needs is one of two renderings, picked per network primitive. The
//! [`AuthSource`] trait exposes exactly those two renderings:
//!
//! - **basic**: username plus secret, for userpass transports
//! - **bearer**: a single token string, for token transports
//!
//! Concrete providers implement both, even when one degenerates to empty.
//! [`TokenAuth`] is the provider for token-based forges: it holds a username
//! and three independently named token slots and resolves the effective
//! token by fixed priority.
//!
//! # Security
//!
//! Token values must never appear in logs, errors, or debug output. Types in
//! this module implement custom `Debug` to redact secrets.

mod token;

pub use token::{TokenAuth, TokenKind};

use std::fmt;

/// A credential rendered for basic (userpass) transports.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredential {
    /// Username, may be empty for token-only providers
    pub username: String,
    /// Password or token standing in for one
    pub secret: String,
}

impl fmt::Debug for BasicCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredential")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Two renderings of one underlying credential.
///
/// The handle picks whichever rendering the current network primitive
/// requires without knowing the credential's concrete source.
pub trait AuthSource: Send + Sync {
    /// Render as username plus secret.
    fn basic(&self) -> BasicCredential;

    /// Render as a single bearer token.
    ///
    /// Returns the empty string when no token is available.
    fn bearer(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_credential_debug_redacts_the_secret() {
        let credential = BasicCredential {
            username: "ci-bot".to_string(),
            secret: "glpat-sensitive".to_string(),
        };
        let rendered = format!("{credential:?}");
        assert!(rendered.contains("ci-bot"));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("glpat-sensitive"));
    }
}
