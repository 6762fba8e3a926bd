//! auth::token
//!
//! Token-based credential provider in the GitLab mold, where one job may be
//! handed several kinds of token at once (a personal access token, the
//! CI job token, a deploy token) and callers populate whichever slots they
//! have.
//!
//! The bearer rendering resolves the slots in a fixed priority order:
//! access, then job, then deploy. First non-empty slot wins; a personal
//! access token always shadows the ambient CI token.

use std::fmt;

use super::{AuthSource, BasicCredential};

/// The named token slots a [`TokenAuth`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Personal or project access token
    Access,
    /// CI job token
    Job,
    /// Deploy token
    Deploy,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Access => "access-token",
            TokenKind::Job => "job-token",
            TokenKind::Deploy => "deploy-token",
        };
        f.write_str(name)
    }
}

/// Credential provider backed by named token slots.
///
/// Constructed once and held immutably by the handle for its lifetime.
/// Empty slots are legal; with every slot empty the provider renders an
/// empty bearer token and network operations proceed unauthenticated.
#[derive(Clone)]
pub struct TokenAuth {
    username: String,
    access: String,
    job: String,
    deploy: String,
}

impl TokenAuth {
    /// Create a provider from a username and the three token slots.
    ///
    /// Pass the empty string for slots you do not have.
    pub fn new(
        username: impl Into<String>,
        access: impl Into<String>,
        job: impl Into<String>,
        deploy: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            access: access.into(),
            job: job.into(),
            deploy: deploy.into(),
        }
    }

    /// The username this provider renders for basic auth.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Read one slot directly, bypassing priority resolution.
    pub fn token_for(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Job => &self.job,
            TokenKind::Deploy => &self.deploy,
        }
    }

    /// Resolve the effective token: access, then job, then deploy.
    fn token(&self) -> &str {
        [&self.access, &self.job, &self.deploy]
            .into_iter()
            .find(|t| !t.is_empty())
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl AuthSource for TokenAuth {
    fn basic(&self) -> BasicCredential {
        BasicCredential {
            username: self.username.clone(),
            secret: self.token().to_string(),
        }
    }

    fn bearer(&self) -> String {
        self.token().to_string()
    }
}

impl fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuth")
            .field("username", &self.username)
            .field("access", &redact(&self.access))
            .field("job", &redact(&self.job))
            .field("deploy", &redact(&self.deploy))
            .finish()
    }
}

fn redact(token: &str) -> &'static str {
    if token.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}
