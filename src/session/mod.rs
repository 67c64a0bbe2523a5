//! Authentication and session persistence
//!
//! # Components
//!
//! - `SessionStore` / `FileSessionStore`: the on-disk session artifact
//! - `AuthenticationFlow`: the login state machine

mod auth;
mod store;

pub use auth::{classify_url, AuthOutcome, AuthState, AuthenticationFlow, UrlClass};
pub use store::{FileSessionStore, SessionArtifact, SessionError, SessionResult, SessionStore};

use std::fmt;

/// Environment variable holding the account username
pub const USERNAME_VAR: &str = "LINKEDIN_USERNAME";

/// Environment variable holding the account password
pub const PASSWORD_VAR: &str = "LINKEDIN_PASSWORD";

/// Account credentials; held in memory only
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reads credentials through `lookup`, e.g. `|k| std::env::var(k).ok()`
    ///
    /// Returns `None` unless both values are present and non-empty.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup(USERNAME_VAR).filter(|v| !v.is_empty())?;
        let password = lookup(PASSWORD_VAR).filter(|v| !v.is_empty())?;
        Some(Self::new(username, password))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
