//! # Credential Check
//!
//! A build is gated by one call to an [`Authenticator`] before any input is
//! read. [`LocalAuthenticator`] checks the invoking account name against an
//! allow-list; deployments backed by a permission service implement the trait
//! themselves.

use std::fmt;

/// Permission a caller must hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// May read inputs and write a build
    Builder,
    /// May only inspect files
    Reader,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Builder => write!(f, "builder"),
            Role::Reader => write!(f, "reader"),
        }
    }
}

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Account name
    pub username: String,
    /// Role that was granted
    pub role: Role,
}

/// Errors from the credential check
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The invoking user could not be determined
    #[error("Cannot determine the invoking user (USER / USERNAME unset)")]
    UnknownUser,

    /// The user does not hold the role
    #[error("User '{username}' is not permitted to act as {role}")]
    PermissionDenied {
        /// Account name
        username: String,
        /// Role that was requested
        role: Role,
    },
}

/// Credential/permission check invoked once per build
pub trait Authenticator {
    /// Confirm the caller holds `role`
    fn authenticate(&self, role: Role) -> Result<Identity, AuthError>;
}

/// Accepts the invoking account when the allow-list is empty or names it
#[derive(Debug, Clone, Default)]
pub struct LocalAuthenticator {
    allowed_users: Vec<String>,
    username: Option<String>,
}

impl LocalAuthenticator {
    /// Authenticator for the account in `USER` (or `USERNAME`)
    pub fn from_env(allowed_users: Vec<String>) -> Self {
        let username = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok()
            .filter(|name| !name.is_empty());
        Self {
            allowed_users,
            username,
        }
    }

    /// Authenticator for an explicit account name
    pub fn for_user(username: impl Into<String>, allowed_users: Vec<String>) -> Self {
        Self {
            allowed_users,
            username: Some(username.into()),
        }
    }
}

impl Authenticator for LocalAuthenticator {
    fn authenticate(&self, role: Role) -> Result<Identity, AuthError> {
        let username = self.username.clone().ok_or(AuthError::UnknownUser)?;
        if !self.allowed_users.is_empty() && !self.allowed_users.contains(&username) {
            return Err(AuthError::PermissionDenied { username, role });
        }
        Ok(Identity { username, role })
    }
}
