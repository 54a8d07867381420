//! Persisted client profile (the username used as the user id).

mod file;
mod memory;

pub use file::FileProfileStore;
pub use memory::MemoryProfileStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// User id sent when no username has been saved.
pub const DEFAULT_USER_ID: &str = "default";

/// Profile errors.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Username must not be empty")]
    EmptyUsername,
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for profile operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Identity sent verbatim as `user_id` on every request.
///
/// `"default"` is a real, stable identity, not an error sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Resolve a stored username, falling back to [`DEFAULT_USER_ID`].
    pub fn resolve(username: Option<&str>) -> Self {
        match username.map(str::trim) {
            Some(name) if !name.is_empty() => Self(name.to_string()),
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_USER_ID
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self(DEFAULT_USER_ID.to_string())
    }
}

impl From<&str> for UserId {
    fn from(name: &str) -> Self {
        Self::resolve(Some(name))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for username persistence backends.
pub trait ProfileStore: Send + Sync {
    /// Load the saved username, if any.
    fn load_username(&self) -> ProfileResult<Option<String>>;

    /// Save a username. Implementations store it trimmed.
    fn save_username(&self, username: &str) -> ProfileResult<()>;

    /// The user id for the saved username.
    fn user_id(&self) -> UserId {
        match self.load_username() {
            Ok(name) => UserId::resolve(name.as_deref()),
            Err(e) => {
                log::warn!("Failed to load username, using default: {}", e);
                UserId::default()
            }
        }
    }
}

/// Trim a username, rejecting blank input.
pub(crate) fn normalize_username(username: &str) -> ProfileResult<&str> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        Err(ProfileError::EmptyUsername)
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        assert_eq!(UserId::resolve(None).as_str(), "default");
        assert_eq!(UserId::resolve(Some("   ")).as_str(), "default");
        assert!(UserId::resolve(Some("")).is_default());
    }

    #[test]
    fn test_resolve_trims() {
        let id = UserId::resolve(Some("  alice "));
        assert_eq!(id.as_str(), "alice");
        assert!(!id.is_default());
    }

    #[test]
    fn test_normalize_rejects_blank() {
        assert!(matches!(normalize_username(" \t"), Err(ProfileError::EmptyUsername)));
        assert_eq!(normalize_username(" bob ").unwrap(), "bob");
    }
}
