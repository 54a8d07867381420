//! In-memory profile store.

use super::{normalize_username, ProfileError, ProfileResult, ProfileStore};
use std::sync::RwLock;

/// In-memory profile store for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryProfileStore {
    username: RwLock<Option<String>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a username.
    pub fn with_username(username: &str) -> Self {
        Self {
            username: RwLock::new(Some(username.to_string())),
        }
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load_username(&self) -> ProfileResult<Option<String>> {
        let username = self
            .username
            .read()
            .map_err(|e| ProfileError::Io(format!("Lock error: {}", e)))?;
        Ok(username.clone())
    }

    fn save_username(&self, username: &str) -> ProfileResult<()> {
        let trimmed = normalize_username(username)?;
        let mut stored = self
            .username
            .write()
            .map_err(|e| ProfileError::Io(format!("Lock error: {}", e)))?;
        *stored = Some(trimmed.to_string());
        Ok(())
    }
}
