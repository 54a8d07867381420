//! File-based profile store for native platforms.

use super::{normalize_username, ProfileError, ProfileResult, ProfileStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const PROFILE_FILE: &str = "profile.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
}

/// Stores the profile as `profile.json` in a directory.
pub struct FileProfileStore {
    base_path: PathBuf,
}

impl FileProfileStore {
    /// Create a store in the given directory, creating it if needed.
    pub fn new(base_path: PathBuf) -> ProfileResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                ProfileError::Io(format!("Failed to create profile directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create a store in the default location.
    ///
    /// On Unix: `~/.local/share/infinicraft/`
    /// On Windows: `%LOCALAPPDATA%\infinicraft\`
    pub fn default_location() -> ProfileResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| ProfileError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("infinicraft"))
    }

    pub fn path(&self) -> PathBuf {
        self.base_path.join(PROFILE_FILE)
    }

    fn read(&self) -> ProfileResult<ProfileFile> {
        let path = self.path();
        if !path.exists() {
            return Ok(ProfileFile::default());
        }
        let json = fs::read_to_string(&path)
            .map_err(|e| ProfileError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&json).map_err(|e| {
            ProfileError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

impl ProfileStore for FileProfileStore {
    fn load_username(&self) -> ProfileResult<Option<String>> {
        Ok(self.read()?.username)
    }

    fn save_username(&self, username: &str) -> ProfileResult<()> {
        let profile = ProfileFile {
            username: Some(normalize_username(username)?.to_string()),
        };
        let json = serde_json::to_string_pretty(&profile)
            .map_err(|e| ProfileError::Serialization(e.to_string()))?;
        let path = self.path();
        fs::write(&path, json)
            .map_err(|e| ProfileError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }
}
