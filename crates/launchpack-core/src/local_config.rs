use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Folders under the target directory that no release may overwrite, unless
/// the operator configured their own set.
pub const DEFAULT_PROTECTED_FOLDERS: [&str; 3] = ["minimap", "conf", "characterdata"];

/// Persisted launcher state, stored as `launcher_config.json` inside the
/// installation root. This record, not the filesystem, is the authority on
/// which client version is installed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalConfig {
    #[serde(default)]
    pub last_version: String,
    #[serde(default)]
    pub last_update: String,
    #[serde(default = "default_protected_folders")]
    pub protected_folders: Vec<String>,
}

fn default_protected_folders() -> Vec<String> {
    DEFAULT_PROTECTED_FOLDERS
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            last_version: String::new(),
            last_update: String::new(),
            protected_folders: default_protected_folders(),
        }
    }
}

impl LocalConfig {
    /// Loads the persisted config. A missing file is a fresh install and
    /// yields defaults; an unreadable or corrupt file also degrades to
    /// defaults so a damaged config never bricks the launcher.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed reading launcher config: {}", path.display()));
            }
        };

        match serde_json::from_str(&raw) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!(
                    "discarding corrupt launcher config {}: {err}",
                    path.display()
                );
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let payload = serde_json::to_string_pretty(self).context("failed serializing config")?;
        fs::write(path, payload)
            .with_context(|| format!("failed writing launcher config: {}", path.display()))
    }

    /// No recorded version means nothing has ever been installed here.
    pub fn is_first_install(&self) -> bool {
        self.last_version.trim().is_empty()
    }

    /// Records a completed install. The caller persists with [`Self::save`].
    pub fn record_install(&mut self, version: &str) {
        self.last_version = version.to_string();
        self.last_update = chrono::Utc::now().to_rfc3339();
    }

    pub fn set_protected_folders(&mut self, folders: Vec<String>) {
        if folders.is_empty() {
            self.protected_folders = default_protected_folders();
        } else {
            self.protected_folders = folders;
        }
    }

    pub fn add_protected_folder(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.protected_folders.iter().any(|folder| folder == name) {
            return false;
        }
        self.protected_folders.push(name.to_string());
        true
    }

    pub fn remove_protected_folder(&mut self, name: &str) -> bool {
        let before = self.protected_folders.len();
        self.protected_folders.retain(|folder| folder != name);
        self.protected_folders.len() != before
    }
}
