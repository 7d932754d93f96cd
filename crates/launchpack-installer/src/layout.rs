use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Paths inside one installation directory. The engine owns the
/// `downloadclient` scratch dir, the `client` target dir and the persisted
/// launcher config; it never deletes the root itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scratch area downloads are staged into before extraction.
    pub fn download_dir(&self) -> PathBuf {
        self.root.join("downloadclient")
    }

    /// The directory releases are installed into.
    pub fn target_dir(&self) -> PathBuf {
        self.root.join("client")
    }

    pub fn local_config_path(&self) -> PathBuf {
        self.root.join("launcher_config.json")
    }

    /// Plain-text marker mirroring the installed version, for humans and
    /// external tools. The JSON config remains the authority.
    pub fn version_marker_path(&self) -> PathBuf {
        self.target_dir().join("version.txt")
    }

    pub fn archive_path(&self, asset_name: &str) -> PathBuf {
        self.download_dir().join(asset_name)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    /// Per-attempt staging dir for protected-folder snapshots. Never cleaned
    /// up by the engine, so every attempt gets a fresh timestamped dir.
    pub fn backup_staging_dir(&self, timestamp: &str) -> PathBuf {
        self.backups_dir().join(timestamp)
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [self.root.clone(), self.download_dir(), self.target_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}
