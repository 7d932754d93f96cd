use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use anyhow::{Context, Result};
use chrono::Utc;
use launchpack_core::{is_newer_version, strip_release_prefix, LocalConfig, RemoteConfig};
use launchpack_release::{
    download_to_file, fetch_remote_config, resolve_download, GitHubClient, ReleaseSource,
};

use crate::extract::extract_archive;
use crate::layout::InstallLayout;
use crate::snapshot::{backup_protected, clean_target, restore_protected};

/// Executable names probed when no version record exists but a client might
/// already be on disk.
const CLIENT_EXECUTABLE_CANDIDATES: [&str; 4] =
    ["client.exe", "client", "bin/client.exe", "bin/client"];

/// Install pipeline states, in execution order. Each maps to a fixed overall
/// percentage checkpoint; byte-level progress within the download phase
/// arrives as separate transfer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
    ResolvingRelease,
    Downloading,
    Cleaning,
    BackingUp,
    Extracting,
    Restoring,
    Finalizing,
    Complete,
}

impl InstallPhase {
    pub fn percent(&self) -> u8 {
        match self {
            Self::ResolvingRelease => 5,
            Self::Downloading => 10,
            Self::Cleaning => 55,
            Self::BackingUp => 60,
            Self::Extracting => 80,
            Self::Restoring => 85,
            Self::Finalizing => 90,
            Self::Complete => 100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ResolvingRelease => "resolving release",
            Self::Downloading => "downloading",
            Self::Cleaning => "cleaning",
            Self::BackingUp => "backing up",
            Self::Extracting => "extracting",
            Self::Restoring => "restoring",
            Self::Finalizing => "finalizing",
            Self::Complete => "complete",
        }
    }
}

/// Progress stream the host drains at its own pace. Send failures are
/// ignored: a host that dropped its receiver forfeits progress, not the
/// install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Phase(InstallPhase),
    Transfer { bytes: u64, total: u64 },
}

/// Terminal result of a completed install. Per-item failures that were
/// tolerated along the way are aggregated here rather than logged and lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub version: String,
    pub first_install: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallStatus {
    pub installed_version: Option<String>,
    pub latest_version: Option<String>,
    pub update_available: bool,
    pub first_install: bool,
    pub message: String,
}

/// Drives one installation directory through the resolve → download → clean →
/// backup → extract → restore → finalize pipeline. Owns the persisted local
/// config and a per-session cache of the remote one; at most one orchestrator
/// may run per installation directory.
#[derive(Debug)]
pub struct Installer {
    layout: InstallLayout,
    client: GitHubClient,
    source: ReleaseSource,
    local: LocalConfig,
    remote: Option<RemoteConfig>,
    config_fetched: bool,
}

impl Installer {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let layout = InstallLayout::new(root);
        let local = LocalConfig::load(&layout.local_config_path())?;
        Ok(Self {
            layout,
            client: GitHubClient::new()?,
            source: ReleaseSource::default(),
            local,
            remote: None,
            config_fetched: false,
        })
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    pub fn local_config(&self) -> &LocalConfig {
        &self.local
    }

    /// Remote config for this session, fetched once and cached. A successful
    /// fetch may redirect the release source via repository overrides.
    pub fn remote_config(&mut self) -> Option<&RemoteConfig> {
        if !self.config_fetched {
            let fetched = fetch_remote_config(&self.client, &self.source);
            if let Some(config) = &fetched {
                self.source.apply_override(config);
            }
            self.remote = fetched;
            self.config_fetched = true;
        }
        self.remote.as_ref()
    }

    /// Discards the session cache so the next access re-fetches.
    pub fn refresh_remote_config(&mut self) {
        self.remote = None;
        self.config_fetched = false;
        self.source = ReleaseSource::default();
    }

    pub fn protected_folders(&self) -> &[String] {
        &self.local.protected_folders
    }

    pub fn add_protected_folder(&mut self, name: &str) -> Result<bool> {
        let added = self.local.add_protected_folder(name);
        if added {
            self.local.save(&self.layout.local_config_path())?;
        }
        Ok(added)
    }

    pub fn remove_protected_folder(&mut self, name: &str) -> Result<bool> {
        let removed = self.local.remove_protected_folder(name);
        if removed {
            self.local.save(&self.layout.local_config_path())?;
        }
        Ok(removed)
    }

    /// Reports what is installed and what is available, without changing
    /// anything. Network trouble degrades to "could not check", never an
    /// error.
    pub fn check_status(&mut self) -> InstallStatus {
        let installed = self.installed_version();
        let first_install = installed.is_none();
        let config = self.remote_config().cloned();
        let latest = self.latest_available_version(config.as_ref());
        let direct_link = config
            .as_ref()
            .is_some_and(|config| config.direct_download_link().is_some());

        let update_available = match (&installed, &latest) {
            (Some(installed), Some(latest)) => is_newer_version(latest, installed),
            (None, Some(_)) => true,
            // A direct download link is a reachable source even when it
            // publishes no version, so a fresh install is still offered.
            (None, None) => direct_link,
            (Some(_), None) => false,
        };

        let message = match (&installed, &latest) {
            (Some(installed), Some(latest)) if update_available => {
                format!("update available: {installed} -> {latest}")
            }
            (Some(installed), Some(_)) => format!("client {installed} is up to date"),
            (Some(installed), None) if direct_link => {
                format!("client {installed} installed; release source publishes no version")
            }
            (Some(installed), None) => {
                format!("client {installed} installed; could not check for updates")
            }
            (None, Some(latest)) => format!("no client installed, version {latest} available"),
            (None, None) if direct_link => {
                "no client installed, download available from the configured link".to_string()
            }
            (None, None) => "no client installed and no release source reachable".to_string(),
        };

        InstallStatus {
            installed_version: installed,
            latest_version: latest,
            update_available,
            first_install,
            message,
        }
    }

    /// Whether an unattended host should install without asking.
    pub fn auto_install_enabled(&mut self) -> bool {
        self.remote_config()
            .map(RemoteConfig::auto_install_updates)
            .unwrap_or(false)
    }

    /// Full pipeline: resolve, download into scratch, then hand off to
    /// [`Self::install_from_archive`]. Nothing in the target is touched until
    /// the download has fully succeeded.
    pub fn install(&mut self, progress: Option<Sender<ProgressEvent>>) -> Result<InstallOutcome> {
        self.layout.ensure_base_dirs()?;

        emit(progress.as_ref(), ProgressEvent::Phase(InstallPhase::ResolvingRelease));
        let config = self.remote_config().cloned();
        let resolved = resolve_download(&self.client, config.as_ref(), &self.source)?;
        tracing::info!(
            "resolved release '{}' asset '{}'",
            resolved.version,
            resolved.asset_name
        );

        emit(progress.as_ref(), ProgressEvent::Phase(InstallPhase::Downloading));
        let archive = self.layout.archive_path(&resolved.asset_name);
        let transfer_progress = progress.clone();
        download_to_file(&resolved.download_url, &archive, |bytes, total| {
            emit(
                transfer_progress.as_ref(),
                ProgressEvent::Transfer { bytes, total },
            );
        })?;

        self.install_from_archive(&archive, &resolved.version, progress)
    }

    /// Installs an already-downloaded archive: clean, backup (updates only),
    /// extract, restore, finalize. Re-running with the same archive and
    /// version succeeds and converges to the same target state.
    pub fn install_from_archive(
        &mut self,
        archive: &Path,
        version: &str,
        progress: Option<Sender<ProgressEvent>>,
    ) -> Result<InstallOutcome> {
        self.layout.ensure_base_dirs()?;
        let mut warnings = Vec::new();
        let first_install = self.local.is_first_install();
        let protected = self.effective_protected();
        let target = self.layout.target_dir();

        emit(progress.as_ref(), ProgressEvent::Phase(InstallPhase::Cleaning));
        clean_target(&target, &protected, &mut warnings)?;

        let mut staging = None;
        if !first_install {
            emit(progress.as_ref(), ProgressEvent::Phase(InstallPhase::BackingUp));
            let timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
            let dir = self.layout.backup_staging_dir(&timestamp);
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            backup_protected(&target, &dir, &protected, &mut warnings)?;
            staging = Some(dir);
        }

        emit(progress.as_ref(), ProgressEvent::Phase(InstallPhase::Extracting));
        extract_archive(archive, &target, &protected, &mut warnings)?;

        if let Some(staging) = &staging {
            emit(progress.as_ref(), ProgressEvent::Phase(InstallPhase::Restoring));
            restore_protected(staging, &target, &mut warnings)?;
        }

        emit(progress.as_ref(), ProgressEvent::Phase(InstallPhase::Finalizing));
        // Marker first: a finalize that records a version must leave a marker
        // that agrees with it, so a marker failure aborts before the config
        // is touched.
        let marker = self.layout.version_marker_path();
        fs::write(&marker, format!("{version}\n"))
            .with_context(|| format!("failed writing {}", marker.display()))?;
        self.local.set_protected_folders(protected.clone());
        self.local.record_install(version);
        self.local.save(&self.layout.local_config_path())?;

        emit(progress.as_ref(), ProgressEvent::Phase(InstallPhase::Complete));
        tracing::info!("install of '{version}' finished with {} warnings", warnings.len());

        Ok(InstallOutcome {
            version: version.to_string(),
            first_install,
            warnings,
        })
    }

    /// Best available answer for "what is installed here": the config record,
    /// then the version marker, then a bare executable probe (reported as
    /// "unknown", which always compares older than any release).
    pub fn installed_version(&self) -> Option<String> {
        if !self.local.is_first_install() {
            return Some(self.local.last_version.clone());
        }

        if let Ok(marker) = fs::read_to_string(self.layout.version_marker_path()) {
            let marker = marker.trim();
            if !marker.is_empty() {
                return Some(marker.to_string());
            }
        }

        let target = self.layout.target_dir();
        if CLIENT_EXECUTABLE_CANDIDATES
            .iter()
            .any(|candidate| target.join(candidate).is_file())
        {
            return Some("unknown".to_string());
        }
        None
    }

    fn latest_available_version(&self, config: Option<&RemoteConfig>) -> Option<String> {
        if let Some(config) = config {
            if config.direct_download_link().is_some() {
                // The link short-circuits resolution, so the tag is the only
                // version information there is; never fall through to the API.
                return config
                    .release_tag()
                    .map(|tag| strip_release_prefix(tag).to_string());
            }
        }

        let lookup = match config.and_then(RemoteConfig::release_tag) {
            Some(tag) => self
                .client
                .release_by_tag(&self.source.owner, &self.source.repo, tag),
            None => self.client.latest_release(&self.source.owner, &self.source.repo),
        };
        match lookup {
            Ok(release) => Some(release.version()),
            Err(err) => {
                tracing::debug!("release lookup failed: {err:#}");
                None
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn set_remote_config(&mut self, config: RemoteConfig) {
        self.remote = Some(config);
        self.config_fetched = true;
    }

    fn effective_protected(&self) -> Vec<String> {
        self.remote
            .as_ref()
            .and_then(RemoteConfig::protected_folders)
            .unwrap_or_else(|| self.local.protected_folders.clone())
    }
}

fn emit(progress: Option<&Sender<ProgressEvent>>, event: ProgressEvent) {
    if let Some(tx) = progress {
        let _ = tx.send(event);
    }
}
