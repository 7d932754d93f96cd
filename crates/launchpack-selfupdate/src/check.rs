use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use launchpack_core::{is_newer_version, ReleaseAsset, RemoteConfig};
use launchpack_release::{download_to_file, GitHubClient};

use crate::script::{spawn_swap_script, write_swap_script};

const COMPILED_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Executable names that mean "we are not the real launcher binary": the
/// process is being driven by a toolchain or interpreter and must not
/// overwrite it.
const INTERPRETER_NAMES: [&str; 5] = ["cargo", "rustc", "python", "python3", "sh"];

/// What a self-update check concluded. Unsupported and Disabled are ordinary
/// values, not errors: a development build or an opted-out config is a normal
/// way to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfUpdateCheck {
    /// This process cannot safely replace its own binary.
    Unsupported { reason: String },
    /// The hosted config did not opt in, or named no launcher repository.
    Disabled,
    UpToDate { current: String },
    Available(LauncherUpdate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherUpdate {
    pub current: String,
    pub latest: String,
    pub asset_name: String,
    pub download_url: String,
}

/// Decides whether a newer launcher build exists. Network trouble during the
/// release lookup is the only error path; everything else is a status.
pub fn check_self_update(
    client: &GitHubClient,
    config: Option<&RemoteConfig>,
) -> Result<SelfUpdateCheck> {
    check_inner(client, config, unsupported_reason())
}

pub(crate) fn check_inner(
    client: &GitHubClient,
    config: Option<&RemoteConfig>,
    unsupported: Option<String>,
) -> Result<SelfUpdateCheck> {
    if let Some(reason) = unsupported {
        return Ok(SelfUpdateCheck::Unsupported { reason });
    }

    let Some(config) = config else {
        return Ok(SelfUpdateCheck::Disabled);
    };
    if !config.launcher_updates_enabled() {
        return Ok(SelfUpdateCheck::Disabled);
    }
    let Some((owner, repo)) = config.launcher_repository() else {
        return Ok(SelfUpdateCheck::Disabled);
    };

    let current = config
        .current_launcher_version
        .as_deref()
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .unwrap_or(COMPILED_VERSION)
        .to_string();

    let release = client.latest_release(owner, repo)?;
    let latest = release.version();
    if !is_newer_version(&latest, &current) {
        return Ok(SelfUpdateCheck::UpToDate { current });
    }

    let Some(asset) = pick_launcher_asset(&release.assets) else {
        tracing::warn!("launcher release '{latest}' has no assets, skipping");
        return Ok(SelfUpdateCheck::UpToDate { current });
    };

    Ok(SelfUpdateCheck::Available(LauncherUpdate {
        current,
        latest,
        asset_name: asset.name.clone(),
        download_url: asset.download_url.clone(),
    }))
}

/// Downloads the new launcher binary into an isolated temp directory and
/// returns its path. The running binary is untouched; a failure here leaves
/// nothing to clean up but the temp dir.
pub fn download_update(update: &LauncherUpdate) -> Result<PathBuf> {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or(0);
    let dir = std::env::temp_dir().join(format!(
        "launchpack-update-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let dest = dir.join(&update.asset_name);
    download_to_file(&update.download_url, &dest, |_, _| {})?;
    Ok(dest)
}

/// Swaps the running binary for `downloaded` by handing the copy to a
/// detached platform script, then returns so the caller can exit. The script
/// waits for this process to go away, copies the new binary over the current
/// executable path, relaunches it and deletes both the download and itself.
pub fn apply_update(downloaded: &Path) -> Result<()> {
    let current_exe =
        std::env::current_exe().context("failed resolving current executable path")?;
    let script_dir = downloaded
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir);

    let script = write_swap_script(&script_dir, &current_exe, downloaded, 2)?;
    spawn_swap_script(&script)?;
    tracing::info!("swap script spawned, exiting for replacement");
    Ok(())
}

/// Why this process must not self-replace, or `None` when it safely can.
fn unsupported_reason() -> Option<String> {
    if cfg!(debug_assertions) {
        return Some("development build".to_string());
    }

    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(err) => return Some(format!("cannot resolve executable path: {err}")),
    };
    let name = exe
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if INTERPRETER_NAMES.iter().any(|known| *known == name) {
        return Some(format!("running under interpreter '{name}'"));
    }
    None
}

/// Picks the release asset most likely to be the launcher binary: a name
/// mentioning "launcher" wins, then a platform-executable extension, then
/// whatever is first.
pub(crate) fn pick_launcher_asset(assets: &[ReleaseAsset]) -> Option<&ReleaseAsset> {
    if let Some(named) = assets
        .iter()
        .find(|asset| asset.name.to_ascii_lowercase().contains("launcher"))
    {
        return Some(named);
    }
    if cfg!(windows) {
        if let Some(exe) = assets
            .iter()
            .find(|asset| asset.name.to_ascii_lowercase().ends_with(".exe"))
        {
            return Some(exe);
        }
    }
    assets.first()
}
