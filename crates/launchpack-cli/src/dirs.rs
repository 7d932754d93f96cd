use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Marker file next to the executable that switches the launcher to portable
/// mode: everything lives beside the binary instead of the user profile.
pub(crate) const PORTABLE_FLAG: &str = "portable.flag";

/// Resolves the installation directory: explicit override, then portable
/// mode, then the platform default.
pub(crate) fn install_root(override_dir: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir);
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            if let Some(portable) = portable_root_from(exe_dir) {
                return Ok(portable);
            }
        }
    }

    default_install_root()
}

pub(crate) fn portable_root_from(exe_dir: &Path) -> Option<PathBuf> {
    exe_dir
        .join(PORTABLE_FLAG)
        .is_file()
        .then(|| exe_dir.join("launchpack"))
}

fn default_install_root() -> Result<PathBuf> {
    if cfg!(windows) {
        let app_data = std::env::var("LOCALAPPDATA")
            .context("LOCALAPPDATA is not set; cannot resolve installation directory")?;
        return Ok(PathBuf::from(app_data).join("Launchpack"));
    }

    let home =
        std::env::var("HOME").context("HOME is not set; cannot resolve installation directory")?;
    let modern = PathBuf::from(&home).join(".local/share/launchpack");
    // Installations from before the XDG move keep working where they are.
    let legacy = PathBuf::from(&home).join(".launchpack");
    if legacy.is_dir() && !modern.exists() {
        return Ok(legacy);
    }
    Ok(modern)
}
