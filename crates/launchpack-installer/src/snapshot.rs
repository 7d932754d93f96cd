use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

/// How many renamed-aside (`.old_<timestamp>`) siblings are kept per base
/// name. Fixed policy, not configurable.
pub(crate) const RENAMED_ASIDE_KEEP: usize = 5;

const ASIDE_MARKER: &str = ".old_";

/// Deletes every immediate child of `target` that is not a protected folder.
/// A child that cannot be deleted (typically a locked file on Windows) is
/// renamed aside with a timestamped `.old_` suffix instead; a child that can
/// be neither deleted nor renamed is recorded as a warning and left in place.
pub fn clean_target(target: &Path, protected: &[String], warnings: &mut Vec<String>) -> Result<()> {
    if !target.exists() {
        return Ok(());
    }

    let entries = fs::read_dir(target)
        .with_context(|| format!("failed to read {}", target.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read {}", target.display()))?;
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if protected.iter().any(|folder| folder.as_str() == name_str) {
            continue;
        }
        // Leftovers from earlier failed deletions are pruned, not re-deleted.
        if let Some(base) = aside_base_name(&name_str) {
            prune_renamed_aside(target, &base, warnings);
            continue;
        }

        let path = entry.path();
        if let Err(err) = remove_any(&path) {
            tracing::warn!("could not delete {}, renaming aside: {err}", path.display());
            match rename_aside(&path) {
                Ok(_) => {
                    prune_renamed_aside(target, &name_str, warnings);
                }
                Err(rename_err) => {
                    warnings.push(format!(
                        "could not remove or rename {}: {rename_err}",
                        path.display()
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Copies each protected folder present under `target` into `staging`.
/// Returns the folder names actually backed up; a folder that fails to copy
/// is skipped with a warning and stays untouched in the target.
pub fn backup_protected(
    target: &Path,
    staging: &Path,
    protected: &[String],
    warnings: &mut Vec<String>,
) -> Result<Vec<String>> {
    let mut backed_up = Vec::new();
    for folder in protected {
        let src = target.join(folder);
        if !src.is_dir() {
            continue;
        }
        let dst = staging.join(folder);
        match copy_dir_recursive(&src, &dst) {
            Ok(()) => backed_up.push(folder.clone()),
            Err(err) => {
                warnings.push(format!("failed backing up {folder}: {err:#}"));
            }
        }
    }
    Ok(backed_up)
}

/// Puts backed-up folders back: whatever the extraction left at each target
/// path is removed first, then the snapshot copy is restored verbatim.
pub fn restore_protected(
    staging: &Path,
    target: &Path,
    warnings: &mut Vec<String>,
) -> Result<()> {
    if !staging.exists() {
        return Ok(());
    }

    let entries = fs::read_dir(staging)
        .with_context(|| format!("failed to read {}", staging.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read {}", staging.display()))?;
        let name = entry.file_name();
        let dest = target.join(&name);
        if dest.exists() {
            if let Err(err) = remove_any(&dest) {
                warnings.push(format!(
                    "failed clearing {} before restore: {err}",
                    dest.display()
                ));
                continue;
            }
        }
        if let Err(err) = copy_dir_recursive(&entry.path(), &dest) {
            warnings.push(format!(
                "failed restoring {}: {err:#}",
                name.to_string_lossy()
            ));
        }
    }
    Ok(())
}

pub(crate) fn rename_aside(path: &Path) -> Result<PathBuf> {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S%3f");
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "entry".to_string());
    let aside = path.with_file_name(format!("{name}{ASIDE_MARKER}{timestamp}"));
    fs::rename(path, &aside)
        .with_context(|| format!("failed to rename {} aside", path.display()))?;
    Ok(aside)
}

/// Bounds the renamed-aside pile: per base name only the
/// [`RENAMED_ASIDE_KEEP`] most recently modified siblings survive. Prune
/// failures are warnings; an undeletable aside was the reason it exists.
pub(crate) fn prune_renamed_aside(dir: &Path, base_name: &str, warnings: &mut Vec<String>) {
    let prefix = format!("{base_name}{ASIDE_MARKER}");
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    let mut asides: Vec<(std::time::SystemTime, PathBuf)> = entries
        .flatten()
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
        .map(|entry| {
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
            (modified, entry.path())
        })
        .collect();

    if asides.len() <= RENAMED_ASIDE_KEEP {
        return;
    }

    // Newest first; ties broken by name so the order is deterministic.
    asides.sort_by(|a, b| b.cmp(a));
    for (_, path) in asides.split_off(RENAMED_ASIDE_KEEP) {
        if let Err(err) = remove_any(&path) {
            warnings.push(format!("failed pruning {}: {err}", path.display()));
        }
    }
}

fn aside_base_name(name: &str) -> Option<String> {
    let index = name.find(ASIDE_MARKER)?;
    let base = &name[..index];
    let suffix = &name[index + ASIDE_MARKER.len()..];
    if base.is_empty() || suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(base.to_string())
}

fn remove_any(path: &Path) -> std::io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

pub(crate) fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).with_context(|| format!("failed to create {}", dst.display()))?;
    for entry in fs::read_dir(src).with_context(|| format!("failed to read {}", src.display()))? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let metadata = fs::symlink_metadata(&src_path)
            .with_context(|| format!("failed to stat {}", src_path.display()))?;
        if metadata.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
            continue;
        }

        #[cfg(unix)]
        if metadata.file_type().is_symlink() {
            let target = fs::read_link(&src_path)
                .with_context(|| format!("failed to read symlink {}", src_path.display()))?;
            std::os::unix::fs::symlink(&target, &dst_path).with_context(|| {
                format!(
                    "failed to create symlink {} -> {}",
                    dst_path.display(),
                    target.display()
                )
            })?;
            continue;
        }

        fs::copy(&src_path, &dst_path).with_context(|| {
            format!(
                "failed to copy {} to {}",
                src_path.display(),
                dst_path.display()
            )
        })?;
    }
    Ok(())
}
