use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};

use crate::snapshot::rename_aside;

/// Unpacks a downloaded release archive into `target`.
///
/// Entries whose first path segment names a protected folder are skipped
/// outright, so an archive can never overwrite user data even when the
/// publisher packed those folders. Entries that escape the target (absolute
/// or `..` paths) are skipped with a warning. A destination file that cannot
/// be created, typically because it is locked, is renamed aside and retried
/// once, then skipped with a warning. An unreadable archive is a hard error.
pub fn extract_archive(
    archive_path: &Path,
    target: &Path,
    protected: &[String],
    warnings: &mut Vec<String>,
) -> Result<()> {
    let file = fs::File::open(archive_path)
        .with_context(|| format!("failed to open archive: {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("failed to read archive: {}", archive_path.display()))?;

    fs::create_dir_all(target)
        .with_context(|| format!("failed to create {}", target.display()))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("failed to read archive: {}", archive_path.display()))?;

        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            warnings.push(format!("skipping unsafe archive path: {}", entry.name()));
            continue;
        };
        if first_segment_is_protected(&relative, protected) {
            tracing::debug!("skipping protected archive entry: {}", entry.name());
            continue;
        }

        let dest = target.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&dest)
                .with_context(|| format!("failed to create {}", dest.display()))?;
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let mut out = match fs::File::create(&dest) {
            Ok(out) => out,
            Err(_) => {
                // Locked destination: move it aside and try once more.
                if let Err(err) = rename_aside(&dest) {
                    warnings.push(format!(
                        "skipping locked entry {}: {err:#}",
                        dest.display()
                    ));
                    continue;
                }
                match fs::File::create(&dest) {
                    Ok(out) => out,
                    Err(err) => {
                        warnings.push(format!(
                            "skipping unwritable entry {}: {err}",
                            dest.display()
                        ));
                        continue;
                    }
                }
            }
        };

        io::copy(&mut entry, &mut out)
            .with_context(|| format!("failed writing {}", dest.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dest, fs::Permissions::from_mode(mode))
                .with_context(|| format!("failed setting permissions: {}", dest.display()))?;
        }
    }

    Ok(())
}

fn first_segment_is_protected(relative: &Path, protected: &[String]) -> bool {
    let Some(first) = relative.components().next() else {
        return false;
    };
    let first = first.as_os_str().to_string_lossy();
    protected.iter().any(|folder| folder.as_str() == first)
}
