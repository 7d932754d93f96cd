use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use launchpack_installer::InstallLayout;

const CLIENT_NAMES: [&str; 2] = ["client.exe", "client"];

/// Finds the installed client executable, probing `bin/` inside the target,
/// the target root, then the installation root.
pub(crate) fn client_executable(layout: &InstallLayout) -> Option<PathBuf> {
    let target = layout.target_dir();
    let candidates = [target.join("bin"), target, layout.root().to_path_buf()];
    for dir in candidates {
        for name in CLIENT_NAMES {
            let path = dir.join(name);
            if path.is_file() {
                return Some(path);
            }
        }
    }
    None
}

/// Starts the client detached; the launcher does not wait for it.
pub(crate) fn launch_client(layout: &InstallLayout) -> Result<PathBuf> {
    let executable = client_executable(layout)
        .ok_or_else(|| anyhow!("no client executable found under {}", layout.root().display()))?;
    let workdir = executable
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| layout.target_dir());

    Command::new(&executable)
        .current_dir(workdir)
        .spawn()
        .with_context(|| format!("failed starting client: {}", executable.display()))?;
    Ok(executable)
}
