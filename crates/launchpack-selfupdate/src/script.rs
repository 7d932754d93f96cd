use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

/// Writes the platform swap script with all paths embedded absolutely. The
/// script outlives this process, so it can never depend on our working
/// directory or environment.
pub(crate) fn write_swap_script(
    dir: &Path,
    current_exe: &Path,
    downloaded: &Path,
    delay_secs: u64,
) -> Result<PathBuf> {
    let script_path = dir.join(if cfg!(windows) {
        "launchpack-swap.cmd"
    } else {
        "launchpack-swap.sh"
    });

    let body = if cfg!(windows) {
        windows_script(current_exe, downloaded, delay_secs)
    } else {
        unix_script(current_exe, downloaded, &script_path, delay_secs)
    };

    fs::write(&script_path, body)
        .with_context(|| format!("failed writing {}", script_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&script_path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("failed setting permissions: {}", script_path.display()))?;
    }

    Ok(script_path)
}

pub(crate) fn spawn_swap_script(script: &Path) -> Result<()> {
    let mut command = if cfg!(windows) {
        let mut command = Command::new("cmd");
        command.arg("/C").arg(script);
        command
    } else {
        let mut command = Command::new("sh");
        command.arg(script);
        command
    };

    command
        .spawn()
        .with_context(|| format!("failed spawning swap script: {}", script.display()))?;
    Ok(())
}

fn unix_script(current_exe: &Path, downloaded: &Path, script_path: &Path, delay_secs: u64) -> String {
    let current = shell_quote(current_exe);
    let source = shell_quote(downloaded);
    let script = shell_quote(script_path);
    format!(
        "#!/bin/sh\n\
         sleep {delay_secs}\n\
         cp -f {source} {current}\n\
         chmod +x {current}\n\
         {current} &\n\
         rm -f {source}\n\
         rm -f {script}\n"
    )
}

fn windows_script(current_exe: &Path, downloaded: &Path, delay_secs: u64) -> String {
    let current = current_exe.display();
    let source = downloaded.display();
    format!(
        "@echo off\r\n\
         timeout /t {delay_secs} /nobreak >nul\r\n\
         copy /y \"{source}\" \"{current}\" >nul\r\n\
         start \"\" \"{current}\"\r\n\
         del \"{source}\"\r\n\
         del \"%~f0\"\r\n"
    )
}

fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', "'\\''"))
}
