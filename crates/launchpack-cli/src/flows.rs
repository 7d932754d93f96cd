use std::path::Path;
use std::sync::mpsc;
use std::thread;

use anyhow::{anyhow, Result};
use launchpack_installer::{InstallLayout, Installer, ProgressEvent};
use launchpack_release::GitHubClient;
use launchpack_selfupdate::{
    apply_update, check_self_update, download_update, SelfUpdateCheck,
};

use crate::dirs::PORTABLE_FLAG;
use crate::launch::{client_executable, launch_client};
use crate::render::Renderer;
use crate::ProtectAction;

pub(crate) fn status(root: &Path) -> Result<()> {
    let renderer = Renderer::stdout();
    let mut installer = Installer::new(root)?;
    let status = installer.check_status();

    renderer.status("status", &status.message);
    if let Some(installed) = &status.installed_version {
        renderer.status("installed", installed);
    }
    if let Some(latest) = &status.latest_version {
        renderer.status("latest", latest);
    }
    Ok(())
}

pub(crate) fn install(root: &Path, force: bool) -> Result<()> {
    let renderer = Renderer::stdout();
    let mut installer = Installer::new(root)?;
    let status = installer.check_status();
    renderer.status("status", &status.message);

    if !force && !status.update_available {
        return Ok(());
    }

    // The engine runs on a worker thread; this thread owns the terminal and
    // drains the progress channel at its own pace.
    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || installer.install(Some(tx)));

    let mut progress = renderer.start_install_progress();
    for event in rx {
        match event {
            ProgressEvent::Phase(phase) => progress.phase(phase),
            ProgressEvent::Transfer { bytes, total } => progress.transfer(bytes, total),
        }
    }
    progress.finish();

    let outcome = worker
        .join()
        .map_err(|_| anyhow!("install worker panicked"))??;
    for warning in &outcome.warnings {
        renderer.warn(warning);
    }
    let label = if outcome.first_install {
        "installed"
    } else {
        "updated"
    };
    renderer.status(label, &format!("client version {}", outcome.version));
    Ok(())
}

pub(crate) fn launch(root: &Path) -> Result<()> {
    let renderer = Renderer::stdout();
    let layout = InstallLayout::new(root);
    let executable = launch_client(&layout)?;
    renderer.status("launched", &executable.display().to_string());
    Ok(())
}

pub(crate) fn protect(root: &Path, action: ProtectAction) -> Result<()> {
    let renderer = Renderer::stdout();
    let mut installer = Installer::new(root)?;

    match action {
        ProtectAction::Add { name } => {
            if installer.add_protected_folder(&name)? {
                renderer.status("protected", &name);
            } else {
                renderer.status("unchanged", &format!("'{name}' is already protected"));
            }
        }
        ProtectAction::Remove { name } => {
            if installer.remove_protected_folder(&name)? {
                renderer.status("unprotected", &name);
            } else {
                renderer.status("unchanged", &format!("'{name}' was not protected"));
            }
        }
        ProtectAction::List => {
            for folder in installer.protected_folders() {
                println!("{folder}");
            }
        }
    }
    Ok(())
}

pub(crate) fn self_update(root: &Path) -> Result<()> {
    let renderer = Renderer::stdout();
    let mut installer = Installer::new(root)?;
    let config = installer.remote_config().cloned();
    let client = GitHubClient::new()?;

    match check_self_update(&client, config.as_ref())? {
        SelfUpdateCheck::Unsupported { reason } => {
            renderer.status("self-update", &format!("not supported: {reason}"));
        }
        SelfUpdateCheck::Disabled => {
            renderer.status("self-update", "disabled by the launcher config");
        }
        SelfUpdateCheck::UpToDate { current } => {
            renderer.status("self-update", &format!("launcher {current} is up to date"));
        }
        SelfUpdateCheck::Available(update) => {
            renderer.status(
                "self-update",
                &format!("updating launcher {} -> {}", update.current, update.latest),
            );
            let downloaded = download_update(&update)?;
            apply_update(&downloaded)?;
            renderer.status("self-update", "restarting with the new build");
        }
    }
    Ok(())
}

pub(crate) fn doctor(root: &Path) -> Result<()> {
    let installer = Installer::new(root)?;
    let layout = installer.layout();

    println!("root: {}", layout.root().display());
    println!("target: {}", layout.target_dir().display());
    println!("downloads: {}", layout.download_dir().display());
    println!("config: {}", layout.local_config_path().display());
    println!(
        "protected: {}",
        installer.protected_folders().join(", ")
    );
    println!(
        "client: {}",
        client_executable(layout)
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "not found".to_string())
    );

    let portable = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(PORTABLE_FLAG)))
        .is_some_and(|flag| flag.is_file());
    println!("portable: {portable}");
    Ok(())
}
