use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use launchpack_core::{LocalConfig, RemoteConfig};

use super::orchestrator::{InstallPhase, ProgressEvent};
use super::snapshot::{prune_renamed_aside, RENAMED_ASIDE_KEEP};
use super::*;

fn test_root(label: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    path.push(format!(
        "launchpack-installer-tests-{label}-{}-{}",
        std::process::id(),
        nanos
    ));
    fs::create_dir_all(&path).expect("must create test root");
    path
}

fn build_archive(path: &Path, entries: &[(&str, &[u8])]) {
    let file = fs::File::create(path).expect("must create archive file");
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default();
    for (name, bytes) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(name.trim_end_matches('/'), options)
                .expect("must add directory");
        } else {
            writer.start_file(*name, options).expect("must start file");
            writer.write_all(bytes).expect("must write entry");
        }
    }
    writer.finish().expect("must finish archive");
}

fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("must create parent");
    }
    fs::write(path, contents).expect("must write file");
}

#[test]
fn extraction_skips_protected_entries() {
    let root = test_root("extract-skip");
    let archive = root.join("release.zip");
    build_archive(
        &archive,
        &[
            ("client.exe", b"binary".as_slice()),
            ("minimap/fresh.bin", b"packed".as_slice()),
            ("data/art.dat", b"art".as_slice()),
        ],
    );

    let target = root.join("client");
    let mut warnings = Vec::new();
    extract_archive(
        &archive,
        &target,
        &["minimap".to_string()],
        &mut warnings,
    )
    .expect("extraction must succeed");

    assert!(target.join("client.exe").is_file());
    assert!(target.join("data/art.dat").is_file());
    assert!(!target.join("minimap").exists(), "protected entry must be skipped");
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");

    let _ = fs::remove_dir_all(root);
}

#[test]
fn clean_preserves_protected_children() {
    let root = test_root("clean");
    let target = root.join("client");
    write_file(&target.join("minimap/marks.bin"), b"marks");
    write_file(&target.join("stale.dll"), b"stale");
    write_file(&target.join("old-data/things.dat"), b"things");

    let mut warnings = Vec::new();
    clean_target(&target, &["minimap".to_string()], &mut warnings)
        .expect("clean must succeed");

    assert!(target.join("minimap/marks.bin").is_file());
    assert!(!target.join("stale.dll").exists());
    assert!(!target.join("old-data").exists());
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");

    let _ = fs::remove_dir_all(root);
}

#[test]
fn backup_and_restore_round_trip() {
    let root = test_root("backup-restore");
    let target = root.join("client");
    write_file(&target.join("minimap/marks.bin"), b"marks");
    write_file(&target.join("conf/settings.cfg"), b"settings");

    let staging = root.join("staging");
    let protected = vec!["minimap".to_string(), "conf".to_string(), "absent".to_string()];
    let mut warnings = Vec::new();
    let backed = backup_protected(&target, &staging, &protected, &mut warnings)
        .expect("backup must succeed");
    assert_eq!(backed, vec!["minimap".to_string(), "conf".to_string()]);

    // Simulate the extraction stomping one folder and deleting the other.
    fs::remove_dir_all(target.join("conf")).expect("must remove conf");
    write_file(&target.join("minimap/marks.bin"), b"stomped");

    restore_protected(&staging, &target, &mut warnings).expect("restore must succeed");
    assert_eq!(
        fs::read(target.join("minimap/marks.bin")).expect("must read marks"),
        b"marks"
    );
    assert_eq!(
        fs::read(target.join("conf/settings.cfg")).expect("must read settings"),
        b"settings"
    );
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");

    let _ = fs::remove_dir_all(root);
}

#[test]
fn prune_keeps_five_newest_asides() {
    let root = test_root("prune");
    for index in 0..7 {
        write_file(
            &root.join(format!("data.old_2024010100000{index}")),
            b"aside",
        );
    }
    write_file(&root.join("other.old_20240101000000"), b"aside");

    let mut warnings = Vec::new();
    prune_renamed_aside(&root, "data", &mut warnings);

    let remaining: Vec<String> = fs::read_dir(&root)
        .expect("must read root")
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("data.old_"))
        .collect();
    assert_eq!(remaining.len(), RENAMED_ASIDE_KEEP);
    assert!(!remaining.contains(&"data.old_20240101000000".to_string()));
    assert!(!remaining.contains(&"data.old_20240101000001".to_string()));
    // Unrelated base names are untouched.
    assert!(root.join("other.old_20240101000000").is_file());
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");

    let _ = fs::remove_dir_all(root);
}

#[test]
fn first_install_skips_backup_entirely() {
    let root = test_root("first-install");
    let archive = root.join("release.zip");
    build_archive(
        &archive,
        &[
            ("client.exe", b"binary".as_slice()),
            ("data/art.dat", b"art".as_slice()),
        ],
    );

    let mut installer = Installer::new(&root).expect("installer must build");
    let outcome = installer
        .install_from_archive(&archive, "1.0.0", None)
        .expect("install must succeed");

    assert!(outcome.first_install);
    assert!(outcome.warnings.is_empty(), "unexpected: {:?}", outcome.warnings);
    assert!(
        !installer.layout().backups_dir().exists(),
        "first install must not create backup staging"
    );
    assert!(installer.layout().target_dir().join("client.exe").is_file());
    assert_eq!(installer.local_config().last_version, "1.0.0");
    assert_eq!(
        fs::read_to_string(installer.layout().version_marker_path())
            .expect("must read marker")
            .trim(),
        "1.0.0"
    );

    let _ = fs::remove_dir_all(root);
}

#[test]
fn update_preserves_protected_and_snapshots() {
    let root = test_root("update");
    let archive = root.join("release.zip");
    build_archive(
        &archive,
        &[
            ("client.exe", b"binary-v2".as_slice()),
            ("minimap/fresh.bin", b"packed".as_slice()),
        ],
    );

    let mut installer = Installer::new(&root).expect("installer must build");
    installer
        .install_from_archive(&archive, "1.0.0", None)
        .expect("first install must succeed");

    // User data accumulates between updates.
    write_file(
        &installer.layout().target_dir().join("minimap/marks.bin"),
        b"marks",
    );

    let outcome = installer
        .install_from_archive(&archive, "1.1.0", None)
        .expect("update must succeed");
    assert!(!outcome.first_install);

    let target = installer.layout().target_dir();
    assert_eq!(
        fs::read(target.join("minimap/marks.bin")).expect("must read marks"),
        b"marks"
    );
    assert!(
        !target.join("minimap/fresh.bin").exists(),
        "archive must not write into protected folders"
    );
    assert!(target.join("client.exe").is_file());

    let snapshots: Vec<_> = fs::read_dir(installer.layout().backups_dir())
        .expect("backups dir must exist")
        .flatten()
        .collect();
    assert_eq!(snapshots.len(), 1);
    assert!(snapshots[0].path().join("minimap/marks.bin").is_file());

    let _ = fs::remove_dir_all(root);
}

#[test]
fn reinstalling_same_version_is_idempotent() {
    let root = test_root("idempotent");
    let archive = root.join("release.zip");
    build_archive(&archive, &[("client.exe", b"binary".as_slice())]);

    let mut installer = Installer::new(&root).expect("installer must build");
    let first = installer
        .install_from_archive(&archive, "2.0.0", None)
        .expect("first run must succeed");
    let second = installer
        .install_from_archive(&archive, "2.0.0", None)
        .expect("second run must succeed");

    assert_eq!(first.version, second.version);
    assert!(installer.layout().target_dir().join("client.exe").is_file());
    assert_eq!(installer.local_config().last_version, "2.0.0");

    let _ = fs::remove_dir_all(root);
}

#[test]
fn progress_phases_arrive_in_order() {
    let root = test_root("progress");
    let archive = root.join("release.zip");
    build_archive(&archive, &[("client.exe", b"binary".as_slice())]);

    let (tx, rx) = mpsc::channel();
    let mut installer = Installer::new(&root).expect("installer must build");
    installer
        .install_from_archive(&archive, "1.0.0", Some(tx))
        .expect("install must succeed");

    let phases: Vec<InstallPhase> = rx
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::Phase(phase) => Some(phase),
            ProgressEvent::Transfer { .. } => None,
        })
        .collect();

    assert_eq!(phases.first(), Some(&InstallPhase::Cleaning));
    assert_eq!(phases.last(), Some(&InstallPhase::Complete));
    assert!(
        !phases.contains(&InstallPhase::BackingUp),
        "first install must skip backup"
    );
    assert!(
        !phases.contains(&InstallPhase::Restoring),
        "first install must skip restore"
    );
    let percents: Vec<u8> = phases.iter().map(InstallPhase::percent).collect();
    let mut sorted = percents.clone();
    sorted.sort_unstable();
    assert_eq!(percents, sorted, "checkpoints must not regress");

    let _ = fs::remove_dir_all(root);
}

#[test]
fn installed_version_prefers_config_then_marker() {
    let root = test_root("installed-version");
    let installer = Installer::new(&root).expect("installer must build");
    assert_eq!(installer.installed_version(), None);

    write_file(&installer.layout().version_marker_path(), b"3.3.0\n");
    assert_eq!(installer.installed_version(), Some("3.3.0".to_string()));

    let archive = root.join("release.zip");
    build_archive(&archive, &[("client.exe", b"binary".as_slice())]);
    let mut installer = Installer::new(&root).expect("installer must rebuild");
    installer
        .install_from_archive(&archive, "3.4.0", None)
        .expect("install must succeed");
    assert_eq!(installer.installed_version(), Some("3.4.0".to_string()));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn direct_link_source_counts_as_reachable() {
    let root = test_root("direct-link-status");
    let mut installer = Installer::new(&root).expect("installer must build");
    installer.set_remote_config(RemoteConfig::parse(
        "download_link = \"https://cdn.example.test/client.zip\"\n",
    ));

    let status = installer.check_status();
    assert!(status.first_install);
    assert!(
        status.update_available,
        "a configured link with nothing installed must offer the download"
    );
    assert_eq!(status.latest_version, None);

    let mut installer = Installer::new(&root).expect("installer must rebuild");
    installer.set_remote_config(RemoteConfig::parse(
        "download_link = \"https://cdn.example.test/client.zip\"\nrelease_tag = \"v4.2\"\n",
    ));
    let status = installer.check_status();
    assert_eq!(status.latest_version, Some("4.2".to_string()));
    assert!(status.update_available);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn occupied_destination_is_renamed_aside_and_retried() {
    let root = test_root("occupied-dest");
    let target = root.join("client");
    // A directory sitting where the archive wants a file defeats the first
    // create attempt regardless of permissions.
    write_file(&target.join("client.exe/nested.txt"), b"old");

    let archive = root.join("release.zip");
    build_archive(&archive, &[("client.exe", b"binary".as_slice())]);

    let mut warnings = Vec::new();
    extract_archive(&archive, &target, &[], &mut warnings).expect("extraction must succeed");

    assert_eq!(
        fs::read(target.join("client.exe")).expect("must read client"),
        b"binary"
    );
    let asides: Vec<String> = fs::read_dir(&target)
        .expect("must read target")
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("client.exe.old_"))
        .collect();
    assert_eq!(asides.len(), 1, "occupant must be renamed aside");
    assert!(target.join(&asides[0]).join("nested.txt").is_file());
    assert!(warnings.is_empty(), "a successful retry is not a warning: {warnings:?}");

    let _ = fs::remove_dir_all(root);
}

#[test]
fn unsafe_archive_paths_are_skipped_with_warning() {
    let root = test_root("unsafe-path");
    let archive = root.join("release.zip");
    build_archive(
        &archive,
        &[
            ("../escape.txt", b"escaped".as_slice()),
            ("client.exe", b"binary".as_slice()),
        ],
    );

    let target = root.join("client");
    let mut warnings = Vec::new();
    extract_archive(&archive, &target, &[], &mut warnings).expect("extraction must succeed");

    assert!(target.join("client.exe").is_file());
    assert!(!root.join("escape.txt").exists(), "entry must not escape the target");
    assert_eq!(warnings.len(), 1, "unexpected warnings: {warnings:?}");
    assert!(warnings[0].contains("escape.txt"));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn finalize_aborts_when_marker_cannot_be_written() {
    let root = test_root("marker-blocked");
    let archive = root.join("release.zip");
    // The archive plants a directory at the marker path, so the finalize
    // write fails after extraction.
    build_archive(
        &archive,
        &[
            ("version.txt/", b"".as_slice()),
            ("client.exe", b"binary".as_slice()),
        ],
    );

    let mut installer = Installer::new(&root).expect("installer must build");
    let err = installer
        .install_from_archive(&archive, "1.0.0", None)
        .expect_err("finalize must fail");
    assert!(err.to_string().contains("version.txt"), "unexpected error: {err:#}");

    // The recorded version must never run ahead of the marker.
    let reloaded = LocalConfig::load(&installer.layout().local_config_path())
        .expect("config must load");
    assert!(reloaded.is_first_install());

    let _ = fs::remove_dir_all(root);
}

#[test]
fn remote_protected_override_persists_after_install() {
    let root = test_root("override-persist");
    let archive = root.join("release.zip");
    build_archive(&archive, &[("client.exe", b"binary".as_slice())]);

    let mut installer = Installer::new(&root).expect("installer must build");
    installer.set_remote_config(RemoteConfig::parse(
        "protected_folders = [\"saves\"]\n",
    ));

    let target = installer.layout().target_dir();
    write_file(&target.join("saves/keep.bin"), b"keep");
    write_file(&target.join("minimap/marks.bin"), b"marks");

    installer
        .install_from_archive(&archive, "1.0.0", None)
        .expect("install must succeed");

    // The override governs the run and survives it.
    assert!(target.join("saves/keep.bin").is_file());
    assert!(!target.join("minimap").exists(), "override replaces the default set");
    assert_eq!(installer.protected_folders(), ["saves".to_string()]);

    let reloaded = LocalConfig::load(&installer.layout().local_config_path())
        .expect("config must load");
    assert_eq!(reloaded.protected_folders, vec!["saves".to_string()]);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn bare_executable_probe_reports_unknown() {
    let root = test_root("probe");
    let installer = Installer::new(&root).expect("installer must build");
    write_file(&installer.layout().target_dir().join("client.exe"), b"bin");
    assert_eq!(installer.installed_version(), Some("unknown".to_string()));

    let _ = fs::remove_dir_all(root);
}
