use std::fs;
use std::path::PathBuf;

use launchpack_core::{ReleaseAsset, RemoteConfig};
use launchpack_release::GitHubClient;

use super::check::{check_inner, pick_launcher_asset};
use super::script::write_swap_script;
use super::SelfUpdateCheck;

fn test_dir(label: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    path.push(format!(
        "launchpack-selfupdate-tests-{label}-{}-{}",
        std::process::id(),
        nanos
    ));
    fs::create_dir_all(&path).expect("must create test dir");
    path
}

fn asset(name: &str) -> ReleaseAsset {
    ReleaseAsset {
        name: name.to_string(),
        size: 1,
        download_url: format!("https://example.test/{name}"),
        created_at: None,
        updated_at: None,
        download_count: 0,
    }
}

#[test]
fn asset_heuristic_prefers_launcher_name() {
    let assets = vec![asset("notes.txt"), asset("MyLauncher-v2.zip"), asset("client.zip")];
    let picked = pick_launcher_asset(&assets).expect("must pick an asset");
    assert_eq!(picked.name, "MyLauncher-v2.zip");
}

#[test]
fn asset_heuristic_falls_back_to_first() {
    let assets = vec![asset("build.tar.gz"), asset("notes.txt")];
    let picked = pick_launcher_asset(&assets).expect("must pick an asset");
    assert_eq!(picked.name, "build.tar.gz");
    assert!(pick_launcher_asset(&[]).is_none());
}

#[test]
fn unsupported_reason_short_circuits() {
    let client = GitHubClient::new().expect("client must build");
    let config = RemoteConfig::parse("enable_auto_update = true\n");
    let check = check_inner(&client, Some(&config), Some("development build".to_string()))
        .expect("check must not error");
    assert_eq!(
        check,
        SelfUpdateCheck::Unsupported {
            reason: "development build".to_string()
        }
    );
}

#[test]
fn missing_config_disables_self_update() {
    let client = GitHubClient::new().expect("client must build");
    let check = check_inner(&client, None, None).expect("check must not error");
    assert_eq!(check, SelfUpdateCheck::Disabled);
}

#[test]
fn opted_out_config_disables_self_update() {
    let client = GitHubClient::new().expect("client must build");
    let config = RemoteConfig::parse(
        "enable_auto_update = false\nlauncher_github_username = \"acme\"\n",
    );
    let check = check_inner(&client, Some(&config), None).expect("check must not error");
    assert_eq!(check, SelfUpdateCheck::Disabled);
}

#[test]
fn missing_launcher_repo_disables_self_update() {
    let client = GitHubClient::new().expect("client must build");
    let config = RemoteConfig::parse("enable_auto_update = true\n");
    let check = check_inner(&client, Some(&config), None).expect("check must not error");
    assert_eq!(check, SelfUpdateCheck::Disabled);
}

#[cfg(unix)]
#[test]
fn swap_script_replaces_binary_and_cleans_up() {
    let dir = test_dir("swap");
    let current = dir.join("launcher.bin");
    let downloaded = dir.join("launcher-new.bin");
    fs::write(&current, b"old build").expect("must write current");
    fs::write(&downloaded, b"new build").expect("must write download");

    let script =
        write_swap_script(&dir, &current, &downloaded, 0).expect("script must be written");

    let status = std::process::Command::new("sh")
        .arg(&script)
        .status()
        .expect("script must run");
    assert!(status.success());

    assert_eq!(
        fs::read(&current).expect("must read current"),
        b"new build"
    );
    assert!(!downloaded.exists(), "download must be deleted");
    assert!(!script.exists(), "script must delete itself");

    let _ = fs::remove_dir_all(dir);
}
