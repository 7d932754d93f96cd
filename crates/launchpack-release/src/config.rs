use std::fs;
use std::path::Path;

use launchpack_core::RemoteConfig;

use crate::client::GitHubClient;

/// Points the launcher at a local config file instead of the network.
pub const CONFIG_PATH_ENV: &str = "LAUNCHPACK_CONFIG_PATH";
/// Replaces the canonical config URLs with a single explicit one.
pub const CONFIG_URL_ENV: &str = "LAUNCHPACK_CONFIG_URL";

const DEFAULT_OWNER: &str = "launchpack-project";
const DEFAULT_REPO: &str = "client-releases";
const CONFIG_BRANCHES: [&str; 2] = ["main", "master"];
const CONFIG_FILES: [&str; 2] = ["launcher_config.toml", "launcher_config.txt"];

/// GitHub coordinates the resolver reads releases from. Starts at the
/// compiled-in repository; the hosted config may redirect it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSource {
    pub owner: String,
    pub repo: String,
}

impl Default for ReleaseSource {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
        }
    }
}

impl ReleaseSource {
    /// Applies `github_username` / `github_repository` overrides from a
    /// fetched config.
    pub fn apply_override(&mut self, config: &RemoteConfig) {
        let (owner, repo) = config.repository_override();
        if let Some(owner) = owner {
            self.owner = owner.to_string();
        }
        if let Some(repo) = repo {
            self.repo = repo.to_string();
        }
    }

    /// Raw-hosting URLs the launcher config may live at, most likely first.
    pub fn config_urls(&self) -> Vec<String> {
        let mut urls = Vec::new();
        for branch in CONFIG_BRANCHES {
            for file in CONFIG_FILES {
                urls.push(format!(
                    "https://raw.githubusercontent.com/{}/{}/{branch}/{file}",
                    self.owner, self.repo
                ));
            }
        }
        urls
    }
}

/// Fetches the remote launcher config. Environment overrides are consulted
/// first (local file, then explicit URL), then the canonical raw URLs; the
/// first document that yields any parse wins. Total failure is `None`, never
/// an error: a launcher with no reachable config still runs with what it has.
pub fn fetch_remote_config(client: &GitHubClient, source: &ReleaseSource) -> Option<RemoteConfig> {
    let path_override = std::env::var(CONFIG_PATH_ENV).ok();
    let url_override = std::env::var(CONFIG_URL_ENV).ok();
    fetch_remote_config_with(
        client,
        source,
        path_override.as_deref().map(Path::new),
        url_override.as_deref(),
    )
}

pub(crate) fn fetch_remote_config_with(
    client: &GitHubClient,
    source: &ReleaseSource,
    path_override: Option<&Path>,
    url_override: Option<&str>,
) -> Option<RemoteConfig> {
    if let Some(path) = path_override {
        match fs::read_to_string(path) {
            Ok(text) => return Some(RemoteConfig::parse(&text)),
            Err(err) => {
                tracing::warn!("config override unreadable {}: {err}", path.display());
            }
        }
    }

    let urls = match url_override {
        Some(url) => vec![url.to_string()],
        None => source.config_urls(),
    };

    for url in urls {
        match client.fetch_text(&url) {
            Ok(text) => {
                tracing::debug!("launcher config fetched from {url}");
                return Some(RemoteConfig::parse(&text));
            }
            Err(err) => {
                tracing::debug!("config fetch failed for {url}: {err:#}");
            }
        }
    }

    tracing::warn!("no launcher config reachable, continuing without one");
    None
}
