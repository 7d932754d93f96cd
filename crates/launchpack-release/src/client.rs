use std::time::Duration;

use anyhow::{Context, Result};
use launchpack_core::ReleaseInfo;

const USER_AGENT: &str = concat!("launchpack/", env!("CARGO_PKG_VERSION"));

/// Blocking GitHub API client for release lookups and config fetches.
///
/// Lookups carry a short overall deadline so a dead endpoint cannot stall a
/// status check; file transfers go through the download module instead, which
/// has no overall deadline.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::blocking::Client,
    api_base: String,
}

impl GitHubClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed building http client")?;
        Ok(Self {
            http,
            api_base: "https://api.github.com".to_string(),
        })
    }

    /// Points API lookups at a different base URL. Used by tests.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn release_by_tag(&self, owner: &str, repo: &str, tag: &str) -> Result<ReleaseInfo> {
        let url = format!("{}/repos/{owner}/{repo}/releases/tags/{tag}", self.api_base);
        self.fetch_release(&url)
            .with_context(|| format!("failed fetching release '{tag}' from {owner}/{repo}"))
    }

    pub fn latest_release(&self, owner: &str, repo: &str) -> Result<ReleaseInfo> {
        let url = format!("{}/repos/{owner}/{repo}/releases/latest", self.api_base);
        self.fetch_release(&url)
            .with_context(|| format!("failed fetching latest release from {owner}/{repo}"))
    }

    fn fetch_release(&self, url: &str) -> Result<ReleaseInfo> {
        let response = self.http.get(url).send()?.error_for_status()?;
        let release = response.json::<ReleaseInfo>()?;
        Ok(release)
    }

    /// Fetches a small text document, for the hosted launcher config.
    pub fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .send()
            .with_context(|| format!("failed requesting {url}"))?
            .error_for_status()
            .with_context(|| format!("request rejected: {url}"))?;
        response
            .text()
            .with_context(|| format!("failed reading response body: {url}"))
    }
}
