use anyhow::{Context, Result};
use launchpack_core::{strip_release_prefix, ReleaseAsset, ReleaseInfo, RemoteConfig};

use crate::client::GitHubClient;
use crate::config::ReleaseSource;

const DEFAULT_ASSET_NAME: &str = "client.zip";

/// One concrete thing to download, whichever resolution path produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDownload {
    /// Bare comparable version, empty when the config only gave a direct link.
    pub version: String,
    pub asset_name: String,
    pub download_url: String,
    /// Declared size in bytes, zero when unknown.
    pub size: u64,
    /// Release metadata when the GitHub API was involved.
    pub release: Option<ReleaseInfo>,
}

/// Resolves what to download, in precedence order: a direct download link in
/// the config short-circuits everything (no API call), an explicit release
/// tag selects that release, otherwise the latest release is used. Within a
/// release the configured asset filename wins, case-insensitively, falling
/// back to the first `.zip` asset.
pub fn resolve_download(
    client: &GitHubClient,
    config: Option<&RemoteConfig>,
    source: &ReleaseSource,
) -> Result<ResolvedDownload> {
    if let Some(config) = config {
        if let Some(link) = config.direct_download_link() {
            return Ok(resolve_direct(link, config));
        }
    }

    let wanted_name = config.and_then(RemoteConfig::asset_filename);
    let release = match config.and_then(RemoteConfig::release_tag) {
        Some(tag) => client.release_by_tag(&source.owner, &source.repo, tag)?,
        None => client.latest_release(&source.owner, &source.repo)?,
    };

    let asset = pick_asset(&release, wanted_name.as_deref()).with_context(|| {
        format!(
            "release '{}' from {}/{} has no usable archive asset",
            release.tag_name, source.owner, source.repo
        )
    })?;

    Ok(ResolvedDownload {
        version: release.version(),
        asset_name: asset.name.clone(),
        download_url: asset.download_url.clone(),
        size: asset.size,
        release: Some(release.clone()),
    })
}

/// Synthesizes a single-asset download from an explicit link. The asset name
/// is the URL basename with any query stripped; links that do not end in a
/// `.zip` filename fall back to the default archive name.
pub(crate) fn resolve_direct(link: &str, config: &RemoteConfig) -> ResolvedDownload {
    let basename = url_basename(link);
    let asset_name = match basename {
        Some(name) if name.to_ascii_lowercase().ends_with(".zip") => name,
        _ => DEFAULT_ASSET_NAME.to_string(),
    };
    let version = config
        .release_tag()
        .map(|tag| strip_release_prefix(tag).to_string())
        .unwrap_or_default();

    ResolvedDownload {
        version,
        asset_name,
        download_url: link.to_string(),
        size: 0,
        release: None,
    }
}

fn pick_asset<'a>(release: &'a ReleaseInfo, wanted: Option<&str>) -> Option<&'a ReleaseAsset> {
    if let Some(asset) = release.zip_assets(wanted).first().copied() {
        return Some(asset);
    }
    // Named asset absent from this release: fall back to any archive.
    if wanted.is_some() {
        return release.zip_assets(None).first().copied();
    }
    None
}

pub(crate) fn url_basename(url: &str) -> Option<String> {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);
    without_query
        .rsplit('/')
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
}
