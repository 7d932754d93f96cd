use serde::{Deserialize, Serialize};

use crate::version::strip_release_prefix;

/// One downloadable file attached to a release. Deserializes straight from
/// the GitHub asset payload; synthesized direct-download assets use the same
/// shape with `download_url` as the field name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "browser_download_url", alias = "download_url")]
    pub download_url: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub download_count: u64,
}

/// Normalized release description, whichever resolution path produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseInfo {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseInfo {
    /// Bare comparable version for this release: the tag (or display name
    /// when the tag is empty) with a leading `v` stripped when followed by a
    /// digit.
    pub fn version(&self) -> String {
        let raw = if self.tag_name.trim().is_empty() {
            self.name.as_deref().unwrap_or("")
        } else {
            &self.tag_name
        };
        strip_release_prefix(raw).to_string()
    }

    /// First line of the release notes, for status display.
    pub fn summary(&self) -> Option<&str> {
        self.body
            .as_deref()
            .and_then(|body| body.lines().next())
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }

    /// Archive assets, optionally restricted to an exact (case-insensitive)
    /// filename. Without a filter every `.zip` asset qualifies, in release
    /// order.
    pub fn zip_assets(&self, filename: Option<&str>) -> Vec<&ReleaseAsset> {
        self.assets
            .iter()
            .filter(|asset| match filename {
                Some(wanted) => asset.name.eq_ignore_ascii_case(wanted),
                None => asset.name.to_ascii_lowercase().ends_with(".zip"),
            })
            .collect()
    }
}
