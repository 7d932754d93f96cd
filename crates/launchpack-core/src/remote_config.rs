use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Remote launcher configuration.
///
/// The hosted document has no fixed schema: recognized keys are modeled as
/// typed optional fields, everything else lands in `extra` so future keys
/// round-trip instead of erroring. Several keys historically had two spellings;
/// both are kept and reconciled in the accessors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RemoteConfig {
    pub version: Option<String>,
    pub release_tag: Option<String>,
    pub download_link: Option<String>,
    pub download_url: Option<String>,
    pub zip_file: Option<String>,
    pub download_file: Option<String>,
    pub client_zip_filename: Option<String>,
    pub protected_folders: Option<ProtectedFolderValue>,
    pub auto_install_updates: Option<ConfigFlag>,
    pub auto_install_launcher_updates: Option<ConfigFlag>,
    pub auto_update_launcher: Option<ConfigFlag>,
    pub enable_auto_update: Option<ConfigFlag>,
    pub github_username: Option<String>,
    pub github_repository: Option<String>,
    pub current_launcher_version: Option<String>,
    pub launcher_github_username: Option<String>,
    pub launcher_github_repository: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

/// Protected folders arrive either as a TOML list or as a comma-separated
/// string, depending on which config format the operator published.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ProtectedFolderValue {
    List(Vec<String>),
    Csv(String),
}

/// Boolean-ish config value: a real TOML boolean, or a string such as
/// "true"/"1"/"yes" when the document came through the key=value fallback
/// parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConfigFlag {
    Bool(bool),
    Text(String),
}

impl ConfigFlag {
    pub fn enabled(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Text(text) => matches!(
                text.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            ),
        }
    }
}

impl ProtectedFolderValue {
    pub fn names(&self) -> Vec<String> {
        match self {
            Self::List(names) => names
                .iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
            Self::Csv(text) => text
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }
}

impl RemoteConfig {
    /// Parses a fetched config document. Structured TOML is attempted first;
    /// anything that fails goes through the permissive key=value line parser,
    /// so a malformed document degrades to "whatever lines were readable"
    /// instead of an error.
    pub fn parse(text: &str) -> Self {
        match toml::from_str::<Self>(text) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!("structured config parse failed, using line fallback: {err}");
                Self::parse_key_value_lines(text)
            }
        }
    }

    fn parse_key_value_lines(text: &str) -> Self {
        let mut table = toml::Table::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            table.insert(
                key.trim().to_string(),
                toml::Value::String(value.trim().trim_matches('"').to_string()),
            );
        }

        Self::deserialize(toml::Value::Table(table)).unwrap_or_default()
    }

    /// Release selector: explicit `release_tag` wins over `version`.
    pub fn release_tag(&self) -> Option<&str> {
        self.first_str(&[&self.release_tag, &self.version])
    }

    pub fn direct_download_link(&self) -> Option<&str> {
        self.first_str(&[&self.download_link, &self.download_url])
            .or_else(|| self.nested_str("download_link"))
            .or_else(|| self.nested_str("download_url"))
    }

    /// Preferred asset filename, normalized to end in `.zip`.
    pub fn asset_filename(&self) -> Option<String> {
        let name = self
            .first_str(&[&self.zip_file, &self.download_file, &self.client_zip_filename])
            .or_else(|| self.nested_str("client_zip_filename"))?;
        if name.to_ascii_lowercase().ends_with(".zip") {
            Some(name.to_string())
        } else {
            Some(format!("{name}.zip"))
        }
    }

    pub fn protected_folders(&self) -> Option<Vec<String>> {
        let names = self.protected_folders.as_ref()?.names();
        if names.is_empty() {
            None
        } else {
            Some(names)
        }
    }

    pub fn auto_install_updates(&self) -> bool {
        self.auto_install_updates
            .as_ref()
            .map(ConfigFlag::enabled)
            .unwrap_or(false)
    }

    pub fn auto_update_launcher(&self) -> bool {
        self.auto_install_launcher_updates
            .as_ref()
            .or(self.auto_update_launcher.as_ref())
            .map(ConfigFlag::enabled)
            .unwrap_or(false)
    }

    pub fn launcher_updates_enabled(&self) -> bool {
        self.enable_auto_update
            .as_ref()
            .map(ConfigFlag::enabled)
            .unwrap_or(false)
    }

    /// Client repository override: lets the hosted config redirect the update
    /// source without republishing the installed binary.
    pub fn repository_override(&self) -> (Option<&str>, Option<&str>) {
        let owner = self
            .github_username
            .as_deref()
            .or_else(|| self.nested_str("github_username"));
        let repo = self
            .github_repository
            .as_deref()
            .or_else(|| self.nested_str("github_repository"));
        (owner, repo)
    }

    pub fn launcher_repository(&self) -> Option<(&str, &str)> {
        let owner = self.launcher_github_username.as_deref()?.trim();
        if owner.is_empty() {
            return None;
        }
        let repo = self
            .launcher_github_repository
            .as_deref()
            .map(str::trim)
            .filter(|repo| !repo.is_empty())
            .unwrap_or("launchpack");
        Some((owner, repo))
    }

    fn first_str<'a>(&self, candidates: &[&'a Option<String>]) -> Option<&'a str> {
        candidates
            .iter()
            .filter_map(|candidate| candidate.as_deref())
            .map(str::trim)
            .find(|value| !value.is_empty())
    }

    /// Recognized keys occasionally live inside a named group-style section;
    /// scan one level of nested tables for them.
    fn nested_str(&self, key: &str) -> Option<&str> {
        self.extra.values().find_map(|value| {
            value
                .as_table()
                .and_then(|table| table.get(key))
                .and_then(toml::Value::as_str)
                .map(str::trim)
                .filter(|found| !found.is_empty())
        })
    }
}
