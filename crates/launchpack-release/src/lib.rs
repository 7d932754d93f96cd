mod client;
mod config;
mod download;
mod resolve;

pub use client::GitHubClient;
pub use config::{fetch_remote_config, ReleaseSource, CONFIG_PATH_ENV, CONFIG_URL_ENV};
pub use download::download_to_file;
pub use resolve::{resolve_download, ResolvedDownload};
