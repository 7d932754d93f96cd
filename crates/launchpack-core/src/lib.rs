mod local_config;
mod release;
mod remote_config;
mod version;

pub use local_config::{LocalConfig, DEFAULT_PROTECTED_FOLDERS};
pub use release::{ReleaseAsset, ReleaseInfo};
pub use remote_config::{ConfigFlag, ProtectedFolderValue, RemoteConfig};
pub use version::{compare_versions, is_newer_version, strip_release_prefix};
