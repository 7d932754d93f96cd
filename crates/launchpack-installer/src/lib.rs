mod extract;
mod layout;
mod orchestrator;
mod snapshot;

pub use extract::extract_archive;
pub use layout::InstallLayout;
pub use orchestrator::{
    InstallOutcome, InstallPhase, InstallStatus, Installer, ProgressEvent,
};
pub use snapshot::{backup_protected, clean_target, restore_protected};

#[cfg(test)]
mod tests;
