mod check;
mod script;

pub use check::{
    apply_update, check_self_update, download_update, LauncherUpdate, SelfUpdateCheck,
};

#[cfg(test)]
mod tests;
