use std::path::{Path, PathBuf};

pub const PODRACE_DIR: &str = ".podrace";
pub const CONFIG_FILE: &str = ".podrace/config.yaml";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}
