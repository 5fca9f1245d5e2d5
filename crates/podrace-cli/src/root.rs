use std::path::{Path, PathBuf};

use podrace_core::paths;

/// Resolve the directory that holds `.podrace/`.
///
/// Walks upward from `start` looking for `.podrace/` and falls back to
/// `start` itself.
pub fn resolve_root(start: &Path) -> PathBuf {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(paths::PODRACE_DIR).is_dir() {
            return dir;
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => return start.to_path_buf(),
        }
    }
}

/// Config file location: `--config` if given, else `<root>/.podrace/config.yaml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    paths::config_path(&resolve_root(&cwd))
}
