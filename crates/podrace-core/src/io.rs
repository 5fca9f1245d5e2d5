use crate::error::Result;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// What [`write_file`] does when the target already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overwrite {
    Replace,
    Keep,
}

/// Write `contents` to `path` through a sibling tempfile, so readers see
/// either the previous file or the complete new one.
///
/// Returns `false` without touching anything when `path` exists and the
/// policy is [`Overwrite::Keep`]. Missing parent directories are created.
pub fn write_file(path: &Path, contents: &str, policy: Overwrite) -> Result<bool> {
    if policy == Overwrite::Keep && path.exists() {
        tracing::debug!(path = %path.display(), "file exists, leaving it in place");
        return Ok(false);
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;

    let persisted = match policy {
        Overwrite::Replace => tmp.persist(path),
        Overwrite::Keep => tmp.persist_noclobber(path),
    };
    match persisted {
        Ok(_) => {
            tracing::debug!(path = %path.display(), bytes = contents.len(), "file written");
            Ok(true)
        }
        // Lost a race with another writer.
        Err(e) if policy == Overwrite::Keep && e.error.kind() == ErrorKind::AlreadyExists => {
            Ok(false)
        }
        Err(e) => Err(e.error.into()),
    }
}
