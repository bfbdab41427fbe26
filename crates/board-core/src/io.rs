//! Filesystem primitives for item directories. All board writes go through here.

use crate::error::{BoardError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with `data` via a sibling tempfile, so `README.md` and
/// `progress.md` are either the old or the new content, never a mix.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(data)?;
    staged.flush()?;
    staged.persist(path).map_err(|e| BoardError::Io(e.error))?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "wrote file");
    Ok(())
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Returns false and leaves the file alone when it already exists.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, data).map(|()| true)
}

/// Missing files read as empty; item files are optional on disk until first write.
/// A file that is not UTF-8 fails with [`BoardError::Parse`] naming the file.
pub fn read_or_empty(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).or_else(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Ok(String::new()),
        std::io::ErrorKind::InvalidData => Err(BoardError::Parse {
            path: path.display().to_string(),
            message: "not valid UTF-8".to_string(),
        }),
        _ => Err(e.into()),
    })
}

/// Remove an item directory together with everything nested under it.
pub fn remove_tree(dir: &Path) -> Result<()> {
    std::fs::remove_dir_all(dir)?;
    tracing::debug!(dir = %dir.display(), "removed item directory");
    Ok(())
}

/// Move an item directory. Refuses to merge into an existing directory.
pub fn move_dir(from: &Path, to: &Path) -> Result<()> {
    if to.exists() {
        return Err(BoardError::AlreadyExists(to.display().to_string()));
    }
    std::fs::rename(from, to)?;
    tracing::debug!(from = %from.display(), to = %to.display(), "moved item directory");
    Ok(())
}
