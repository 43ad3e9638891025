use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::{Error, Result};

/// A regular file found under a directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path:     PathBuf,
    pub len:      u64,
    pub modified: SystemTime,
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| Error::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Recursively list regular files under `root`. Symlinks are not followed.
pub fn list_files(root: &Path) -> Result<Vec<FileEntry>> {
    let mut entries = Vec::new();
    walk(root, &mut entries)?;
    Ok(entries)
}

fn walk(dir: &Path, out: &mut Vec<FileEntry>) -> Result<()> {
    let read_err = |source| Error::Read {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        let metadata = fs::symlink_metadata(&path).map_err(|source| Error::Read {
            path: path.clone(),
            source,
        })?;

        if metadata.is_dir() {
            walk(&path, out)?;
        } else if metadata.is_file() {
            out.push(FileEntry {
                path,
                len: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
    }
    Ok(())
}

/// Remove every entry below `dir`, keeping `dir` itself. Returns the number
/// of top-level entries removed.
pub fn purge_dir(dir: &Path) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(source) => {
            return Err(Error::Read {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut removed = 0;
    for entry in entries {
        let path = entry
            .map_err(|source| Error::Read {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        let is_dir = fs::symlink_metadata(&path).map(|m| m.is_dir()).unwrap_or(false);
        let result = if is_dir { fs::remove_dir_all(&path) } else { fs::remove_file(&path) };
        result.map_err(|source| Error::Remove {
            path: path.clone(),
            source,
        })?;
        removed += 1;
    }
    Ok(removed)
}

/// Remove empty directories below `root`, leaving `root` in place.
pub(crate) fn prune_empty_dirs(root: &Path) {
    let Ok(entries) = fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if fs::symlink_metadata(&path).map(|m| m.is_dir()).unwrap_or(false) {
            prune_empty_dirs(&path);
            // Fails harmlessly when the directory still has content.
            let _ = fs::remove_dir(&path);
        }
    }
}
