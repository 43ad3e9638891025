use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result};

/// A file opened for writing under an exclusive, OS-enforced advisory lock.
///
/// The lock is taken without blocking and released when the guard drops, on
/// every exit path. Opening never truncates: a writer that loses the race for
/// the lock must not clobber the holder's bytes, so truncation is a separate
/// step performed only by the holder.
#[derive(Debug)]
pub struct LockedFile {
    file: File,
    path: PathBuf,
}

impl LockedFile {
    pub fn try_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| Error::Open {
                path: path.clone(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self { file, path }),
            Err(e) if is_contended(&e) => Err(Error::AlreadyLocked { path }),
            Err(source) => Err(Error::Lock { path, source }),
        }
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn file(&self) -> &File { &self.file }

    /// Drop any existing content.
    pub fn truncate(&self) -> Result<()> {
        self.file.set_len(0).map_err(|source| Error::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Second handle onto the same open file description, for async writers.
    /// The lock stays with this guard.
    pub fn try_clone_file(&self) -> Result<File> {
        self.file.try_clone().map_err(|source| Error::Open {
            path: self.path.clone(),
            source,
        })
    }

    /// Remove the file while the lock is still held, then release it.
    pub fn discard(self) -> Result<()> {
        std::fs::remove_file(&self.path).map_err(|source| Error::Remove {
            path: self.path.clone(),
            source,
        })
    }
}

impl Drop for LockedFile {
    fn drop(&mut self) { let _ = FileExt::unlock(&self.file); }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_second_writer_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("artifact.bin");

        let first = LockedFile::try_create(&path).unwrap();
        let second = LockedFile::try_create(&path);
        assert!(matches!(second, Err(Error::AlreadyLocked { .. })));

        drop(first);
        assert!(LockedFile::try_create(&path).is_ok());
    }

    #[test]
    fn test_rejected_writer_does_not_truncate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("artifact.bin");

        let holder = LockedFile::try_create(&path).unwrap();
        holder.file().write_all(b"in progress").unwrap();

        assert!(LockedFile::try_create(&path).is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"in progress");
    }

    #[test]
    fn test_truncate_and_discard() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("artifact.bin");
        std::fs::write(&path, b"stale content").unwrap();

        let locked = LockedFile::try_create(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"stale content");
        locked.truncate().unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);

        locked.discard().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_parent_is_open_error() {
        let dir = tempdir().unwrap();
        let result = LockedFile::try_create(dir.path().join("no/such/dir/file"));
        assert!(matches!(result, Err(Error::Open { .. })));
    }
}
