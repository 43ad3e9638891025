use std::fs::File;
use std::io::Write;
use std::time::{Duration, SystemTime};

use depot_fs::{Error, LockedFile, ensure_dir, evict, list_files, purge_dir};
use tempfile::tempdir;

#[test]
fn test_sequential_writes_respect_retention() {
    let dir = tempdir().unwrap();
    let base = SystemTime::now() - Duration::from_secs(3600);

    for (i, version) in ["1.0", "1.1", "1.2", "1.3"].iter().enumerate() {
        evict(dir.path(), "alpha", 2);

        let path = dir.path().join("alpha").join(version).join("alpha.bin");
        ensure_dir(path.parent().unwrap()).unwrap();
        let locked = LockedFile::try_create(&path).unwrap();
        locked.truncate().unwrap();
        locked.file().write_all(version.as_bytes()).unwrap();
        locked.file().set_modified(base + Duration::from_secs(i as u64 * 60)).unwrap();
    }

    let files = list_files(&dir.path().join("alpha")).unwrap();
    let mut names: Vec<_> = files
        .iter()
        .map(|f| std::fs::read_to_string(&f.path).unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["1.2", "1.3"]);
}

#[test]
fn test_lock_survives_cloned_handle() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blob");

    let locked = LockedFile::try_create(&path).unwrap();
    let mut writer: File = locked.try_clone_file().unwrap();
    writer.write_all(b"abc").unwrap();
    drop(writer);

    assert!(matches!(LockedFile::try_create(&path), Err(Error::AlreadyLocked { .. })));
    drop(locked);
    assert_eq!(std::fs::read(&path).unwrap(), b"abc");
}

#[test]
fn test_purge_then_list_is_empty() {
    let dir = tempdir().unwrap();
    ensure_dir(&dir.path().join("x/y")).unwrap();
    std::fs::write(dir.path().join("x/y/z"), b"z").unwrap();

    purge_dir(dir.path()).unwrap();
    assert!(list_files(dir.path()).unwrap().is_empty());
}
