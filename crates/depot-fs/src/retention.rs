use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::dir::{list_files, prune_empty_dirs};

/// Make room for one incoming file: keep the `max_retain - 1` newest files of
/// `family` and delete the rest. Returns the number of files deleted.
///
/// Best-effort: a file that cannot be deleted is logged and not counted.
pub fn evict(destination: &Path, family: &str, max_retain: usize) -> usize {
    retain_newest(destination, family, max_retain.saturating_sub(1))
}

/// Keep the `keep` most recently modified files under `destination/<family>`
/// and delete the rest. Ties on modification time are broken by path.
pub fn retain_newest(destination: &Path, family: &str, keep: usize) -> usize {
    let family_dir = destination.join(family);
    let mut files = match list_files(&family_dir) {
        Ok(files) => files,
        Err(crate::Error::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            return 0;
        }
        Err(e) => {
            warn!(family, error = %e, "failed to list family files; skipping eviction");
            return 0;
        }
    };

    files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));

    let mut deleted = Vec::new();
    for stale in files.iter().skip(keep) {
        match std::fs::remove_file(&stale.path) {
            Ok(()) => {
                debug!(family, path = %stale.path.display(), "evicted");
                deleted.push(stale.path.display().to_string());
            }
            Err(e) => warn!(family, path = %stale.path.display(), error = %e, "eviction failed"),
        }
    }

    if !deleted.is_empty() {
        prune_empty_dirs(&family_dir);
        info!(family, count = deleted.len(), files = ?deleted, "old files deleted");
    }
    deleted.len()
}
