//! Decides whether an on-disk copy can stand in for a download.

use std::io;
use std::path::Path;

use depot_core::Artifact;
use depot_verify::{FileVerdict, VerificationError, verify_file};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    Missing,
    LengthMismatch { expected: u64, actual: u64 },
    ChecksumMismatch { expected: String, actual: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A complete, byte-identical copy is already present.
    Skip,
    NeedsDownload(Reason),
}

impl Verdict {
    pub fn is_skip(&self) -> bool { matches!(self, Self::Skip) }
}

/// Compare `artifact`'s local copy under `destination` against its catalog
/// entry. Length is checked before the digest. Blocking.
pub fn check(destination: &Path, artifact: &Artifact) -> io::Result<Verdict> {
    let path = artifact.local_path(destination);
    let expected_len = u64::try_from(artifact.expected_size().as_bytes()).unwrap_or(0);

    let verdict = verify_file(&path, expected_len, artifact.checksum()).map_err(|e| match e {
        VerificationError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    })?;

    Ok(match verdict {
        FileVerdict::Intact => Verdict::Skip,
        FileVerdict::Missing => Verdict::NeedsDownload(Reason::Missing),
        FileVerdict::LengthMismatch { expected, actual } => {
            Verdict::NeedsDownload(Reason::LengthMismatch { expected, actual })
        }
        FileVerdict::ChecksumMismatch { expected, actual } => {
            Verdict::NeedsDownload(Reason::ChecksumMismatch { expected, actual })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::{Catalog, Family};
    use depot_verify::Sha256Hasher;
    use tempfile::tempdir;

    fn catalog_for(body: &[u8]) -> Catalog {
        Catalog::builder("http://mirror.test/packages/")
            .unwrap()
            .entry(Family::DEM_AGENT, "1.0/agent.tar", body.len() as i64, &Sha256Hasher::hex_digest(body))
            .unwrap()
            .build()
    }

    #[test]
    fn test_verdicts() {
        let dir = tempdir().unwrap();
        let catalog = catalog_for(b"payload");
        let artifact = catalog.all().next().unwrap();
        let path = artifact.local_path(dir.path());

        assert_eq!(check(dir.path(), artifact).unwrap(), Verdict::NeedsDownload(Reason::Missing));

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"short").unwrap();
        assert_eq!(
            check(dir.path(), artifact).unwrap(),
            Verdict::NeedsDownload(Reason::LengthMismatch { expected: 7, actual: 5 })
        );

        std::fs::write(&path, b"PAYLOAD").unwrap();
        assert!(matches!(
            check(dir.path(), artifact).unwrap(),
            Verdict::NeedsDownload(Reason::ChecksumMismatch { .. })
        ));

        std::fs::write(&path, b"payload").unwrap();
        assert!(check(dir.path(), artifact).unwrap().is_skip());
    }

    #[test]
    fn test_uppercase_checksum_matches() {
        let dir = tempdir().unwrap();
        let upper = Sha256Hasher::hex_digest(b"abc").to_uppercase();
        let catalog = Catalog::builder("http://mirror.test/")
            .unwrap()
            .entry(Family::APP_VOLUMES_AGENT, "4.0/agent.tar", 3, &upper)
            .unwrap()
            .build();
        let artifact = catalog.all().next().unwrap();
        let path = artifact.local_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"abc").unwrap();

        assert_eq!(check(dir.path(), artifact).unwrap(), Verdict::Skip);
    }
}
