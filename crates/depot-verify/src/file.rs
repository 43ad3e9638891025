use std::fs::File;
use std::io;
use std::path::Path;

use crate::{Result, Sha256Hasher, VerificationError, VerifiedReader};

const READ_BUFFER: usize = 64 * 1024;

/// Outcome of comparing an on-disk file against its expected length and digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileVerdict {
    Intact,
    Missing,
    LengthMismatch { expected: u64, actual: u64 },
    ChecksumMismatch { expected: String, actual: String },
}

impl FileVerdict {
    pub fn is_intact(&self) -> bool { matches!(self, Self::Intact) }
}

/// Verify `path` against `expected_len` bytes and a hex SHA-256 digest.
///
/// The length is compared first; the O(n) digest is only computed when the
/// length already matches. Hex comparison is case-insensitive.
pub fn verify_file(path: &Path, expected_len: u64, expected_hex: &str) -> Result<FileVerdict> {
    let expected = hex::decode(expected_hex.trim())
        .map_err(|_| VerificationError::InvalidDigest(expected_hex.to_string()))?;

    let metadata = match std::fs::metadata(path) {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Ok(FileVerdict::Missing),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(FileVerdict::Missing),
        Err(e) => return Err(e.into()),
    };

    if metadata.len() != expected_len {
        return Ok(FileVerdict::LengthMismatch {
            expected: expected_len,
            actual:   metadata.len(),
        });
    }

    let mut reader = VerifiedReader::new(File::open(path)?, Sha256Hasher::new());
    let mut buffer = vec![0u8; READ_BUFFER];
    reader.consume(&mut buffer)?;

    match reader.finish(&expected) {
        Ok(_) => Ok(FileVerdict::Intact),
        Err(VerificationError::Mismatch { expected, actual }) => Ok(FileVerdict::ChecksumMismatch {
            expected: hex::encode(expected),
            actual:   hex::encode(actual),
        }),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HELLO: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_intact_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello world").unwrap();

        assert_eq!(verify_file(&path, 11, HELLO).unwrap(), FileVerdict::Intact);
        assert_eq!(verify_file(&path, 11, &HELLO.to_uppercase()).unwrap(), FileVerdict::Intact);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert_eq!(
            verify_file(&dir.path().join("absent"), 11, HELLO).unwrap(),
            FileVerdict::Missing
        );
        assert_eq!(verify_file(dir.path(), 11, HELLO).unwrap(), FileVerdict::Missing);
    }

    #[test]
    fn test_length_checked_before_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.txt");
        std::fs::write(&path, b"hello").unwrap();

        assert_eq!(
            verify_file(&path, 11, HELLO).unwrap(),
            FileVerdict::LengthMismatch {
                expected: 11,
                actual:   5,
            }
        );
    }

    #[test]
    fn test_checksum_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tampered.txt");
        std::fs::write(&path, b"hello_world").unwrap();

        match verify_file(&path, 11, HELLO).unwrap() {
            FileVerdict::ChecksumMismatch { expected, actual } => {
                assert_eq!(expected, HELLO);
                assert_eq!(actual, Sha256Hasher::hex_digest(b"hello_world"));
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_digest() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            verify_file(&dir.path().join("x"), 0, "zz"),
            Err(VerificationError::InvalidDigest(_))
        ));
    }
}
