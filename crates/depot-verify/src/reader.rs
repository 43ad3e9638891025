use std::io::{self, Read};

use crate::{Hasher, Result, VerificationError};

/// A [`Read`] adapter that feeds every byte it yields into a [`Hasher`].
///
/// Hashing happens as a side effect of reading, so verifying a file costs a
/// single pass with whatever buffer the caller supplies.
#[derive(Debug)]
pub struct VerifiedReader<R, H> {
    inner:  R,
    hasher: H,
    seen:   u64,
}

impl<R, H> VerifiedReader<R, H> {
    pub fn new(inner: R, hasher: H) -> Self {
        Self {
            inner,
            hasher,
            seen: 0,
        }
    }

    /// Bytes hashed so far.
    pub fn bytes_read(&self) -> u64 { self.seen }
}

impl<R: Read, H: Hasher> Read for VerifiedReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.seen += n as u64;
        Ok(n)
    }
}

impl<R: Read, H: Hasher> VerifiedReader<R, H> {
    /// Read to end of input using `buf` as scratch space. Returns the total
    /// byte count.
    pub fn consume(&mut self, buf: &mut [u8]) -> io::Result<u64> {
        loop {
            match self.read(buf) {
                Ok(0) => return Ok(self.seen),
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }

    /// Compare the digest of everything read against `expected`. Returns the
    /// number of bytes that were verified.
    pub fn finish(self, expected: &[u8]) -> Result<u64> {
        let actual = self.hasher.finalize();
        if actual != expected {
            return Err(VerificationError::Mismatch {
                expected: expected.to_vec(),
                actual,
            });
        }
        Ok(self.seen)
    }
}
