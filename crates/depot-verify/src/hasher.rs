use sha2::{Digest, Sha256};

/// Incremental digest fed chunk by chunk as a file streams past.
pub trait Hasher: Send {
    /// Algorithm name as recorded in artifact metadata.
    const ALGORITHM: &'static str;

    fn update(&mut self, data: &[u8]);

    fn finalize(self) -> Vec<u8>;
}

#[derive(Debug, Clone, Default)]
pub struct Sha256Hasher {
    state: Sha256,
}

impl Sha256Hasher {
    pub fn new() -> Self { Self::default() }

    /// One-shot digest of an in-memory buffer.
    pub fn digest(data: &[u8]) -> Vec<u8> { Sha256::digest(data).to_vec() }

    /// Lowercase hex form of [`Sha256Hasher::digest`], the catalog's format.
    pub fn hex_digest(data: &[u8]) -> String { hex::encode(Self::digest(data)) }
}

impl Hasher for Sha256Hasher {
    const ALGORITHM: &'static str = "SHA-256";

    fn update(&mut self, data: &[u8]) { self.state.update(data); }

    fn finalize(self) -> Vec<u8> { self.state.finalize().to_vec() }
}
