use std::time::Duration;

use depot_core::StorageQuantity;

/// Per-transfer tuning.
///
/// # Examples
///
/// ```
/// use depot_core::StorageQuantity;
/// use depot_fetch::TransferOptions;
/// use std::time::Duration;
///
/// let options = TransferOptions::default()
///     .buffer_size(StorageQuantity::kb(64))
///     .timeout(Duration::from_secs(30));
/// assert_eq!(options.chunk_len(), 64 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    /// Upper bound on bytes written per loop iteration.
    pub buffer_size: StorageQuantity,
    /// Wall-clock budget for the whole transfer, measured from its start.
    pub timeout:     Duration,
}

impl TransferOptions {
    pub const DEFAULT_BUFFER_SIZE: StorageQuantity = StorageQuantity::kb(8);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

    #[must_use]
    pub fn buffer_size(mut self, size: StorageQuantity) -> Self {
        self.buffer_size = size;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Buffer size as a write length, never zero.
    pub fn chunk_len(&self) -> usize {
        usize::try_from(self.buffer_size.as_bytes()).unwrap_or(usize::MAX).max(1)
    }
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            buffer_size: Self::DEFAULT_BUFFER_SIZE,
            timeout:     Self::DEFAULT_TIMEOUT,
        }
    }
}
