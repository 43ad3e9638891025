//! Content verification primitives for downloaded artifacts.
//!
//! Hashing is incremental so files of any size are verified in a single
//! streaming pass with a bounded buffer.
//!
//! # Example
//!
//! ```
//! use depot_verify::{Sha256Hasher, VerifiedReader};
//!
//! let data = b"hello world";
//! let expected = Sha256Hasher::digest(data);
//!
//! let mut reader = VerifiedReader::new(&data[..], Sha256Hasher::new());
//! let mut scratch = [0u8; 4];
//! reader.consume(&mut scratch).unwrap();
//!
//! assert_eq!(reader.finish(&expected).unwrap(), 11);
//! ```

pub use self::error::{Result, VerificationError};
pub use self::file::{FileVerdict, verify_file};
pub use self::hasher::{Hasher, Sha256Hasher};
pub use self::reader::VerifiedReader;

mod error;
mod file;
mod hasher;
mod reader;
