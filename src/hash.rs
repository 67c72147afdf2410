//! Content hashing for deduplication
//!
//! Images are identified by the MD5 digest of their raw bytes. MD5 is used for
//! identity only, not integrity against an adversary; the endpoint is trusted
//! and the only goal is spotting byte-identical responses.

use md5::{Digest as _, Md5};
use std::fmt;
use std::str::FromStr;

/// Length of a digest in bytes
pub const DIGEST_LEN: usize = 16;

/// A 128-bit content digest
///
/// Equality is byte equality. Displays as 32 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Wraps raw digest bytes
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest bytes
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Returns the lowercase hex form of the digest
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a digest from its hex form
    ///
    /// # Returns
    ///
    /// * `Ok(Digest)` - The string was exactly 32 hex characters
    /// * `Err(DigestParseError)` - Wrong length or non-hex characters
    pub fn from_hex(s: &str) -> Result<Self, DigestParseError> {
        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| DigestParseError(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Error returned when a string is not a valid hex digest
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid digest: '{0}'")]
pub struct DigestParseError(pub String);

/// Hashes a byte sequence into a [`Digest`]
///
/// Pure and total: the same input always yields the same digest, and the
/// empty slice is a valid input.
///
/// # Example
///
/// ```
/// use fake_faces::hash_bytes;
///
/// let digest = hash_bytes(b"");
/// assert_eq!(digest.to_hex(), "d41d8cd98f00b204e9800998ecf8427e");
/// ```
pub fn hash_bytes(bytes: &[u8]) -> Digest {
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&Md5::digest(bytes));
    Digest(out)
}
