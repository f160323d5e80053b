// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! The digest wrapper used for both key leveling and node content addresses.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;

/// Output of the configured digest function. Fixed at 32 bytes: the
/// reference hash function is SHA-256, and every store/wire path treats a
/// digest as an opaque fixed-width byte string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    pub const LEN: usize = 32;

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buf = [0u8; Self::LEN];
        buf.copy_from_slice(bytes);
        Self(buf)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Digest function used to hash a key (for leveling) and a node's canonical
/// serialization (for content addressing). Both uses share the same
/// function so that a tree's `base` and hash choice together determine its
/// entire structure.
pub trait Hasher: Clone + Send + Sync + 'static {
    fn digest(bytes: &[u8]) -> Digest;
}

/// The reference hash function, SHA-256.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn digest(bytes: &[u8]) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Digest::from_bytes(&hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_digest_is_stable() {
        let a = Sha256Hasher::digest(b"talus");
        let b = Sha256Hasher::digest(b"talus");
        assert_eq!(a, b);
        assert_ne!(a, Sha256Hasher::digest(b"other"));
    }
}
