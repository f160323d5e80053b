// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! The two capability sets the tree is generic over: ordered, serializable
//! keys, and serializable, semilattice-mergeable values.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io;

/// A deterministic byte encoding, used both for the canonical node
/// serialization and for digesting a key to compute its level.
pub trait Writable {
    fn write(&self, w: &mut dyn io::Write) -> io::Result<()>;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // A `Vec<u8>` writer never errors.
        self.write(&mut buf).expect("writing to a Vec cannot fail");
        buf
    }
}

/// A totally ordered value with a deterministic byte serialization.
///
/// Equality must agree with `Ord`: the tree never relies on a separate
/// equality definition, so implementors get this for free via the standard
/// `Eq`/`Ord` derives.
pub trait Key: Writable + Ord + Clone + Send + Sync + 'static {}

impl<T: Writable + Ord + Clone + Send + Sync + 'static> Key for T {}

/// A value with a deterministic byte serialization and an associative,
/// commutative, idempotent merge operator. Implementors must form a
/// semilattice so concurrent writes converge regardless of arrival order.
pub trait Value: Writable + Clone + Send + Sync + 'static {
    fn merge(&self, other: &Self) -> Self;
}

/// The inverse of [`Writable`]: decodes a byte slice written by `write`
/// back into a value. Only the wire layer needs this — `put`/`get`/`merge`
/// never decode a key or value, they only move already-typed values
/// around — so it is kept separate from [`Key`]/[`Value`] rather than
/// folded into their bounds.
pub trait Readable: Sized {
    fn read(bytes: &[u8]) -> io::Result<Self>;
}

/// Reference key/value type used throughout the test suite: `u32` with
/// `merge = max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct U32(pub u32);

impl Writable for U32 {
    fn write(&self, w: &mut dyn io::Write) -> io::Result<()> {
        w.write_u32::<LittleEndian>(self.0)
    }
}

impl Value for U32 {
    fn merge(&self, other: &Self) -> Self {
        U32(self.0.max(other.0))
    }
}

impl Readable for U32 {
    fn read(mut bytes: &[u8]) -> io::Result<Self> {
        Ok(U32(bytes.read_u32::<LittleEndian>()?))
    }
}

impl From<u32> for U32 {
    fn from(v: u32) -> Self {
        U32(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_merge_is_max() {
        assert_eq!(U32(5).merge(&U32(3)), U32(5));
        assert_eq!(U32(5).merge(&U32(9)), U32(9));
    }

    #[test]
    fn u32_writes_little_endian() {
        assert_eq!(U32(1).to_bytes(), vec![1, 0, 0, 0]);
    }

    #[test]
    fn u32_round_trips_through_bytes() {
        let original = U32(424242);
        assert_eq!(U32::read(&original.to_bytes()).unwrap(), original);
    }
}
