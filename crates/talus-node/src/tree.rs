// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! The concrete tree instantiation this binary serves, and the
//! read/write-locked handle around it.

use parking_lot::RwLock;
use talus_mst::{Base, MerkleSearchTree, PersistentNodeStore, Sha256Hasher, U32};

pub type ReplicaStore = PersistentNodeStore<U32, U32, Sha256Hasher>;
pub type ReplicaTree = MerkleSearchTree<U32, U32, Sha256Hasher, ReplicaStore>;

/// Guards the local tree handle. Readers clone the handle under the read
/// lock and release it before traversing: cloning a
/// `MerkleSearchTree` is cheap since both the root hash and the store are
/// structurally shared.
pub struct SharedTree {
    inner: RwLock<ReplicaTree>,
}

impl SharedTree {
    pub fn new(base: Base) -> Self {
        Self { inner: RwLock::new(ReplicaTree::new(base, ReplicaStore::new())) }
    }

    /// A cheap, point-in-time handle: safe to traverse or hand to an
    /// anti-entropy round without holding the lock.
    pub fn snapshot(&self) -> ReplicaTree {
        self.inner.read().clone()
    }

    pub fn get(&self, key: U32) -> Option<U32> {
        self.snapshot().get(&key)
    }

    pub fn put(&self, key: U32, value: U32) -> ReplicaTree {
        let mut guard = self.inner.write();
        let updated = guard.put(key, value);
        *guard = updated.clone();
        updated
    }

    /// Merges `with` into the live tree under the write lock, per the
    /// responder's completion step.
    pub fn merge(&self, with: &ReplicaTree) -> talus_mst::Result<ReplicaTree> {
        let mut guard = self.inner.write();
        let merged = guard.merge(with)?;
        *guard = merged.clone();
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let tree = SharedTree::new(Base::Base16);
        tree.put(U32(1), U32(10));
        assert_eq!(tree.get(U32(1)), Some(U32(10)));
    }

    #[test]
    fn snapshot_is_unaffected_by_later_writes() {
        let tree = SharedTree::new(Base::Base16);
        tree.put(U32(1), U32(10));
        let snap = tree.snapshot();
        tree.put(U32(2), U32(20));
        assert_eq!(snap.get(&U32(2)), None);
        assert_eq!(tree.get(U32(2)), Some(U32(20)));
    }
}
