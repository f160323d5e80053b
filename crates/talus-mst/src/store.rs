// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! The content-addressed node store.
//!
//! A persistent hash-array-mapped map is called for: `put`/`remove`
//! return a new store value while old handles keep working, which is
//! exactly what [`im::HashMap`] (a real HAMT) gives for free. Cloning a
//! store is O(1) and shares structure with the original, so an
//! anti-entropy round can snapshot `(root, store)` at round start without
//! copying a single node.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::hash::{Digest, Hasher};
use crate::kv::{Key, Value};
use crate::node::Node;
use crate::serdes;

/// A `digest -> node` mapping. Implementations may back onto anything;
/// the in-memory `PersistentNodeStore` here is the only one this crate
/// ships; durable/remote backends are left to callers.
pub trait NodeStore<K, V>: Clone {
    fn get(&self, hash: &Digest) -> Option<Arc<Node<K, V>>>;
    fn put(&self, node: Node<K, V>) -> (Self, Digest);
    fn remove(&self, hash: &Digest) -> Self;
    fn size(&self) -> u64;
}

/// In-memory, persistent (copy-on-write) node store keyed by digest.
#[derive(Clone)]
pub struct PersistentNodeStore<K, V, H> {
    nodes: im::HashMap<Digest, Arc<Node<K, V>>>,
    _hasher: PhantomData<H>,
}

impl<K, V, H> PersistentNodeStore<K, V, H> {
    pub fn new() -> Self {
        Self { nodes: im::HashMap::new(), _hasher: PhantomData }
    }
}

impl<K, V, H> Default for PersistentNodeStore<K, V, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, V: Value, H: Hasher> NodeStore<K, V> for PersistentNodeStore<K, V, H> {
    fn get(&self, hash: &Digest) -> Option<Arc<Node<K, V>>> {
        self.nodes.get(hash).cloned()
    }

    fn put(&self, node: Node<K, V>) -> (Self, Digest) {
        let hash = H::digest(&serdes::serialize(&node));
        let nodes = self.nodes.update(hash, Arc::new(node));
        (Self { nodes, _hasher: PhantomData }, hash)
    }

    fn remove(&self, hash: &Digest) -> Self {
        Self { nodes: self.nodes.without(hash), _hasher: PhantomData }
    }

    fn size(&self) -> u64 {
        self.nodes.len() as u64
    }
}

/// Depth-first walk from `root` returning every hash that is referenced by
/// a reachable node but absent from `store`. This is the responder's "what
/// do I still need?" probe: it never loads a node it cannot find,
/// so it naturally stops descending into subtrees it hasn't received yet.
pub fn find_missing_nodes<K, V, S>(store: &S, root: Option<Digest>) -> Vec<Digest>
where
    S: NodeStore<K, V>,
{
    let mut missing = Vec::new();
    let mut stack = Vec::new();
    if let Some(h) = root {
        stack.push(h);
    }
    while let Some(hash) = stack.pop() {
        match store.get(&hash) {
            Some(node) => {
                if let Some(low) = node.low {
                    stack.push(low);
                }
                for child in &node.children {
                    if let Some(high) = child.high {
                        stack.push(high);
                    }
                }
            }
            None => missing.push(hash),
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Sha256Hasher;
    use crate::kv::U32;
    use crate::node::Child;

    type Store = PersistentNodeStore<U32, U32, Sha256Hasher>;

    #[test]
    fn put_then_get_round_trips() {
        let store = Store::new();
        let node = Node::new(0, None, vec![Child { key: U32(1), value: U32(1), high: None }]);
        let (store, hash) = store.put(node);
        assert!(store.get(&hash).is_some());
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn old_handle_survives_remove_on_new_handle() {
        let store = Store::new();
        let node = Node::new(0, None, vec![Child { key: U32(1), value: U32(1), high: None }]);
        let (store, hash) = store.put(node);
        let pruned = store.remove(&hash);
        assert!(store.get(&hash).is_some(), "old handle must still see the node");
        assert!(pruned.get(&hash).is_none());
    }

    #[test]
    fn identical_nodes_deduplicate_by_hash() {
        let store = Store::new();
        let node_a = Node::new(0, None, vec![Child { key: U32(1), value: U32(1), high: None }]);
        let node_b = node_a.clone();
        let (store, hash_a) = store.put(node_a);
        let (store, hash_b) = store.put(node_b);
        assert_eq!(hash_a, hash_b);
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn find_missing_nodes_stops_at_absent_hashes() {
        let full = Store::new();
        let node = Node::new(0, None, vec![Child { key: U32(1), value: U32(1), high: None }]);
        let (full, hash) = full.put(node);

        let empty = Store::new();
        assert_eq!(find_missing_nodes(&empty, Some(hash)), vec![hash]);
        assert_eq!(find_missing_nodes(&full, Some(hash)), Vec::<Digest>::new());
        assert_eq!(find_missing_nodes(&empty, None), Vec::<Digest>::new());
    }
}
