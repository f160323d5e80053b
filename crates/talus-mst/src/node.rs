// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! Immutable tree nodes and the pure operations that build new nodes from
//! old ones. Nothing here touches a store: every function takes and
//! returns plain values.

use crate::hash::Digest;
use crate::kv::{Key, Value};

/// One `(key, value, high)` triple inside a node's ordered children.
/// `high` is the subtree holding keys strictly between this child's key and
/// the next sibling's (or unbounded above, for the last child).
#[derive(Debug, Clone)]
pub struct Child<K, V> {
    pub key: K,
    pub value: V,
    pub high: Option<Digest>,
}

/// An immutable node: a level, a `low` pointer for keys below the first
/// child, and the ordered children themselves.
///
/// Invariants (checked by callers, not enforced by the type):
/// - `children` is non-empty and strictly ascending by key.
/// - every key in `children` has the same level, equal to `level`.
/// - `low` and every child's `high` reference subtrees of strictly lower level.
#[derive(Debug, Clone)]
pub struct Node<K, V> {
    pub level: u32,
    pub low: Option<Digest>,
    pub children: Vec<Child<K, V>>,
}

impl<K: Key, V: Value> Node<K, V> {
    pub fn new(level: u32, low: Option<Digest>, children: Vec<Child<K, V>>) -> Self {
        Self { level, low, children }
    }

    pub fn leaf(level: u32, key: K, value: V) -> Self {
        Self {
            level,
            low: None,
            children: vec![Child { key, value, high: None }],
        }
    }

    /// Smallest `i` such that `key < children[i].key`, or `children.len()`
    /// if no child key is greater.
    pub fn find(&self, key: &K) -> usize {
        self.children.partition_point(|child| child.key < *key)
    }

    /// The subtree hash below child `i`: `low` at `i == 0`, else
    /// `children[i - 1].high`.
    pub fn child_at(&self, i: usize) -> Option<Digest> {
        if i == 0 {
            self.low
        } else {
            self.children[i - 1].high
        }
    }

    /// `(child_at(find(key)), find(key))`. Callers must never invoke this
    /// when `key` exactly matches an existing child at this level; doing so
    /// is a programming error, not a reachable runtime condition.
    pub fn find_child(&self, key: &K) -> (Option<Digest>, usize) {
        let i = self.find(key);
        assert!(
            !(i > 0 && self.children[i - 1].key == *key),
            "find_child called with a key that matches an existing child"
        );
        (self.child_at(i), i)
    }

    /// Copy-on-write replacement of the subtree hash at slot `i`.
    pub fn with_hash_at(&self, hash: Option<Digest>, i: usize) -> Self {
        if i == 0 {
            Self { level: self.level, low: hash, children: self.children.clone() }
        } else {
            let mut children = self.children.clone();
            children[i - 1].high = hash;
            Self { level: self.level, low: self.low, children }
        }
    }

    /// Replace `children[i].value` with `children[i].value ⊔ value`.
    pub fn with_merged_value_at(&self, value: &V, i: usize) -> Self {
        let mut children = self.children.clone();
        children[i].value = children[i].value.merge(value);
        Self { level: self.level, low: self.low, children }
    }

    /// Insert a new child at index `i`, preserving order.
    pub fn with_child_inserted_at(&self, key: K, value: V, high: Option<Digest>, i: usize) -> Self {
        let mut children = Vec::with_capacity(self.children.len() + 1);
        children.extend_from_slice(&self.children[..i]);
        children.push(Child { key, value, high });
        children.extend_from_slice(&self.children[i..]);
        Self { level: self.level, low: self.low, children }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::U32;

    fn child(k: u32, v: u32) -> Child<U32, U32> {
        Child { key: U32(k), value: U32(v), high: None }
    }

    fn node(keys: &[u32]) -> Node<U32, U32> {
        Node::new(0, None, keys.iter().map(|&k| child(k, k)).collect())
    }

    #[test]
    fn find_returns_insertion_point() {
        let n = node(&[10, 20, 30]);
        assert_eq!(n.find(&U32(5)), 0);
        assert_eq!(n.find(&U32(10)), 1);
        assert_eq!(n.find(&U32(15)), 1);
        assert_eq!(n.find(&U32(30)), 3);
        assert_eq!(n.find(&U32(31)), 3);
    }

    #[test]
    fn child_at_low_and_high() {
        let d = Digest::from_bytes(&[7u8; 32]);
        let mut n = node(&[10, 20]);
        n.low = Some(d);
        assert_eq!(n.child_at(0), Some(d));
        assert_eq!(n.child_at(1), None);
    }

    #[test]
    #[should_panic]
    fn find_child_on_existing_key_panics() {
        let n = node(&[10, 20]);
        n.find_child(&U32(10));
    }

    #[test]
    fn with_child_inserted_preserves_order() {
        let n = node(&[10, 30]);
        let n2 = n.with_child_inserted_at(U32(20), U32(20), None, 1);
        let keys: Vec<u32> = n2.children.iter().map(|c| c.key.0).collect();
        assert_eq!(keys, vec![10, 20, 30]);
    }

    #[test]
    fn with_merged_value_applies_semilattice_merge() {
        let n = node(&[10]);
        let n2 = n.with_merged_value_at(&U32(99), 0);
        assert_eq!(n2.children[0].value, U32(99));
    }
}
