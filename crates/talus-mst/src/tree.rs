// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! `put` / `get` / `merge` over a root hash and a store: the handle clients
//! actually use.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::base::Base;
use crate::error::{MstError, Result};
use crate::hash::{Digest, Hasher};
use crate::kv::{Key, Value};
use crate::node::{Child, Node};
use crate::store::NodeStore;

/// A `(root, base, hash, store)` handle. A null root is the empty tree.
/// Two trees with identical `base`, hash function, and key/value set always
/// produce the same root hash, regardless of insertion order.
#[derive(Clone)]
pub struct MerkleSearchTree<K, V, H, S> {
    root: Option<Digest>,
    base: Base,
    store: S,
    _marker: PhantomData<(K, V, H)>,
}

impl<K, V, H, S> MerkleSearchTree<K, V, H, S>
where
    K: Key,
    V: Value,
    H: Hasher,
    S: NodeStore<K, V>,
{
    pub fn new(base: Base, store: S) -> Self {
        Self { root: None, base, store, _marker: PhantomData }
    }

    pub fn with_root(root: Option<Digest>, base: Base, store: S) -> Self {
        Self { root, base, store, _marker: PhantomData }
    }

    pub fn root_hash(&self) -> Option<Digest> {
        self.root
    }

    pub fn base(&self) -> Base {
        self.base
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn level_of(&self, key: &K) -> u32 {
        self.base.leading_zeros(H::digest(&key.to_bytes()).as_bytes())
    }

    fn with_store_and_root(&self, store: S, root: Option<Digest>) -> Self {
        Self { root, base: self.base, store, _marker: PhantomData }
    }

    /// Checks `self.store` first, falling back to `fallback`. Mirrors the
    /// lookup order a partial tree uses during an anti-entropy round: nodes
    /// already owned locally are never re-requested from the accumulator a
    /// split is staging nodes into.
    fn get_node_maybe(&self, hash: Digest, fallback: &S) -> Arc<Node<K, V>> {
        self.store
            .get(&hash)
            .or_else(|| fallback.get(&hash))
            .unwrap_or_else(|| panic!("node {hash:?} missing from both stores"))
    }

    /// Partitions the tree rooted at `node_hash` into `{k | k < key}` and
    /// `{k | k > key}`. `self` determines which store is
    /// consulted first for a node also possibly staged in `store`; this
    /// lets `merge` call `with.split_into` to split the *other* tree's
    /// subtrees without ever mutating `with`'s own store.
    fn split_into(&self, mut store: S, node_hash: Option<Digest>, key: &K) -> (S, Option<Digest>, Option<Digest>) {
        let node_hash = match node_hash {
            Some(h) => h,
            None => return (store, None, None),
        };
        let n = self.get_node_maybe(node_hash, &store);
        let (child, i) = n.find_child(key);
        store = store.remove(&node_hash);

        let l_children = n.children[..i].to_vec();
        let r_children = n.children[i..].to_vec();

        let (store, l_sub, r_sub) = self.split_into(store, child, key);
        let mut store = store;

        let l_hash = if l_children.is_empty() {
            l_sub
        } else {
            let l_node = Node::new(n.level, n.low, l_children).with_hash_at(l_sub, i);
            let (s, h) = store.put(l_node);
            store = s;
            Some(h)
        };
        let r_hash = if r_children.is_empty() {
            r_sub
        } else {
            let r_node = Node::new(n.level, r_sub, r_children);
            let (s, h) = store.put(r_node);
            store = s;
            Some(h)
        };
        (store, l_hash, r_hash)
    }

    fn put_into(&self, mut store: S, node_hash: Option<Digest>, key: &K, value: &V, at_level: u32) -> (S, Digest) {
        let Some(node_hash) = node_hash else {
            let leaf = Node::leaf(at_level, key.clone(), value.clone());
            return store.put(leaf);
        };

        let n = store
            .get(&node_hash)
            .unwrap_or_else(|| panic!("node {node_hash:?} referenced but missing from store"));

        if at_level < n.level {
            store = store.remove(&node_hash);
            let (child_hash, i) = n.find_child(key);
            let (store, child_hash) = self.put_into(store, child_hash, key, value, at_level);
            let new_node = n.with_hash_at(Some(child_hash), i);
            store.put(new_node)
        } else if at_level == n.level {
            store = store.remove(&node_hash);
            let i = n.find(key);
            if i > 0 && n.children[i - 1].key == *key {
                let new_node = n.with_merged_value_at(value, i - 1);
                store.put(new_node)
            } else {
                let (store, l, r) = self.split_into(store, n.child_at(i), key);
                let new_node = n.with_child_inserted_at(key.clone(), value.clone(), r, i).with_hash_at(l, i);
                store.put(new_node)
            }
        } else {
            let (store, l, r) = self.split_into(store, Some(node_hash), key);
            let new_node = Node::new(at_level, l, vec![Child { key: key.clone(), value: value.clone(), high: r }]);
            store.put(new_node)
        }
    }

    /// Inserts or, on a key collision, merges `value` into the existing
    /// value at `key` via `⊔`.
    pub fn put(&self, key: K, value: V) -> Self {
        let level = self.level_of(&key);
        let (store, hash) = self.put_into(self.store.clone(), self.root, &key, &value, level);
        self.with_store_and_root(store, Some(hash))
    }

    fn get_from(&self, node_hash: Option<Digest>, key: &K) -> Option<V> {
        let node_hash = node_hash?;
        let n = self
            .store
            .get(&node_hash)
            .unwrap_or_else(|| panic!("node {node_hash:?} referenced but missing from store"));
        let i = n.find(key);
        if i > 0 && n.children[i - 1].key == *key {
            return Some(n.children[i - 1].value.clone());
        }
        self.get_from(n.child_at(i), key)
    }

    /// Returns the converged value at `key`, or `None` if it was never put.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_from(self.root, key)
    }

    #[allow(clippy::too_many_arguments)]
    fn merge_into(&self, with: &Self, mut store: S, l: Option<Digest>, r: Option<Digest>) -> Result<(S, Option<Digest>)> {
        if l.is_none() {
            return match r {
                None => Ok((store, None)),
                Some(r_hash) => {
                    let r_node = with
                        .store
                        .get(&r_hash)
                        .unwrap_or_else(|| panic!("node {r_hash:?} advertised but missing from with.store"));
                    let (s, _) = self.merge_into(with, store, None, r_node.low)?;
                    store = s;
                    for child in &r_node.children {
                        let (s, _) = self.merge_into(with, store, None, child.high)?;
                        store = s;
                    }
                    let (store, hash) = store.put((*r_node).clone());
                    Ok((store, Some(hash)))
                }
            };
        }
        if r.is_none() || l == r {
            return Ok((store, l));
        }
        let l_hash = l.expect("checked above");
        let r_hash = r.expect("checked above");

        let l_node = store
            .get(&l_hash)
            .unwrap_or_else(|| panic!("node {l_hash:?} missing from store"));
        let r_node = with.get_node_maybe(r_hash, &store);

        let level = l_node.level.max(r_node.level);
        let mut l_low = Some(l_hash);
        let mut r_low = Some(r_hash);
        let mut l_children: Vec<Child<K, V>> = Vec::new();
        let mut r_children: Vec<Child<K, V>> = Vec::new();
        if l_node.level >= r_node.level {
            l_low = l_node.low;
            l_children = l_node.children.clone();
        }
        if l_node.level <= r_node.level {
            r_low = r_node.low;
            r_children = r_node.children.clone();
        }

        let l_n = l_children.len();
        let r_n = r_children.len();
        let mut low: Option<Digest> = None;
        let mut children: Vec<Child<K, V>> = Vec::new();
        let mut l_cur = 0usize;
        let mut r_cur = 0usize;
        let mut i = 0usize;

        while l_cur <= l_n && r_cur <= r_n {
            let next_node: Option<Digest>;
            let mut inter_node: Option<Digest> = None;

            if l_cur == l_n && r_cur == r_n {
                let (s, n) = self.merge_into(with, store, l_low, r_low)?;
                store = s;
                next_node = n;
                l_cur += 1;
                r_cur += 1;
            } else if l_cur == l_n {
                let r_child = r_children[r_cur].clone();
                children.push(Child { key: r_child.key.clone(), value: r_child.value.clone(), high: None });
                let (s, inter, new_l_low) = self.split_into(store, l_low, &r_child.key);
                store = s;
                inter_node = inter;
                l_low = new_l_low;
                let (s, n) = self.merge_into(with, store, inter_node, r_low)?;
                store = s;
                next_node = n;
                r_low = r_child.high;
                r_cur += 1;
            } else if r_cur == r_n {
                let l_child = l_children[l_cur].clone();
                children.push(Child { key: l_child.key.clone(), value: l_child.value.clone(), high: None });
                let (s, inter, new_r_low) = with.split_into(store, r_low, &l_child.key);
                store = s;
                inter_node = inter;
                r_low = new_r_low;
                let (s, n) = self.merge_into(with, store, l_low, inter_node)?;
                store = s;
                next_node = n;
                l_low = l_child.high;
                l_cur += 1;
            } else {
                let l_child = l_children[l_cur].clone();
                let r_child = r_children[r_cur].clone();
                if l_child.key < r_child.key {
                    children.push(Child { key: l_child.key.clone(), value: l_child.value.clone(), high: None });
                    let (s, inter, new_r_low) = with.split_into(store, r_low, &l_child.key);
                    store = s;
                    inter_node = inter;
                    r_low = new_r_low;
                    let (s, n) = self.merge_into(with, store, l_low, inter_node)?;
                    store = s;
                    next_node = n;
                    l_low = l_child.high;
                    l_cur += 1;
                } else if r_child.key < l_child.key {
                    children.push(Child { key: r_child.key.clone(), value: r_child.value.clone(), high: None });
                    let (s, inter, new_l_low) = self.split_into(store, l_low, &r_child.key);
                    store = s;
                    inter_node = inter;
                    l_low = new_l_low;
                    let (s, n) = self.merge_into(with, store, inter_node, r_low)?;
                    store = s;
                    next_node = n;
                    r_low = r_child.high;
                    r_cur += 1;
                } else {
                    let (s, n) = self.merge_into(with, store, l_low, r_low)?;
                    store = s;
                    next_node = n;
                    let merged_value = l_child.value.merge(&r_child.value);
                    children.push(Child { key: l_child.key.clone(), value: merged_value, high: None });
                    l_low = l_child.high;
                    r_low = r_child.high;
                    l_cur += 1;
                    r_cur += 1;
                }
            }

            if i == 0 {
                low = next_node;
            } else {
                children[i - 1].high = next_node;
            }
            if let Some(inter) = inter_node {
                store = store.remove(&inter);
            }
            i += 1;
        }

        if children.is_empty() {
            return Err(MstError::EmptyMergeResult);
        }

        store = store.remove(&l_hash);
        store = store.remove(&r_hash);
        let (store, hash) = store.put(Node::new(level, low, children));
        Ok((store, Some(hash)))
    }

    /// Merges `with` into `self`, converging both trees' key/value sets
    /// through the value semilattice. Commutative and idempotent: the
    /// result's root hash does not depend on merge order, and merging a
    /// tree with itself is a no-op.
    pub fn merge(&self, with: &Self) -> Result<Self> {
        if self.base != with.base {
            return Err(MstError::BaseMismatch { ours: self.base, theirs: with.base });
        }
        let (store, root) = self.merge_into(with, self.store.clone(), self.root, with.root)?;
        Ok(self.with_store_and_root(store, root))
    }

    fn num_nodes_from(&self, node_hash: Option<Digest>) -> u64 {
        let Some(node_hash) = node_hash else { return 0 };
        let n = self
            .store
            .get(&node_hash)
            .unwrap_or_else(|| panic!("node {node_hash:?} referenced but missing from store"));
        let mut count = 1 + self.num_nodes_from(n.low);
        for child in &n.children {
            count += self.num_nodes_from(child.high);
        }
        count
    }

    /// Count of nodes reachable from the root, by walking the tree. Used
    /// by tests to check the store-tightness invariant: `store.size() ==
    /// num_nodes()` after a sequence of `put`/`merge` operations.
    pub fn num_nodes(&self) -> u64 {
        self.num_nodes_from(self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Sha256Hasher;
    use crate::kv::U32;
    use crate::store::PersistentNodeStore;

    type Tree = MerkleSearchTree<U32, U32, Sha256Hasher, PersistentNodeStore<U32, U32, Sha256Hasher>>;

    fn empty() -> Tree {
        Tree::new(Base::Base16, PersistentNodeStore::new())
    }

    #[test]
    fn empty_tree_has_no_root_and_no_values() {
        let t = empty();
        assert_eq!(t.root_hash(), None);
        assert_eq!(t.get(&U32(1)), None);
        assert_eq!(t.num_nodes(), 0);
    }

    #[test]
    fn single_put_is_readable() {
        let t = empty().put(U32(1), U32(10));
        assert_eq!(t.get(&U32(1)), Some(U32(10)));
        assert_eq!(t.num_nodes(), 1);
        assert_eq!(t.store().size(), 1);
    }

    #[test]
    fn insertion_order_does_not_affect_root_hash() {
        let mut a = empty();
        for (k, v) in [(1, 10), (2, 20), (3, 30)] {
            a = a.put(U32(k), U32(v));
        }
        let mut b = empty();
        for (k, v) in [(3, 30), (1, 10), (2, 20)] {
            b = b.put(U32(k), U32(v));
        }
        assert_eq!(a.root_hash(), b.root_hash());
    }

    #[test]
    fn repeated_put_merges_value_with_semilattice() {
        let t = empty().put(U32(7), U32(5)).put(U32(7), U32(3));
        assert_eq!(t.get(&U32(7)), Some(U32(5)));
        let t = t.put(U32(7), U32(9));
        assert_eq!(t.get(&U32(7)), Some(U32(9)));
    }

    #[test]
    fn store_tightness_holds_after_many_puts() {
        let mut t = empty();
        for k in 0..200u32 {
            t = t.put(U32(k), U32(k));
        }
        assert_eq!(t.store().size(), t.num_nodes());
    }

    #[test]
    fn merge_is_commutative_and_idempotent() {
        let mut l = empty();
        for k in 0..50u32 {
            l = l.put(U32(k), U32(k));
        }
        let mut r = empty();
        for k in 25..75u32 {
            r = r.put(U32(k), U32(k));
        }

        let lr = l.merge(&r).unwrap();
        let rl = r.merge(&l).unwrap();
        assert_eq!(lr.root_hash(), rl.root_hash());

        for i in 0..75 {
            assert_eq!(lr.get(&U32(i)), Some(U32(i)));
        }

        let self_merge = l.merge(&l).unwrap();
        assert_eq!(self_merge.root_hash(), l.root_hash());
    }

    #[test]
    fn merge_is_associative() {
        let mut a = empty();
        for k in 0..20u32 {
            a = a.put(U32(k), U32(k));
        }
        let mut b = empty();
        for k in 10..30u32 {
            b = b.put(U32(k * 2), U32(k));
        }
        let mut c = empty();
        for k in 5..15u32 {
            c = c.put(U32(k * 3), U32(k));
        }

        let ab_c = a.merge(&b).unwrap().merge(&c).unwrap();
        let a_bc = a.merge(&b.merge(&c).unwrap()).unwrap();
        assert_eq!(ab_c.root_hash(), a_bc.root_hash());
    }

    #[test]
    fn store_tightness_holds_after_merge() {
        let mut l = empty();
        for k in 0..40u32 {
            l = l.put(U32(k), U32(k));
        }
        let mut r = empty();
        for k in 20..60u32 {
            r = r.put(U32(k), U32(k));
        }
        let merged = l.merge(&r).unwrap();
        assert_eq!(merged.store().size(), merged.num_nodes());
    }

    #[test]
    fn mismatched_base_rejects_merge() {
        let a = MerkleSearchTree::<U32, U32, Sha256Hasher, PersistentNodeStore<_, _, _>>::new(
            Base::Base2,
            PersistentNodeStore::new(),
        )
        .put(U32(1), U32(1));
        let b = MerkleSearchTree::<U32, U32, Sha256Hasher, PersistentNodeStore<_, _, _>>::new(
            Base::Base32,
            PersistentNodeStore::new(),
        )
        .put(U32(1), U32(1));
        assert!(matches!(a.merge(&b), Err(MstError::BaseMismatch { .. })));
    }
}
