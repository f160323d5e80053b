// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! Accepts a round: tracks the partial tree an originator is filling in,
//! answers with what's still missing, and merges once the tree is
//! complete.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use talus_common::TalusError;
use talus_mst::{find_missing_nodes, Digest, NodeStore, U32};
use talus_proto::{ProtoError, WireNode};
use tracing::{info, warn};
use uuid::Uuid;

use crate::tree::{ReplicaStore, ReplicaTree, SharedTree};

struct PartialRound {
    tree: ReplicaTree,
    target_root: Option<Digest>,
    /// The hashes we told the originator we were missing last — every node
    /// arriving in the next `RoundStep` must digest to one of these, or it
    /// didn't answer anything we actually asked for.
    expected: Vec<Digest>,
    opened_at: Instant,
}

/// `dest_rounds`: every round this replica is currently receiving, keyed
/// by the originator-chosen UUID.
pub struct Responder {
    local: Arc<SharedTree>,
    dest_rounds: DashMap<Uuid, PartialRound>,
}

impl Responder {
    pub fn new(local: Arc<SharedTree>) -> Self {
        Self { local, dest_rounds: DashMap::new() }
    }

    /// `RoundStart`: opens a partial tree rooted at the originator's
    /// announced root, seeded with our own store (so any node we already
    /// hold never needs to cross the wire), and answers with what it's
    /// still missing.
    pub fn round_start(&self, root_hash: Option<Digest>, round_uuid: Uuid) -> Vec<Digest> {
        let local_snapshot = self.local.snapshot();
        let partial = ReplicaTree::with_root(root_hash, local_snapshot.base(), local_snapshot.store().clone());
        let missing = find_missing_nodes::<U32, U32, ReplicaStore>(partial.store(), root_hash);

        self.dest_rounds.insert(
            round_uuid,
            PartialRound { tree: partial, target_root: root_hash, expected: missing.clone(), opened_at: Instant::now() },
        );
        missing
    }

    /// `RoundStep`: verifies each incoming node against the hash set we
    /// last advertised as missing, folds the verified nodes into the
    /// partial tree's store, and answers with the new missing set — or
    /// closes the round and merges if nothing is missing anymore.
    ///
    /// A node whose recomputed digest isn't one we asked for is rejected
    /// outright and nothing from this step is admitted: the store only
    /// ever recomputes a digest on `put`, so this is the one place a
    /// forged or corrupted node can be caught before it enters the tree.
    pub fn round_step(&self, round_uuid: Uuid, nodes: Vec<WireNode>) -> Result<Vec<Digest>, ProtoError> {
        let mut entry = self.dest_rounds.get_mut(&round_uuid).ok_or(ProtoError::UnknownRound)?;

        let mut store = entry.tree.store().clone();
        for wire in nodes {
            let node = wire.into_node().map_err(|_| ProtoError::MalformedKeyOrValue)?;
            let (new_store, hash) = store.put(node);
            if !entry.expected.contains(&hash) {
                return Err(ProtoError::HashMismatch);
            }
            store = new_store;
        }
        entry.tree = ReplicaTree::with_root(entry.target_root, entry.tree.base(), store);

        let missing = find_missing_nodes::<U32, U32, ReplicaStore>(entry.tree.store(), entry.target_root);
        entry.expected = missing.clone();
        let target_root = entry.target_root;
        let completed_tree = if missing.is_empty() { Some(entry.tree.clone()) } else { None };
        drop(entry);

        if let Some(partial) = completed_tree {
            self.dest_rounds.remove(&round_uuid);
            match self.local.merge(&partial) {
                Ok(_) => info!(%round_uuid, root = ?target_root, "anti-entropy round merged"),
                Err(e) => {
                    let err = TalusError::from(e);
                    warn!(%round_uuid, error = %err, "anti-entropy merge failed, dropping round");
                }
            }
        }

        Ok(missing)
    }

    /// Sweeps rounds an originator abandoned mid-stream: no final
    /// empty-list step ever arrived, so the round would otherwise sit in
    /// `dest_rounds` forever.
    pub fn reap_stale_rounds(&self, max_age: Duration) {
        let now = Instant::now();
        self.dest_rounds.retain(|uuid, round| {
            let keep = now.duration_since(round.opened_at) < max_age;
            if !keep {
                info!(round_uuid = %uuid, "reaping abandoned anti-entropy round");
            }
            keep
        });
    }

    pub fn open_round_count(&self) -> usize {
        self.dest_rounds.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talus_mst::{Base, NodeStore};

    /// Drives a full round against `responder` without any actual RPC:
    /// plays both roles locally, pulling nodes out of `source`'s store the
    /// same way `Originator::drive` would.
    fn run_round_against(responder: &Responder, source: &ReplicaTree) -> Uuid {
        let round_uuid = Uuid::new_v4();
        let mut missing = responder.round_start(source.root_hash(), round_uuid);
        while !missing.is_empty() {
            let nodes = missing
                .iter()
                .map(|h| {
                    let node = source.store().get(h).expect("source must own every hash it advertised");
                    WireNode::from_node(&node)
                })
                .collect();
            missing = responder.round_step(round_uuid, nodes).expect("round_uuid is known");
        }
        round_uuid
    }

    #[test]
    fn full_round_merges_missing_keys_into_local_tree() {
        let local = Arc::new(SharedTree::new(Base::Base16));
        local.put(U32(1), U32(10));

        let mut source = ReplicaTree::new(Base::Base16, ReplicaStore::new());
        for k in 0..20u32 {
            source = source.put(U32(k), U32(k * 10));
        }

        let responder = Responder::new(Arc::clone(&local));
        run_round_against(&responder, &source);

        for k in 0..20u32 {
            assert_eq!(local.get(U32(k)), Some(U32(k * 10)));
        }
        assert_eq!(responder.open_round_count(), 0);
    }

    #[test]
    fn round_step_rejects_a_node_that_does_not_hash_to_a_requested_digest() {
        let local = Arc::new(SharedTree::new(Base::Base16));
        let mut source = ReplicaTree::new(Base::Base16, ReplicaStore::new());
        source = source.put(U32(1), U32(10));

        let responder = Responder::new(Arc::clone(&local));
        let round_uuid = Uuid::new_v4();
        let missing = responder.round_start(source.root_hash(), round_uuid);
        assert_eq!(missing.len(), 1);

        let mut node = (*source.store().get(&missing[0]).unwrap()).clone();
        node.children[0].value = U32(99999);
        let tampered = WireNode::from_node(&node);

        let result = responder.round_step(round_uuid, vec![tampered]);
        assert!(matches!(result, Err(ProtoError::HashMismatch)));
    }

    #[test]
    fn round_step_on_unknown_uuid_is_rejected() {
        let local = Arc::new(SharedTree::new(Base::Base16));
        let responder = Responder::new(local);
        let result = responder.round_step(Uuid::new_v4(), vec![]);
        assert!(matches!(result, Err(ProtoError::UnknownRound)));
    }

    #[test]
    fn round_start_against_empty_responder_with_empty_source_has_nothing_missing() {
        let local = Arc::new(SharedTree::new(Base::Base16));
        let responder = Responder::new(local);
        let missing = responder.round_start(None, Uuid::new_v4());
        assert!(missing.is_empty());
    }

    #[test]
    fn reap_stale_rounds_drops_rounds_past_max_age() {
        let local = Arc::new(SharedTree::new(Base::Base16));
        let mut source = ReplicaTree::new(Base::Base16, ReplicaStore::new());
        source = source.put(U32(1), U32(1));

        let responder = Responder::new(local);
        // A fresh root_hash with an empty responder store always has at
        // least the root hash missing, so the round stays open.
        responder.round_start(source.root_hash(), Uuid::new_v4());
        assert_eq!(responder.open_round_count(), 1);

        responder.reap_stale_rounds(Duration::from_secs(0));
        assert_eq!(responder.open_round_count(), 0);
    }
}
