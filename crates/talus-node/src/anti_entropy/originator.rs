// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! Drives a round against one peer: sends the local root, streams the
//! nodes the peer says it's missing, and retires once the peer reports
//! nothing left to send.

use dashmap::DashMap;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use talus_common::TalusError;
use talus_mst::NodeStore;
use talus_proto::{RoundStartRequest, RoundStepRequest, TalusRpcClient, WireNode};

use crate::peers::Peer;
use crate::tree::ReplicaTree;

/// One outstanding round: who it's with, the local state it's gossiping
/// from, and a handle to cancel it early.
struct ActiveRound {
    cancel: watch::Sender<bool>,
}

/// Starts at most one concurrent round per peer. Starting a round
/// for a peer that already has one in flight is a no-op.
#[derive(Default)]
pub struct Originator {
    active_rounds: DashMap<Peer, ActiveRound>,
}

impl Originator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers and spawns a round against `peer` using `snapshot` as the
    /// frozen local state (round snapshots). Returns immediately;
    /// the round itself runs on a background task.
    pub fn start_round(self: &std::sync::Arc<Self>, peer: Peer, snapshot: ReplicaTree) {
        if self.active_rounds.contains_key(&peer) {
            return;
        }
        let (cancel_tx, cancel_rx) = watch::channel(false);
        self.active_rounds.insert(peer.clone(), ActiveRound { cancel: cancel_tx });

        let this = std::sync::Arc::clone(self);
        tokio::spawn(async move {
            run_round(peer.clone(), snapshot, cancel_rx).await;
            this.active_rounds.remove(&peer);
        });
    }

    /// Cancels an in-flight round, if one exists, transitioning it
    /// `OPEN -> CLOSED` without merging.
    pub fn cancel(&self, peer: &Peer) {
        if let Some((_, round)) = self.active_rounds.remove(peer) {
            let _ = round.cancel.send(true);
        }
    }

    pub fn active_peer_count(&self) -> usize {
        self.active_rounds.len()
    }
}

async fn run_round(peer: Peer, snapshot: ReplicaTree, mut cancel: watch::Receiver<bool>) {
    let round_uuid = Uuid::new_v4();
    let url = format!("http://{}", peer.endpoint());

    let client = match HttpClientBuilder::default().build(&url) {
        Ok(client) => client,
        Err(e) => {
            warn!(peer = %peer.endpoint(), error = %e, "anti-entropy: failed to connect");
            return;
        }
    };

    match drive(&client, &peer, round_uuid, &snapshot, &mut cancel).await {
        Ok(()) | Err(TalusError::Cancelled) => {}
        Err(e) => warn!(peer = %peer.endpoint(), %round_uuid, error = %e, "anti-entropy round aborted"),
    }
}

async fn drive(
    client: &HttpClient,
    peer: &Peer,
    round_uuid: Uuid,
    snapshot: &ReplicaTree,
    cancel: &mut watch::Receiver<bool>,
) -> Result<(), TalusError> {
    let root_hash = snapshot.root_hash().map(|h| h.to_vec()).unwrap_or_default();

    let mut missing = client
        .round_start(RoundStartRequest { root_hash, round_uuid })
        .await
        .map_err(|e| TalusError::Transport(e.to_string()))?
        .hashes;

    while !missing.is_empty() {
        if *cancel.borrow() {
            info!(peer = %peer.endpoint(), %round_uuid, "anti-entropy round cancelled");
            return Err(TalusError::Cancelled);
        }

        let store = snapshot.store();
        let mut nodes = Vec::with_capacity(missing.len());
        for hash_bytes in &missing {
            let hash = talus_mst::Digest::from_bytes(hash_bytes);
            let node = store.get(&hash).unwrap_or_else(|| {
                // We just advertised this root; every reachable node must be
                // in our own snapshot store. Its absence is an invariant
                // violation, not a recoverable condition.
                panic!("node {hash:?} advertised but missing from our own store");
            });
            nodes.push(WireNode::from_node(&node));
        }

        missing = client
            .round_step(RoundStepRequest { round_uuid, nodes })
            .await
            .map_err(|e| TalusError::Transport(e.to_string()))?
            .hashes;
    }

    info!(peer = %peer.endpoint(), %round_uuid, "anti-entropy round complete");
    Ok(())
}
