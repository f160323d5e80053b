// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! The static peer registry: a read/write-locked list plus a
//! pluggable selection strategy for choosing who to gossip with in a round.

use parking_lot::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Peer {
    pub host: String,
    pub port: u16,
}

impl Peer {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Chooses which peers to contact for a round. The reference strategy
/// (`AllPeers`) simply returns the full set; a deployment with a large
/// cluster could swap in sampling without touching the originator.
pub trait SelectionStrategy: Send + Sync {
    fn select(&self, peers: &[Peer]) -> Vec<Peer>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllPeers;

impl SelectionStrategy for AllPeers {
    fn select(&self, peers: &[Peer]) -> Vec<Peer> {
        peers.to_vec()
    }
}

pub struct Peers {
    inner: RwLock<Vec<Peer>>,
    strategy: Box<dyn SelectionStrategy>,
}

impl Peers {
    pub fn new(strategy: impl SelectionStrategy + 'static) -> Self {
        Self { inner: RwLock::new(Vec::new()), strategy: Box::new(strategy) }
    }

    /// Idempotent: adding an already-known `(host, port)` is a no-op.
    pub fn add(&self, host: impl Into<String>, port: u16) {
        let peer = Peer::new(host, port);
        let mut guard = self.inner.write();
        if !guard.contains(&peer) {
            guard.push(peer);
        }
    }

    pub fn select(&self) -> Vec<Peer> {
        let guard = self.inner.read();
        self.strategy.select(&guard)
    }

    pub fn all(&self) -> Vec<Peer> {
        self.inner.read().clone()
    }
}

impl Default for Peers {
    fn default() -> Self {
        Self::new(AllPeers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent() {
        let peers = Peers::default();
        peers.add("10.0.0.1", 7878);
        peers.add("10.0.0.1", 7878);
        assert_eq!(peers.all().len(), 1);
    }

    #[test]
    fn all_peers_strategy_selects_everything() {
        let peers = Peers::default();
        peers.add("a", 1);
        peers.add("b", 2);
        assert_eq!(peers.select().len(), 2);
    }
}
