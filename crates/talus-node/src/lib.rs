// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! The replica process: a local tree, a static peer list, anti-entropy
//! rounds in both directions, and the JSON-RPC surface tying them
//! together. Everything in `talus-mst` is pure; this crate is where it
//! meets tasks, locks, and the network.

pub mod anti_entropy;
pub mod metrics;
pub mod peers;
pub mod server;
pub mod service;
pub mod tree;

pub use peers::{Peer, Peers};
pub use server::{start_server, Service, ServerHandle};
pub use tree::{ReplicaStore, ReplicaTree, SharedTree};
