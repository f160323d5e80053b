// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! Merkle search tree core: content-addressed node layout, a persistent
//! node store, and `put`/`get`/`merge` over the two.
//!
//! This crate has no notion of peers, RPC, or network rounds — it is the
//! pure data structure that `talus-node`'s anti-entropy protocol drives.

pub mod base;
pub mod error;
pub mod hash;
pub mod kv;
pub mod node;
pub mod serdes;
pub mod store;
pub mod tree;

pub use base::Base;
pub use error::{MstError, Result};
pub use hash::{Digest, Hasher, Sha256Hasher};
pub use kv::{Key, Readable, Value, Writable, U32};
pub use node::{Child, Node};
pub use store::{find_missing_nodes, NodeStore, PersistentNodeStore};
pub use tree::MerkleSearchTree;
