// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! The wire representation of a [`Node`](talus_mst::Node). Empty
//! bytes are the null sentinel: a node with no `low` pointer serializes
//! `low` as `vec![]`, not as a zero-filled digest.

use serde::{Deserialize, Serialize};
use talus_mst::{Child, Digest, Node, Readable, Value, Writable};

use crate::error::ProtoError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireChild {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    /// Empty when null.
    pub high: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireNode {
    pub level: u32,
    /// Empty when null.
    pub low: Vec<u8>,
    pub children: Vec<WireChild>,
}

fn digest_to_wire(d: Option<Digest>) -> Vec<u8> {
    d.map(|d| d.to_vec()).unwrap_or_default()
}

fn digest_from_wire(bytes: &[u8]) -> Result<Option<Digest>, ProtoError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    if bytes.len() != Digest::LEN {
        return Err(ProtoError::MalformedDigest { len: bytes.len() });
    }
    Ok(Some(Digest::from_bytes(bytes)))
}

impl WireNode {
    pub fn from_node<K: Writable, V: Writable>(node: &Node<K, V>) -> Self {
        Self {
            level: node.level,
            low: digest_to_wire(node.low),
            children: node
                .children
                .iter()
                .map(|c| WireChild {
                    key: c.key.to_bytes(),
                    value: c.value.to_bytes(),
                    high: digest_to_wire(c.high),
                })
                .collect(),
        }
    }

    pub fn into_node<K: Readable, V: Readable + Value>(self) -> Result<Node<K, V>, ProtoError> {
        let low = digest_from_wire(&self.low)?;
        let mut children = Vec::with_capacity(self.children.len());
        for c in self.children {
            children.push(Child {
                key: K::read(&c.key).map_err(|_| ProtoError::MalformedKeyOrValue)?,
                value: V::read(&c.value).map_err(|_| ProtoError::MalformedKeyOrValue)?,
                high: digest_from_wire(&c.high)?,
            });
        }
        Ok(Node::new(self.level, low, children))
    }
}
