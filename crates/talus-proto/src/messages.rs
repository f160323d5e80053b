// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! Request/response shapes for the RPC surface's four calls.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::wire::WireNode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRequest {
    pub key: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetResponse {
    /// `0` when absent; absence is a sentinel value on this surface, not
    /// an RPC error.
    pub value: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutRequest {
    pub key: u32,
    pub value: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PutResponse {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundStartRequest {
    /// Empty for a null root.
    pub root_hash: Vec<u8>,
    pub round_uuid: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundStartResponse {
    pub hashes: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundStepRequest {
    pub round_uuid: Uuid,
    pub nodes: Vec<WireNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundStepResponse {
    pub hashes: Vec<Vec<u8>>,
}
