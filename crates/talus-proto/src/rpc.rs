// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! The JSON-RPC call surface itself. Framing (HTTP vs. WebSocket, codecs,
//! connection pooling) is out of scope — `jsonrpsee` owns that; this
//! trait only fixes the method names and message shapes.

use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::messages::{
    GetRequest, GetResponse, PutRequest, PutResponse, RoundStartRequest, RoundStartResponse,
    RoundStepRequest, RoundStepResponse,
};

#[rpc(server, client, namespace = "talus")]
pub trait TalusRpc {
    /// Local read.
    #[method(name = "get")]
    async fn get(&self, req: GetRequest) -> RpcResult<GetResponse>;

    /// Local write; may trigger anti-entropy rounds against selected peers.
    #[method(name = "put")]
    async fn put(&self, req: PutRequest) -> RpcResult<PutResponse>;

    /// Opens a responder round for the originator's announced root.
    #[method(name = "roundStart")]
    async fn round_start(&self, req: RoundStartRequest) -> RpcResult<RoundStartResponse>;

    /// Feeds nodes into an open round; returns the next missing-hash set.
    #[method(name = "roundStep")]
    async fn round_step(&self, req: RoundStepRequest) -> RpcResult<RoundStepResponse>;
}
