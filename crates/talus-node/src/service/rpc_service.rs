// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! The JSON-RPC surface a replica exposes: local reads/writes, plus the
//! two anti-entropy calls a peer's originator drives against us.

use std::sync::Arc;

use async_trait::async_trait;
use jsonrpsee::core::RpcResult;
use jsonrpsee::types::error::ErrorCode;
use jsonrpsee::types::ErrorObjectOwned;
use talus_mst::U32;
use talus_proto::{
    GetRequest, GetResponse, PutRequest, PutResponse, RoundStartRequest, RoundStartResponse,
    RoundStepRequest, RoundStepResponse, TalusRpcServer,
};
use tracing::info;

use crate::anti_entropy::{Originator, Responder};
use crate::peers::Peers;
use crate::tree::SharedTree;

fn digest_from_root_hash(bytes: &[u8]) -> RpcResult<Option<talus_mst::Digest>> {
    if bytes.is_empty() {
        return Ok(None);
    }
    if bytes.len() != talus_mst::Digest::LEN {
        return Err(ErrorObjectOwned::owned(
            ErrorCode::InvalidParams.code(),
            "malformed root hash",
            None::<()>,
        ));
    }
    Ok(Some(talus_mst::Digest::from_bytes(bytes)))
}

pub struct RpcServiceImpl {
    tree: Arc<SharedTree>,
    peers: Arc<Peers>,
    originator: Arc<Originator>,
    responder: Arc<Responder>,
}

impl RpcServiceImpl {
    pub fn new(tree: Arc<SharedTree>, peers: Arc<Peers>, originator: Arc<Originator>, responder: Arc<Responder>) -> Self {
        Self { tree, peers, originator, responder }
    }

    /// Registers a background round for every peer without one already
    /// running (after a successful `Put`, kick off anti-entropy).
    fn kick_off_anti_entropy(&self) {
        let snapshot = self.tree.snapshot();
        for peer in self.peers.select() {
            self.originator.start_round(peer, snapshot.clone());
        }
    }
}

#[async_trait]
impl TalusRpcServer for RpcServiceImpl {
    async fn get(&self, req: GetRequest) -> RpcResult<GetResponse> {
        let value = self.tree.get(U32(req.key)).map(|v| v.0).unwrap_or(0);
        Ok(GetResponse { value })
    }

    async fn put(&self, req: PutRequest) -> RpcResult<PutResponse> {
        self.tree.put(U32(req.key), U32(req.value));
        info!(key = req.key, value = req.value, "put");
        self.kick_off_anti_entropy();
        Ok(PutResponse {})
    }

    async fn round_start(&self, req: RoundStartRequest) -> RpcResult<RoundStartResponse> {
        let root = digest_from_root_hash(&req.root_hash)?;
        let hashes = self.responder.round_start(root, req.round_uuid);
        Ok(RoundStartResponse { hashes: hashes.into_iter().map(|h| h.to_vec()).collect() })
    }

    async fn round_step(&self, req: RoundStepRequest) -> RpcResult<RoundStepResponse> {
        let hashes = self
            .responder
            .round_step(req.round_uuid, req.nodes)
            .map_err(ErrorObjectOwned::from)?;
        Ok(RoundStepResponse { hashes: hashes.into_iter().map(|h| h.to_vec()).collect() })
    }
}
