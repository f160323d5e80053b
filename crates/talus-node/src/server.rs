// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! Process bootstrap wiring: stand up the JSON-RPC server, the metrics
//! endpoint, and the responder's reaper task, and tear them down together
//! on shutdown. The command shell and argument parsing around this belong
//! to the binary, not this crate.

use std::fmt::Debug;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use jsonrpsee::server::ServerBuilder;
use jsonrpsee::RpcModule;
use prometheus::Registry;
use talus_config::{PeerEntry, TalusOpt};
use talus_proto::TalusRpcServer;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::anti_entropy::{Originator, Responder};
use crate::peers::Peers;
use crate::service::RpcServiceImpl;
use crate::tree::SharedTree;

pub struct ServerHandle {
    shutdown_tx: broadcast::Sender<()>,
    rpc_handle: jsonrpsee::server::ServerHandle,
}

impl Debug for ServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandle").finish()
    }
}

impl ServerHandle {
    pub fn stop(self) -> anyhow::Result<()> {
        let _ = self.shutdown_tx.send(());
        self.rpc_handle.stop()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Service {
    handle: Option<ServerHandle>,
}

impl Service {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn start(&mut self, opt: TalusOpt) -> anyhow::Result<()> {
        self.handle = Some(start_server(opt).await?);
        Ok(())
    }

    pub fn stop(self) -> anyhow::Result<()> {
        if let Some(handle) = self.handle {
            handle.stop()?;
        }
        Ok(())
    }
}

pub async fn start_server(opt: TalusOpt) -> anyhow::Result<ServerHandle> {
    let registry = Registry::new();

    let tree = Arc::new(SharedTree::new(opt.tree_base()));
    let peers = Arc::new(Peers::default());
    if let Some(path) = &opt.peers_file {
        for PeerEntry { host, port } in talus_config::load_peers_file(path)? {
            peers.add(host, port);
        }
    }
    let originator = Arc::new(Originator::new());
    let responder = Arc::new(Responder::new(Arc::clone(&tree)));

    let (shutdown_tx, _) = broadcast::channel(16);

    spawn_reaper(Arc::clone(&responder), &opt, shutdown_tx.subscribe());
    spawn_metrics_server(registry, &opt, shutdown_tx.subscribe());

    let rpc_service = RpcServiceImpl::new(tree, peers, originator, responder);
    let mut module = RpcModule::new(());
    module.merge(rpc_service.into_rpc())?;

    let middleware =
        tower::ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive());

    let server =
        ServerBuilder::default().set_http_middleware(middleware).build(opt.bind_addr).await?;
    let local_addr = server.local_addr()?;
    let rpc_handle = server.start(module);

    info!(addr = %local_addr, "talus-node JSON-RPC server listening");

    Ok(ServerHandle { shutdown_tx, rpc_handle })
}

fn spawn_reaper(responder: Arc<Responder>, opt: &TalusOpt, mut shutdown: broadcast::Receiver<()>) {
    let interval = Duration::from_millis(opt.round_reap_interval_ms);
    let max_age = Duration::from_millis(opt.round_max_age_ms);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = tick.tick() => responder.reap_stale_rounds(max_age),
                _ = shutdown.recv() => break,
            }
        }
    });
}

fn spawn_metrics_server(registry: Registry, opt: &TalusOpt, mut shutdown: broadcast::Receiver<()>) {
    let mut metrics_addr = opt.bind_addr;
    metrics_addr.set_port(metrics_addr.port() + 1000);
    let metrics_addr: SocketAddr = metrics_addr;
    tokio::spawn(async move {
        tokio::select! {
            result = crate::metrics::serve(registry, metrics_addr) => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "metrics server exited");
                }
            }
            _ = shutdown.recv() => {}
        }
    });
}
