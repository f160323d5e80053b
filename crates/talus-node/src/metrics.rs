// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! A minimal Prometheus scrape endpoint, the way the rest of this
//! workspace's services expose one.

use std::net::SocketAddr;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, Registry, TextEncoder};

pub async fn serve(registry: Registry, addr: SocketAddr) -> std::io::Result<()> {
    let app = Router::new().route("/metrics", get(metrics_handler)).with_state(registry);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "metrics server listening");
    axum::serve(listener, app).await
}

async fn metrics_handler(State(registry): State<Registry>) -> String {
    let metric_families = registry.gather();
    let mut buf = Vec::new();
    TextEncoder::new()
        .encode(&metric_families, &mut buf)
        .expect("prometheus text encoding cannot fail");
    String::from_utf8(buf).expect("prometheus text encoding is valid utf-8")
}
