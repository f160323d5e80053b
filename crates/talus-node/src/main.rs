// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use talus_config::TalusOpt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        tracing::error!("panic occurred:\n{panic_info}\nexiting");
        std::process::exit(1);
    }));

    let opt = TalusOpt::parse();
    let handle = talus_node::start_server(opt).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    handle.stop()?;
    Ok(())
}
