// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! Process configuration. Out of scope per the design this crate serves
//! the command shell and argument parsing framework around it.
//! In scope: the handful of knobs the core actually needs — tree base,
//! bind address, and the static peer list — wired up the way the rest of
//! this workspace wires up `clap`-derived options.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use talus_mst::Base;

pub static DEFAULT_BIND_ADDR: Lazy<SocketAddr> =
    Lazy::new(|| "127.0.0.1:7878".parse().expect("valid default bind address"));

/// `clap` needs its own `ValueEnum`; this mirrors `talus_mst::Base` one for
/// one rather than making the tree crate depend on `clap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BaseArg {
    #[value(name = "2")]
    Base2,
    #[value(name = "4")]
    Base4,
    #[value(name = "8")]
    Base8,
    #[value(name = "16")]
    Base16,
    #[value(name = "32")]
    Base32,
}

impl From<BaseArg> for Base {
    fn from(value: BaseArg) -> Self {
        match value {
            BaseArg::Base2 => Base::Base2,
            BaseArg::Base4 => Base::Base4,
            BaseArg::Base8 => Base::Base8,
            BaseArg::Base16 => Base::Base16,
            BaseArg::Base32 => Base::Base32,
        }
    }
}

/// Top-level process options. Everything here has a default, so
/// `TalusOpt::parse()` works with zero flags in the common case.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
pub struct TalusOpt {
    /// Address the JSON-RPC server listens on.
    #[clap(long, default_value_t = *DEFAULT_BIND_ADDR)]
    pub bind_addr: SocketAddr,

    /// Fanout base `R` for the level function.
    #[clap(long, value_enum, default_value = "16")]
    pub base: BaseArg,

    /// Path to a TOML file listing static peers. When unset, the replica
    /// starts with an empty peer list and anti-entropy never fires.
    #[clap(long)]
    pub peers_file: Option<PathBuf>,

    /// How often, in milliseconds, to sweep `dest_rounds` for anti-entropy
    /// rounds abandoned by an originator that never sent a final step.
    #[clap(long, default_value_t = 30_000)]
    pub round_reap_interval_ms: u64,

    /// A round older than this, in milliseconds, is considered abandoned
    /// by the reaper sweep.
    #[clap(long, default_value_t = 120_000)]
    pub round_max_age_ms: u64,
}

impl Default for TalusOpt {
    fn default() -> Self {
        Self {
            bind_addr: *DEFAULT_BIND_ADDR,
            base: BaseArg::Base16,
            peers_file: None,
            round_reap_interval_ms: 30_000,
            round_max_age_ms: 120_000,
        }
    }
}

impl TalusOpt {
    pub fn tree_base(&self) -> Base {
        self.base.into()
    }
}

/// One entry in a `peers_file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerEntry {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PeersFile {
    #[serde(default)]
    peer: Vec<PeerEntry>,
}

/// Loads the static peer list from a TOML file shaped like:
///
/// ```toml
/// [[peer]]
/// host = "10.0.0.2"
/// port = 7878
/// ```
pub fn load_peers_file(path: &Path) -> anyhow::Result<Vec<PeerEntry>> {
    let content = std::fs::read_to_string(path)?;
    let parsed: PeersFile = toml::from_str(&content)?;
    Ok(parsed.peer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_opt_has_sane_bind_addr_and_base16() {
        let opt = TalusOpt::default();
        assert_eq!(opt.bind_addr, *DEFAULT_BIND_ADDR);
        assert_eq!(opt.tree_base(), Base::Base16);
    }

    #[test]
    fn parses_peers_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("talus-peers-test-{}.toml", std::process::id()));
        std::fs::write(&path, "[[peer]]\nhost = \"10.0.0.2\"\nport = 7878\n").unwrap();
        let peers = load_peers_file(&path).unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].host, "10.0.0.2");
        assert_eq!(peers[0].port, 7878);
        std::fs::remove_file(&path).unwrap();
    }
}
