// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! Message shapes and call surface exchanged between two replicas during a
//! `Get`/`Put`/anti-entropy round. No framing, no transport: `jsonrpsee`
//! supplies both.

pub mod error;
pub mod messages;
pub mod rpc;
pub mod wire;

pub use error::ProtoError;
pub use messages::{
    GetRequest, GetResponse, PutRequest, PutResponse, RoundStartRequest, RoundStartResponse,
    RoundStepRequest, RoundStepResponse,
};
pub use rpc::{TalusRpcClient, TalusRpcServer};
pub use wire::{WireChild, WireNode};
