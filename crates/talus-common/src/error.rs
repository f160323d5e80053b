// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// The error kinds that can cross more than one of `talus-mst`,
/// `talus-proto`, and `talus-node`'s own boundaries: a tree-configuration
/// mismatch surfacing out of a merge, a failed anti-entropy round's
/// transport, or a round the originator cancelled mid-flight.
#[derive(Debug, Error)]
pub enum TalusError {
    #[error("tree configuration mismatch: {0}")]
    ConfigMismatch(#[from] talus_mst::MstError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("round cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, TalusError>;
