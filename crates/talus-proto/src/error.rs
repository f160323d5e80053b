// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtoError {
    #[error("malformed digest on the wire: expected {} bytes, got {len}", talus_mst::Digest::LEN)]
    MalformedDigest { len: usize },

    #[error("malformed key or value on the wire")]
    MalformedKeyOrValue,

    #[error("unknown round uuid")]
    UnknownRound,

    #[error("node hash mismatch")]
    HashMismatch,
}

impl From<ProtoError> for jsonrpsee::types::ErrorObjectOwned {
    fn from(err: ProtoError) -> Self {
        jsonrpsee::types::ErrorObjectOwned::owned(
            jsonrpsee::types::error::ErrorCode::InvalidParams.code(),
            err.to_string(),
            None::<()>,
        )
    }
}
