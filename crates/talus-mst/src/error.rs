// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors surfaced by the tree's public operations.
///
/// Anything reachable only through a malformed tree (a missing node we
/// ourselves advertised, a split on a key that already has a child) is an
/// invariant violation: the tree construction guarantees it cannot happen
/// for honestly-built trees, so those sites panic instead of returning a
/// variant here — a condition callers should never need to handle is not
/// a `Result`.
#[derive(Debug, Error)]
pub enum MstError {
    #[error("mismatched tree base: {ours:?} vs {theirs:?}")]
    BaseMismatch { ours: crate::base::Base, theirs: crate::base::Base },

    #[error("merge produced a node with zero children, the tree is misformed")]
    EmptyMergeResult,
}

pub type Result<T> = std::result::Result<T, MstError>;
