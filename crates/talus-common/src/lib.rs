// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types shared between the RPC surface and the anti-entropy
//! machinery, so a failure can cross a service boundary without losing its
//! kind.

pub mod error;

pub use error::{Result, TalusError};
