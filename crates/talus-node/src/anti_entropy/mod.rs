// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! The two-party anti-entropy round: one side originates, the other
//! responds, and they converge by exchanging only the subtrees one side
//! is missing.

pub mod originator;
pub mod responder;

pub use originator::Originator;
pub use responder::Responder;
