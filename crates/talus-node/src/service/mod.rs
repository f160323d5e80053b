// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

pub mod rpc_service;

pub use rpc_service::RpcServiceImpl;
