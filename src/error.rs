// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::wallet::ProviderError;
use alloy_sol_types::{Panic, Revert, SolError};
use serde_json::Value;
use std::fmt;

/// Message wallets put in errors when the extension reloaded under us.
pub const CONTEXT_INVALIDATED: &str = "Extension context invalidated";

/// EIP-1193 user rejected request.
pub const USER_REJECTED_CODE: i64 = 4001;

/// EIP-3326 unrecognized chain id.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientError {
    /// No wallet provider is available.
    WalletNotFound,

    /// The wallet has no authorized account.
    NotConnected,

    /// The user declined the request in the wallet.
    UserRejected(String),

    /// The signing context went away mid-flow. The only error we retry.
    ContextInvalidated(String),

    /// The wallet does not know the requested chain.
    UnrecognizedChain(String),

    /// Contract execution reverted with the given reason.
    Reverted(String),

    /// The request never reached the wallet or the network.
    Network(String),

    /// Any other JSON-RPC error returned by the wallet.
    Rpc { code: i64, message: String },

    /// Input rejected before anything was sent.
    Validation(String),

    /// A response could not be decoded.
    Decode(String),
}

impl ClientError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::ContextInvalidated(_))
    }

    /// Revert reason if this is a contract revert.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            ClientError::Reverted(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::WalletNotFound => {
                write!(f, "Please install MetaMask or a compatible wallet")
            }
            ClientError::NotConnected => write!(f, "Wallet not connected"),
            ClientError::UserRejected(msg)
            | ClientError::ContextInvalidated(msg)
            | ClientError::UnrecognizedChain(msg)
            | ClientError::Reverted(msg)
            | ClientError::Network(msg)
            | ClientError::Validation(msg) => write!(f, "{msg}"),
            ClientError::Rpc { message, .. } => write!(f, "{message}"),
            ClientError::Decode(msg) => write!(f, "could not decode response: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable => ClientError::WalletNotFound,
            ProviderError::Transport(msg) => {
                if msg.contains(CONTEXT_INVALIDATED) {
                    ClientError::ContextInvalidated(msg)
                } else {
                    ClientError::Network(msg)
                }
            }
            ProviderError::Rpc {
                code,
                message,
                data,
            } => {
                if message.contains(CONTEXT_INVALIDATED) {
                    return ClientError::ContextInvalidated(message);
                }

                match code {
                    USER_REJECTED_CODE => ClientError::UserRejected(message),
                    UNRECOGNIZED_CHAIN_CODE => ClientError::UnrecognizedChain(message),
                    _ => {
                        if let Some(reason) = data.as_ref().and_then(revert_reason_from_data) {
                            return ClientError::Reverted(reason);
                        }

                        if let Some(reason) = message.strip_prefix("execution reverted: ") {
                            return ClientError::Reverted(reason.to_owned());
                        }

                        ClientError::Rpc { code, message }
                    }
                }
            }
        }
    }
}

/// Extracts a revert reason from the `data` member of a JSON-RPC error.
///
/// Wallets disagree on the shape: some put the raw return data there as a hex
/// string, others nest it one level deeper under `data`.
pub fn revert_reason_from_data(data: &Value) -> Option<String> {
    match data {
        Value::String(s) => {
            let bytes = hex::decode(s.trim_start_matches("0x")).ok()?;
            decode_revert(&bytes)
        }
        Value::Object(map) => map.get("data").and_then(revert_reason_from_data),
        _ => None,
    }
}

/// Decodes `Error(string)` / `Panic(uint256)` return data.
pub fn decode_revert(bytes: &[u8]) -> Option<String> {
    if bytes.len() < 4 {
        return None;
    }

    if let Ok(revert) = Revert::abi_decode(bytes, true) {
        return Some(revert.reason);
    }

    if let Ok(panic) = Panic::abi_decode(bytes, true) {
        return Some(format!("panic: 0x{:x}", panic.code));
    }

    None
}
