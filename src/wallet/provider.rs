// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use alloy_primitives::Address;
use async_channel::{Receiver, Sender};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// EIP-1193 style wallet provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Performs a single JSON-RPC request against the wallet.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Returns a new receiver of `accountsChanged` / `chainChanged` notifications.
    ///
    /// Dropping the receiver unsubscribes.
    fn subscribe(&self) -> Receiver<ProviderEvent>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProviderError {
    /// There is no wallet to talk to.
    Unavailable,

    /// The request could not be delivered.
    Transport(String),

    /// The wallet answered with a JSON-RPC error.
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },
}

impl ProviderError {
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        ProviderError::Rpc {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Unavailable => write!(f, "wallet provider unavailable"),
            ProviderError::Transport(msg) => write!(f, "{msg}"),
            ProviderError::Rpc { code, message, .. } => write!(f, "{message} (code {code})"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Fan-out of provider notifications to every live subscriber.
#[derive(Default)]
pub struct EventHub {
    senders: Mutex<Vec<Sender<ProviderEvent>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<ProviderEvent> {
        let (tx, rx) = async_channel::unbounded();
        self.senders.lock().push(tx);
        rx
    }

    /// Delivers `event` to all subscribers, pruning the ones that went away.
    pub fn emit(&self, event: ProviderEvent) {
        self.senders
            .lock()
            .retain(|sender| sender.try_send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        let mut senders = self.senders.lock();
        senders.retain(|sender| !sender.is_closed());
        senders.len()
    }
}

/// Parses the account list returned by `eth_accounts` / `eth_requestAccounts`.
pub fn parse_accounts(value: &Value) -> Result<Vec<Address>, ProviderError> {
    let entries = value
        .as_array()
        .ok_or_else(|| ProviderError::Transport(format!("unexpected accounts payload: {value}")))?;

    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .and_then(|s| Address::from_str(s).ok())
                .ok_or_else(|| ProviderError::Transport(format!("invalid account: {entry}")))
        })
        .collect()
}
