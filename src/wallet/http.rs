// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Wallet provider speaking EIP-1193 over JSON-RPC/HTTP to a local wallet bridge.

use super::{parse_accounts, EventHub, Provider, ProviderError, ProviderEvent};
use crate::chain::parse_chain_id;
use alloy_primitives::Address;
use async_channel::Receiver;
use async_trait::async_trait;
use hyper::body::HttpBody;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request, Uri};
use log::*;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Largest response body we accept from the wallet.
const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Accounts and chain as last seen by the watcher.
#[derive(Clone, Debug, PartialEq, Eq)]
struct WalletState {
    accounts: Vec<Address>,
    chain_id: Option<u64>,
}

impl WalletState {
    /// Notifications that take a subscriber from `self` to `next`.
    fn changes(&self, next: &WalletState) -> Vec<ProviderEvent> {
        let mut events = vec![];

        if self.accounts != next.accounts {
            events.push(ProviderEvent::AccountsChanged(next.accounts.clone()));
        }

        if let Some(chain_id) = next.chain_id {
            if self.chain_id != Some(chain_id) {
                events.push(ProviderEvent::ChainChanged(chain_id));
            }
        }

        events
    }
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

pub struct HttpProvider {
    client: Client<HttpConnector>,
    endpoint: Uri,
    next_id: AtomicU64,
    hub: EventHub,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl HttpProvider {
    pub fn new(endpoint: &str) -> Result<Arc<Self>, ProviderError> {
        let endpoint: Uri = endpoint
            .parse()
            .map_err(|err| ProviderError::Transport(format!("invalid wallet endpoint: {err}")))?;

        Ok(Arc::new(Self {
            client: Client::new(),
            endpoint,
            next_id: AtomicU64::new(1),
            hub: EventHub::new(),
            watcher: Mutex::new(None),
        }))
    }

    /// Probes the endpoint. `None` means there is no wallet to talk to.
    pub async fn detect(endpoint: &str, poll: Duration) -> Option<Arc<Self>> {
        let provider = match Self::new(endpoint) {
            Ok(provider) => provider,
            Err(err) => {
                error!("{}", err);
                return None;
            }
        };

        match provider.request("eth_chainId", json!([])).await {
            Ok(_) | Err(ProviderError::Rpc { .. }) => {
                info!("Found wallet at {}", endpoint);
                provider.watch(poll).await;
                Some(provider)
            }
            Err(err) => {
                warn!("No wallet reachable at {}: {}", endpoint, err);
                None
            }
        }
    }

    /// Starts emitting `accountsChanged` / `chainChanged` by polling the wallet.
    /// Changes are measured against the state read here, before the first tick.
    pub async fn watch(self: &Arc<Self>, poll: Duration) {
        let baseline = match self.read_state().await {
            Ok(state) => Some(state),
            Err(err) => {
                debug!("Initial wallet state read failed: {}", err);
                None
            }
        };

        let task = tokio::spawn(watch_loop(Arc::downgrade(self), baseline, poll));

        if let Some(previous) = self.watcher.lock().replace(task) {
            previous.abort();
        }
    }

    async fn read_state(&self) -> Result<WalletState, ProviderError> {
        let accounts = parse_accounts(&self.request("eth_accounts", json!([])).await?)?;
        let chain_id = parse_chain_id(&self.request("eth_chainId", json!([])).await?);
        Ok(WalletState { accounts, chain_id })
    }
}

async fn watch_loop(
    provider: Weak<HttpProvider>,
    mut last: Option<WalletState>,
    poll: Duration,
) {
    loop {
        sleep(poll).await;

        let provider = match provider.upgrade() {
            Some(provider) => provider,
            None => break,
        };

        // Polled with or without subscribers so the baseline never goes stale
        let state = match provider.read_state().await {
            Ok(state) => state,
            Err(err) => {
                debug!("Wallet state poll failed: {}", err);
                continue;
            }
        };

        if let Some(last) = last.as_ref() {
            for event in last.changes(&state) {
                provider.hub.emit(event);
            }
        }

        last = Some(state);
    }
}

/// Reads at most [`MAX_RESPONSE_BYTES`] of `body`.
async fn read_body(mut body: Body, method: &str) -> Result<Vec<u8>, ProviderError> {
    let too_large = |len: u64| {
        ProviderError::Transport(format!("response to {method} too large: {len} bytes"))
    };

    let declared = body.size_hint().lower();
    if declared > MAX_RESPONSE_BYTES as u64 {
        return Err(too_large(declared));
    }

    let mut bytes = Vec::with_capacity(declared as usize);
    while let Some(chunk) = body.data().await {
        let chunk =
            chunk.map_err(|err| ProviderError::Transport(format!("Failed to fetch: {err}")))?;
        if bytes.len() + chunk.len() > MAX_RESPONSE_BYTES {
            return Err(too_large((bytes.len() + chunk.len()) as u64));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

impl Drop for HttpProvider {
    fn drop(&mut self) {
        if let Some(task) = self.watcher.lock().take() {
            task.abort();
        }
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .map_err(|err| ProviderError::Transport(err.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|err| ProviderError::Transport(format!("Failed to fetch: {err}")))?;

        let status = response.status();
        let body = read_body(response.into_body(), method).await?;

        let response: RpcResponse = serde_json::from_slice(&body).map_err(|err| {
            ProviderError::Transport(format!("invalid response ({status}) to {method}: {err}"))
        })?;

        if let Some(error) = response.error {
            return Err(ProviderError::Rpc {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    fn subscribe(&self) -> Receiver<ProviderEvent> {
        self.hub.subscribe()
    }
}
