// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! In-memory wallet used by the tests.

use super::{EventHub, Provider, ProviderError, ProviderEvent};
use crate::chain::parse_chain_id;
use alloy_primitives::{address, Address, B256, U256};
use async_channel::Receiver;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

pub const ALICE: Address = address!("906e8e6FB02DC4F507227Fb8c75cA1B0e9D10e23");
pub const BOB: Address = address!("6BF6CfB0779cEf6b40ff88bB19060Ee8c84c8ADD");

pub const TX_HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";

type Handler = Box<dyn FnMut(&str, &Value) -> Option<Result<Value, ProviderError>> + Send>;

struct WalletState {
    account: Address,
    authorized: bool,
    chain_id: u64,
    known_chains: HashSet<u64>,
    prompts: usize,
    reject_prompts: bool,
}

pub struct MockProvider {
    state: Mutex<WalletState>,
    handler: Mutex<Option<Handler>>,
    requests: Mutex<Vec<(String, Value)>>,
    hub: EventHub,
}

impl MockProvider {
    fn with_state(account: Address, authorized: bool, chain_id: u64) -> Arc<Self> {
        let mut known_chains = HashSet::new();
        known_chains.insert(chain_id);

        Arc::new(Self {
            state: Mutex::new(WalletState {
                account,
                authorized,
                chain_id,
                known_chains,
                prompts: 0,
                reject_prompts: false,
            }),
            handler: Mutex::new(None),
            requests: Mutex::new(vec![]),
            hub: EventHub::new(),
        })
    }

    /// Wallet that already authorized `account` for this site.
    pub fn authorized(account: Address, chain_id: u64) -> Arc<Self> {
        Self::with_state(account, true, chain_id)
    }

    /// Wallet that will prompt before exposing `account`.
    pub fn locked(account: Address, chain_id: u64) -> Arc<Self> {
        Self::with_state(account, false, chain_id)
    }

    /// Installs a handler consulted before the built-in wallet behaviour.
    /// Returning `None` falls through to it.
    pub fn on_request(
        &self,
        handler: impl FnMut(&str, &Value) -> Option<Result<Value, ProviderError>> + Send + 'static,
    ) {
        *self.handler.lock() = Some(Box::new(handler));
    }

    pub fn reject_prompts(&self) {
        self.state.lock().reject_prompts = true;
    }

    pub fn emit(&self, event: ProviderEvent) {
        self.hub.emit(event);
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.requests.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.requests.lock().iter().filter(|(m, _)| m == method).count()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    pub fn prompts(&self) -> usize {
        self.state.lock().prompts
    }

    pub fn is_authorized(&self) -> bool {
        self.state.lock().authorized
    }

    pub fn chain_id(&self) -> u64 {
        self.state.lock().chain_id
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    fn wallet_request(&self, method: &str, params: &Value) -> Result<Value, ProviderError> {
        let mut state = self.state.lock();

        match method {
            "eth_accounts" => {
                if state.authorized {
                    Ok(json!([state.account.to_string()]))
                } else {
                    Ok(json!([]))
                }
            }
            "eth_chainId" => Ok(json!(format!("0x{:x}", state.chain_id))),
            "eth_requestAccounts" => {
                if !state.authorized {
                    if state.reject_prompts {
                        return Err(ProviderError::rpc(4001, "User rejected the request."));
                    }
                    state.prompts += 1;
                    state.authorized = true;
                }
                Ok(json!([state.account.to_string()]))
            }
            "wallet_switchEthereumChain" => {
                let chain_id = params[0]
                    .get("chainId")
                    .and_then(parse_chain_id)
                    .ok_or_else(|| ProviderError::rpc(-32602, "invalid chain id"))?;

                if !state.known_chains.contains(&chain_id) {
                    return Err(ProviderError::rpc(
                        4902,
                        format!("Unrecognized chain ID \"0x{chain_id:x}\"."),
                    ));
                }

                state.chain_id = chain_id;
                drop(state);
                self.hub.emit(ProviderEvent::ChainChanged(chain_id));
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                let chain_id = params[0]
                    .get("chainId")
                    .and_then(parse_chain_id)
                    .ok_or_else(|| ProviderError::rpc(-32602, "invalid chain id"))?;

                state.known_chains.insert(chain_id);
                state.chain_id = chain_id;
                drop(state);
                self.hub.emit(ProviderEvent::ChainChanged(chain_id));
                Ok(Value::Null)
            }
            other => Err(ProviderError::rpc(
                -32601,
                format!("the method {other} does not exist/is not available"),
            )),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.requests
            .lock()
            .push((method.to_owned(), params.clone()));

        if let Some(handler) = self.handler.lock().as_mut() {
            if let Some(result) = handler(method, &params) {
                return result;
            }
        }

        self.wallet_request(method, &params)
    }

    fn subscribe(&self) -> Receiver<ProviderEvent> {
        self.hub.subscribe()
    }
}

/// ABI word holding `value`.
pub fn word(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

/// ABI word holding `address`.
pub fn address_word(address: Address) -> [u8; 32] {
    B256::left_padding_from(address.as_slice()).0
}

/// `0x` prefixed hex of the concatenated words, as `eth_call` returns it.
pub fn encode_words(words: &[[u8; 32]]) -> Value {
    json!(format!("0x{}", hex::encode(words.concat())))
}

/// Selector of the call encoded in an `eth_call` / `eth_sendTransaction` request.
pub fn selector(params: &Value) -> Option<[u8; 4]> {
    let data = params[0].get("data")?.as_str()?;
    let bytes = hex::decode(data.trim_start_matches("0x")).ok()?;
    bytes.get(..4)?.try_into().ok()
}

/// Receipt of a successful transaction.
pub fn receipt_ok() -> Value {
    json!({
        "transactionHash": TX_HASH,
        "blockNumber": "0x10",
        "status": "0x1",
    })
}
