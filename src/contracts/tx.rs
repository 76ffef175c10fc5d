// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::chain::parse_quantity;
use crate::error::ClientError;
use crate::wallet::Provider;
use alloy_primitives::{Address, B256};
use alloy_sol_types::SolCall;
use log::*;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Performs a read-only call and decodes its return value.
pub async fn call<C: SolCall>(
    provider: &dyn Provider,
    to: Address,
    call: &C,
) -> Result<C::Return, ClientError> {
    let data = format!("0x{}", hex::encode(call.abi_encode()));
    let raw = provider
        .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
        .await?;
    let bytes = decode_hex(&raw)?;

    C::abi_decode_returns(&bytes, true)
        .map_err(|err| ClientError::Decode(format!("{} returned {}: {}", C::SIGNATURE, raw, err)))
}

fn decode_hex(value: &Value) -> Result<Vec<u8>, ClientError> {
    let s = value
        .as_str()
        .ok_or_else(|| ClientError::Decode(format!("expected hex string, got {value}")))?;
    hex::decode(s.trim_start_matches("0x")).map_err(|err| ClientError::Decode(err.to_string()))
}

/// Account able to sign and submit transactions through the wallet.
#[derive(Clone)]
pub struct Signer {
    provider: Arc<dyn Provider>,
    address: Address,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.address)
            .finish()
    }
}

impl Signer {
    pub fn new(provider: Arc<dyn Provider>, address: Address) -> Self {
        Self { provider, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Hands `call` to the wallet for signing and broadcast.
    pub async fn send<C: SolCall>(
        &self,
        to: Address,
        call: &C,
    ) -> Result<PendingTransaction, ClientError> {
        let request = json!({
            "from": self.address,
            "to": to,
            "data": format!("0x{}", hex::encode(call.abi_encode())),
        });

        let raw = self
            .provider
            .request("eth_sendTransaction", json!([request.clone()]))
            .await?;
        let hash = raw
            .as_str()
            .and_then(|s| B256::from_str(s).ok())
            .ok_or_else(|| ClientError::Decode(format!("transaction hash {raw}")))?;

        debug!("Submitted {} as {}", C::SIGNATURE, hash);

        Ok(PendingTransaction {
            hash,
            request,
            provider: self.provider.clone(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub hash: B256,
    pub block_number: u64,
}

/// Transaction accepted by the wallet but not yet confirmed.
pub struct PendingTransaction {
    hash: B256,
    request: Value,
    provider: Arc<dyn Provider>,
}

impl fmt::Debug for PendingTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTransaction")
            .field("hash", &self.hash)
            .finish()
    }
}

impl PendingTransaction {
    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Waits for one confirmation. A reverted transaction is replayed as a call
    /// at its block to recover the revert reason.
    pub async fn wait(&self, poll: Duration) -> Result<Receipt, ClientError> {
        loop {
            let raw = self
                .provider
                .request("eth_getTransactionReceipt", json!([self.hash]))
                .await?;

            if raw.is_null() {
                sleep(poll).await;
                continue;
            }

            let block_number = raw
                .get("blockNumber")
                .and_then(parse_quantity)
                .ok_or_else(|| ClientError::Decode(format!("receipt {raw}")))?;
            let success = raw.get("status").and_then(Value::as_str) != Some("0x0");

            if success {
                return Ok(Receipt {
                    hash: self.hash,
                    block_number,
                });
            }

            warn!("Transaction {} reverted in block {}", self.hash, block_number);
            return Err(self.revert_reason(block_number).await);
        }
    }

    async fn revert_reason(&self, block_number: u64) -> ClientError {
        let replay = self
            .provider
            .request(
                "eth_call",
                json!([self.request, format!("0x{block_number:x}")]),
            )
            .await;

        match replay {
            Err(err) => match ClientError::from(err) {
                reverted @ ClientError::Reverted(_) => reverted,
                other => {
                    debug!("Could not replay reverted transaction: {}", other);
                    ClientError::Reverted("transaction reverted".to_owned())
                }
            },
            Ok(_) => ClientError::Reverted("transaction reverted".to_owned()),
        }
    }
}
