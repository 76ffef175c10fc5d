// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Arbitrum Sepolia
pub const ARBITRUM_SEPOLIA_CHAIN_ID: u64 = 421614;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Parameters of the network the client requires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainParams {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
    pub native_currency: NativeCurrency,
}

impl ChainParams {
    pub fn arbitrum_sepolia() -> Self {
        Self {
            chain_id: ARBITRUM_SEPOLIA_CHAIN_ID,
            chain_name: "Arbitrum Sepolia".to_owned(),
            rpc_urls: vec!["https://sepolia-rollup.arbitrum.io/rpc".to_owned()],
            block_explorer_urls: vec!["https://sepolia.arbiscan.io".to_owned()],
            native_currency: NativeCurrency {
                name: "ETH".to_owned(),
                symbol: "ETH".to_owned(),
                decimals: 18,
            },
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let chain = &settings.chain;

        Self {
            chain_id: chain.chain_id,
            chain_name: chain.chain_name.clone(),
            rpc_urls: chain.rpc_urls.clone(),
            block_explorer_urls: chain.block_explorer_urls.clone(),
            native_currency: NativeCurrency {
                name: chain.currency_name.clone(),
                symbol: chain.currency_symbol.clone(),
                decimals: chain.currency_decimals,
            },
        }
    }

    /// Chain id as the `0x` prefixed hex string wallets expect.
    pub fn hex_chain_id(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }

    /// Params for `wallet_switchEthereumChain`.
    pub fn switch_params(&self) -> Value {
        json!([{ "chainId": self.hex_chain_id() }])
    }

    /// Params for `wallet_addEthereumChain`.
    pub fn add_params(&self) -> Value {
        json!([{
            "chainId": self.hex_chain_id(),
            "chainName": self.chain_name,
            "nativeCurrency": self.native_currency,
            "rpcUrls": self.rpc_urls,
            "blockExplorerUrls": self.block_explorer_urls,
        }])
    }

    /// Short label shown next to the account.
    pub fn label(&self, chain_id: Option<u64>) -> String {
        match chain_id {
            Some(id) if id == self.chain_id => self.chain_name.clone(),
            Some(id) => format!("Chain ID: {id}"),
            None => "Unknown".to_owned(),
        }
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::arbitrum_sepolia()
    }
}

/// Parses a chain id the way wallets report it, which is a hex quantity.
pub fn parse_chain_id(value: &Value) -> Option<u64> {
    parse_quantity(value)
}

/// Parses a JSON-RPC quantity. Plain decimal strings and JSON numbers are
/// accepted too.
pub fn parse_quantity(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16).ok(),
                None => s.parse().ok(),
            }
        }
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}
