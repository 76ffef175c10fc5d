// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use alloy_primitives::Address;
use config::{Config, ConfigError, File};
use lazy_static::*;
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, metadata, File as FsFile};
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use struct_field_names_as_array::FieldNamesAsArray;

const ENV_PREFIX: &str = "criticalmoney";

lazy_static! {
    pub static ref SETTINGS: Settings = match Settings::new() {
        Ok(settings) => settings,
        Err(err) => {
            error!("Failed to load configuration, using defaults! Reason: {}", err);
            Settings::default()
        }
    };
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, FieldNamesAsArray)]
pub struct Settings {
    /// Required network.
    pub chain: Chain,

    /// Deployed contracts.
    pub contracts: Contracts,

    /// Client behaviour.
    pub client: Client,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let default_settings = Settings::default();

        if let Some(config_path) = config_path.as_ref() {
            // Create default configuration
            if metadata(config_path).is_err() {
                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent).unwrap_or(());
                }

                let settings_str = toml::ser::to_string_pretty(&default_settings)
                    .map_err(|err| ConfigError::Message(err.to_string()))?;

                match FsFile::create(config_path) {
                    Ok(mut file) => {
                        file.write_all(settings_str.as_bytes()).unwrap_or(());
                    }
                    Err(err) => {
                        // If this fails, do nothing and fall back to environment variables
                        error!("Failed to create configuration! Reason: {:#?}", err);
                    }
                }
            }
        }

        let env_source: Vec<_> = std::env::vars().collect();
        Self::build(config_path, &default_settings, env_source)
    }

    fn config_path() -> Option<PathBuf> {
        let mut config_path = dirs::config_dir()?;
        config_path.push("CriticalMoney");
        config_path.push("config.toml");
        Some(config_path)
    }

    fn build(
        config_path: Option<PathBuf>,
        default_settings: &Settings,
        env_source: Vec<(String, String)>,
    ) -> Result<Self, ConfigError> {
        let mut s = Config::builder();

        if let Some(path) = config_path.and_then(|p| p.into_os_string().into_string().ok()) {
            s = s.add_source(File::with_name(&path).required(false));
        }

        // Set defaults
        let defaults: HashMap<String, HashMap<String, DynamicConfVal>> = serde_yaml::from_value(
            serde_yaml::to_value(default_settings)
                .map_err(|err| ConfigError::Message(err.to_string()))?,
        )
        .map_err(|err| ConfigError::Message(err.to_string()))?;

        for (k1, inner) in &defaults {
            for (k2, v) in inner {
                match v {
                    DynamicConfVal::String(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), v.as_str())?;
                    }

                    DynamicConfVal::Bool(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), v.to_string())?;
                    }

                    DynamicConfVal::U64(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), v.to_string())?;
                    }

                    DynamicConfVal::Sequence(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), v.clone())?;
                    }
                }
            }
        }

        // Make sure to list these in order
        let settings_modules: Vec<_> = vec![
            Chain::FIELD_NAMES_AS_ARRAY,
            Contracts::FIELD_NAMES_AS_ARRAY,
            Client::FIELD_NAMES_AS_ARRAY,
        ];

        // Gather all possible settings keys
        let possible_keys: HashMap<String, &str> = Settings::FIELD_NAMES_AS_ARRAY
            .iter()
            .enumerate()
            .flat_map(|(i, field)| {
                settings_modules[i].iter().map(move |nested| {
                    (
                        format!(
                            "{}_{}_{}",
                            ENV_PREFIX,
                            field,
                            nested.split('_').collect::<Vec<_>>().join("")
                        ),
                        *nested,
                    )
                })
            })
            .collect();

        // Parse env vars manually and set overrides if they exist as the
        // config package `Environment` module seems to behave poorly.
        for (k, v) in env_source.iter() {
            let k = k.to_lowercase();

            if let Some(k_postfix) = possible_keys.get(&k) {
                let mut k: Vec<_> = k.split('_').filter(|x| x != &ENV_PREFIX).collect();
                if let Some(last) = k.last_mut() {
                    *last = k_postfix;
                }
                let k = k.join(".");

                // Filter empty values
                if v.as_str() == "" {
                    continue;
                }

                s = s.set_override(k, v.as_str())?;
            }
        }

        s.build()?.try_deserialize()
    }

    /// Checks values that would otherwise only fail deep inside a user action.
    pub fn validate(&self) -> Result<(), String> {
        if self.chain.chain_id == 0 {
            return Err("chain.chain_id must not be 0".to_owned());
        }

        if self.chain.rpc_urls.is_empty() {
            return Err("chain.rpc_urls must not be empty".to_owned());
        }

        for (name, addr) in [
            ("contracts.token", &self.contracts.token),
            ("contracts.lending_pool", &self.contracts.lending_pool),
            ("contracts.pledge_platform", &self.contracts.pledge_platform),
        ] {
            Address::from_str(addr).map_err(|err| format!("{name} is invalid: {err}"))?;
        }

        if self.client.max_attempts == 0 {
            return Err("client.max_attempts must be at least 1".to_owned());
        }

        if self.client.balance_poll_ms == 0 || self.client.receipt_poll_ms == 0 {
            return Err("client poll intervals must not be 0".to_owned());
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Chain {
    /// Chain id the client requires.
    #[serde(alias = "chainid")]
    pub chain_id: u64,

    /// Human readable network name.
    #[serde(alias = "chainname")]
    pub chain_name: String,

    /// RPC urls handed to the wallet when adding the network.
    #[serde(alias = "rpcurls")]
    pub rpc_urls: Vec<String>,

    /// Block explorer urls handed to the wallet when adding the network.
    #[serde(alias = "blockexplorerurls")]
    pub block_explorer_urls: Vec<String>,

    /// Native currency name.
    #[serde(alias = "currencyname")]
    pub currency_name: String,

    /// Native currency symbol.
    #[serde(alias = "currencysymbol")]
    pub currency_symbol: String,

    /// Native currency decimals.
    #[serde(alias = "currencydecimals")]
    pub currency_decimals: u8,
}

impl Default for Chain {
    fn default() -> Self {
        Self {
            chain_id: 421614,
            chain_name: "Arbitrum Sepolia".to_owned(),
            rpc_urls: vec!["https://sepolia-rollup.arbitrum.io/rpc".to_owned()],
            block_explorer_urls: vec!["https://sepolia.arbiscan.io".to_owned()],
            currency_name: "ETH".to_owned(),
            currency_symbol: "ETH".to_owned(),
            currency_decimals: 18,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Contracts {
    /// USDC token address.
    pub token: String,

    /// Lending pool address.
    #[serde(alias = "lendingpool")]
    pub lending_pool: String,

    /// Pledge platform address.
    #[serde(alias = "pledgeplatform")]
    pub pledge_platform: String,

    /// Decimals of the token.
    #[serde(alias = "tokendecimals")]
    pub token_decimals: u8,

    /// Decimals the pledge platform uses for ounce quantities.
    #[serde(alias = "ouncedecimals")]
    pub ounce_decimals: u8,
}

impl Default for Contracts {
    fn default() -> Self {
        Self {
            token: "0x906e8e6FB02DC4F507227Fb8c75cA1B0e9D10e23".to_owned(),
            lending_pool: "0xFF0E997dA92B179349dA072f5b122977B848D44E".to_owned(),
            pledge_platform: "0x6BF6CfB0779cEf6b40ff88bB19060Ee8c84c8ADD".to_owned(),
            token_decimals: 6,
            ounce_decimals: 18,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Client {
    /// Wallet bridge endpoint speaking EIP-1193 over JSON-RPC.
    #[serde(alias = "walletendpoint")]
    pub wallet_endpoint: String,

    /// Maximum transaction submission attempts.
    ///
    /// Default is 3
    #[serde(alias = "maxattempts")]
    pub max_attempts: u64,

    /// Base backoff between attempts in milliseconds. Attempt `n` waits `n` times this.
    #[serde(alias = "retrybackoffms")]
    pub retry_backoff_ms: u64,

    /// Delay before re-reading the chain id after a network switch request.
    #[serde(alias = "networksettlems")]
    pub network_settle_ms: u64,

    /// Account balance refresh interval.
    #[serde(alias = "balancepollms")]
    pub balance_poll_ms: u64,

    /// Receipt polling interval while waiting for a confirmation.
    #[serde(alias = "receiptpollms")]
    pub receipt_poll_ms: u64,

    /// How often the HTTP provider checks for account and chain changes.
    #[serde(alias = "notificationpollms")]
    pub notification_poll_ms: u64,
}

impl Default for Client {
    fn default() -> Self {
        Self {
            wallet_endpoint: "http://127.0.0.1:1248".to_owned(),
            max_attempts: 3,
            retry_backoff_ms: 1000,
            network_settle_ms: 1000,
            balance_poll_ms: 5000,
            receipt_poll_ms: 1000,
            notification_poll_ms: 1000,
        }
    }
}

impl Client {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn network_settle(&self) -> Duration {
        Duration::from_millis(self.network_settle_ms)
    }

    pub fn balance_poll(&self) -> Duration {
        Duration::from_millis(self.balance_poll_ms)
    }

    pub fn receipt_poll(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms)
    }

    pub fn notification_poll(&self) -> Duration {
        Duration::from_millis(self.notification_poll_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DynamicConfVal {
    String(String),
    Sequence(Vec<String>),
    Bool(bool),
    U64(u64),
}
