// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! One module per user action plus the account balance poller.
//!
//! Every form runs the same pipeline: validate the raw input, convert it to
//! token units, submit one or two transactions through the
//! [`TransactionExecutor`], wait for a confirmation and turn whatever went
//! wrong into a message for the user. Nothing reaches the wallet before the
//! input validated.

use crate::contracts::{Deployment, PendingTransaction, Receipt, Signer};
use crate::error::ClientError;
use crate::executor::TransactionExecutor;
use crate::settings::Settings;
use crate::units::{decimal_to_units, parse_decimal, UnitsError};
use crate::wallet::WalletAdapter;
use alloy_primitives::{Address, B256, U256};
use rust_decimal::Decimal;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

pub mod account_info;
pub mod amortize_pledge;
pub mod lend;
pub mod pledge_lookup;
pub mod register_pledge;
pub mod rewards;
pub mod withdraw;

pub const INVALID_AMOUNT: &str = "Please enter a valid amount";
pub const INVALID_PLEDGOR: &str = "Invalid pledgor address";
pub const INVALID_OUNCES: &str = "Ounces must be a positive integer";
pub const INVALID_SPREAD: &str = "Spread must be an integer between 0 and 12 (max 12%)";
pub const INVALID_PLEDGE_ID: &str = "Pledge ID must be a non-negative integer";
pub const MISSING_FIELDS: &str = "Please fill in all fields";

/// Shown by the lending pool forms once retries are exhausted.
pub const LENDING_CONTEXT_LOST: &str = "Extension context lost. Please try again.";

/// Shown by the pledge platform forms once retries are exhausted.
pub const PLEDGE_CONTEXT_LOST: &str = "Wallet connection lost. Please reconnect and try again.";

pub const MAX_SPREAD: u64 = 12;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FormStatus {
    #[default]
    Idle,
    Loading(String),
    Success(String),
    Error(String),
}

impl FormStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, FormStatus::Loading(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            FormStatus::Idle => None,
            FormStatus::Loading(msg) | FormStatus::Success(msg) | FormStatus::Error(msg) => {
                if msg.is_empty() {
                    None
                } else {
                    Some(msg.as_str())
                }
            }
        }
    }

    /// Status line as rendered under a form.
    pub fn render(&self) -> Option<String> {
        let msg = self.message()?;
        Some(match self {
            FormStatus::Error(_) => format!("Error: {msg}"),
            _ => msg.to_owned(),
        })
    }
}

/// What every form needs to talk to the chain.
#[derive(Clone)]
pub struct FormContext {
    pub wallet: WalletAdapter,
    pub deployment: Deployment,
    pub executor: TransactionExecutor,
    pub receipt_poll: Duration,
}

impl FormContext {
    pub fn new(wallet: WalletAdapter, deployment: Deployment, executor: TransactionExecutor) -> Self {
        Self {
            wallet,
            deployment,
            executor,
            receipt_poll: Duration::from_millis(1000),
        }
    }

    pub fn from_settings(wallet: WalletAdapter, settings: &Settings) -> Result<Self, ClientError> {
        Ok(Self {
            wallet,
            deployment: Deployment::from_settings(settings)?,
            executor: TransactionExecutor::from_settings(settings),
            receipt_poll: settings.client.receipt_poll(),
        })
    }

    pub fn with_receipt_poll(mut self, poll: Duration) -> Self {
        self.receipt_poll = poll;
        self
    }

    /// Active account of the session.
    pub fn account(&self) -> Result<Address, ClientError> {
        self.wallet.session().account.ok_or(ClientError::NotConnected)
    }

    /// Submits through the executor.
    pub async fn submit<F, Fut>(&self, submit: F) -> Result<PendingTransaction, ClientError>
    where
        F: FnMut(Signer) -> Fut,
        Fut: Future<Output = Result<PendingTransaction, ClientError>>,
    {
        self.executor.execute(&self.wallet, submit).await
    }

    /// Submits through the executor and waits for one confirmation.
    pub async fn transact<F, Fut>(&self, submit: F) -> Result<Receipt, ClientError>
    where
        F: FnMut(Signer) -> Fut,
        Fut: Future<Output = Result<PendingTransaction, ClientError>>,
    {
        self.submit(submit).await?.wait(self.receipt_poll).await
    }
}

/// Turns an error into the text a form shows. Revert reasons found in
/// `known_reverts` are replaced, unknown ones are shown as they are.
pub fn error_message(
    err: &ClientError,
    known_reverts: &[(&str, &str)],
    context_lost: &str,
) -> String {
    match err {
        ClientError::ContextInvalidated(_) => context_lost.to_owned(),
        ClientError::Reverted(reason) => known_reverts
            .iter()
            .find(|(known, _)| known == reason)
            .map(|(_, friendly)| (*friendly).to_owned())
            .unwrap_or_else(|| reason.clone()),
        other => other.to_string(),
    }
}

pub fn tx_hash(hash: &B256) -> String {
    format!("0x{}", hex::encode(hash))
}

fn invalid(msg: &str) -> ClientError {
    ClientError::Validation(msg.to_owned())
}

/// Positive decimal amount converted into units with `decimals` digits.
pub fn validate_amount(input: &str, decimals: u8) -> Result<U256, ClientError> {
    let amount = parse_decimal(input).map_err(|_| invalid(INVALID_AMOUNT))?;
    if amount <= Decimal::ZERO {
        return Err(invalid(INVALID_AMOUNT));
    }

    decimal_to_units(amount, decimals).map_err(|err| match err {
        UnitsError::TooManyDecimals { .. } => ClientError::Validation(err.to_string()),
        _ => invalid(INVALID_AMOUNT),
    })
}

/// A `0x` address with 40 hex digits. Mixed case input must carry a valid
/// EIP-55 checksum, all lower or all upper case input is taken as is.
pub fn validate_address(input: &str) -> Result<Address, ClientError> {
    let input = input.trim();
    let digits = input
        .strip_prefix("0x")
        .ok_or_else(|| invalid(INVALID_PLEDGOR))?;

    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid(INVALID_PLEDGOR));
    }

    let mixed_case = digits.chars().any(|c| c.is_ascii_lowercase())
        && digits.chars().any(|c| c.is_ascii_uppercase());

    if mixed_case {
        Address::parse_checksummed(input, None).map_err(|_| invalid(INVALID_PLEDGOR))
    } else {
        Address::from_str(input).map_err(|_| invalid(INVALID_PLEDGOR))
    }
}

/// Whole number of ounces, scaled to `decimals`.
pub fn validate_ounces(input: &str, decimals: u8) -> Result<U256, ClientError> {
    let ounces = parse_decimal(input).map_err(|_| invalid(INVALID_OUNCES))?;
    if ounces <= Decimal::ZERO || !ounces.fract().is_zero() {
        return Err(invalid(INVALID_OUNCES));
    }

    decimal_to_units(ounces.trunc(), decimals).map_err(|_| invalid(INVALID_OUNCES))
}

pub fn validate_spread(input: &str) -> Result<U256, ClientError> {
    let spread = parse_decimal(input).map_err(|_| invalid(INVALID_SPREAD))?;
    if !spread.fract().is_zero() || spread < Decimal::ZERO || spread > Decimal::from(MAX_SPREAD) {
        return Err(invalid(INVALID_SPREAD));
    }

    decimal_to_units(spread.trunc(), 0).map_err(|_| invalid(INVALID_SPREAD))
}

pub fn validate_pledge_id(input: &str) -> Result<U256, ClientError> {
    let input = input.trim();
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(INVALID_PLEDGE_ID));
    }

    U256::from_str_radix(input, 10).map_err(|_| invalid(INVALID_PLEDGE_ID))
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use crate::chain::ChainParams;
    use crate::wallet::mock::{receipt_ok, MockProvider, TX_HASH};
    use crate::wallet::{Provider, ProviderError};
    use serde_json::{json, Value};
    use std::sync::Arc;

    /// Connected context on the required chain with fast receipt polling.
    pub async fn context(mock: &Arc<MockProvider>) -> FormContext {
        let wallet = WalletAdapter::new(
            Some(mock.clone() as Arc<dyn Provider>),
            ChainParams::arbitrum_sepolia(),
        );
        wallet.init().await.unwrap();
        FormContext::new(
            wallet,
            Deployment::arbitrum_sepolia(),
            TransactionExecutor::new(3, Duration::from_millis(1)),
        )
        .with_receipt_poll(Duration::from_millis(1))
    }

    /// Accepts every transaction and confirms it right away.
    pub fn confirm_all(method: &str) -> Option<Result<Value, ProviderError>> {
        match method {
            "eth_sendTransaction" => Some(Ok(json!(TX_HASH))),
            "eth_getTransactionReceipt" => Some(Ok(receipt_ok())),
            _ => None,
        }
    }

    /// Target and calldata of every submitted transaction, in order.
    pub fn sent(mock: &MockProvider) -> Vec<(Address, Vec<u8>)> {
        mock.requests()
            .into_iter()
            .filter(|(method, _)| method == "eth_sendTransaction")
            .map(|(_, params)| {
                let to = params[0]["to"].as_str().unwrap().parse().unwrap();
                let data = params[0]["data"].as_str().unwrap().trim_start_matches("0x");
                (to, hex::decode(data).unwrap())
            })
            .collect()
    }
}
