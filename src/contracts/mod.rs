// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::error::ClientError;
use crate::settings::Settings;
use crate::units::{display_amount, format_units};
use crate::wallet::Provider;
use abi::{IPledgePlatform, ILendingPool, IERC20};
use alloy_primitives::{Address, U256};
use chrono::{DateTime, TimeZone, Utc};
use std::str::FromStr;

pub mod abi;
mod tx;
pub use tx::*;

/// Addresses and decimals of the deployed contracts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deployment {
    pub token: Address,
    pub lending_pool: Address,
    pub pledge_platform: Address,
    pub token_decimals: u8,
    pub ounce_decimals: u8,
}

impl Deployment {
    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        let contracts = &settings.contracts;
        let parse = |name: &str, value: &str| {
            Address::from_str(value)
                .map_err(|err| ClientError::Validation(format!("{name} address {value}: {err}")))
        };

        Ok(Self {
            token: parse("token", &contracts.token)?,
            lending_pool: parse("lending pool", &contracts.lending_pool)?,
            pledge_platform: parse("pledge platform", &contracts.pledge_platform)?,
            token_decimals: contracts.token_decimals,
            ounce_decimals: contracts.ounce_decimals,
        })
    }

    pub fn arbitrum_sepolia() -> Self {
        Self {
            token: alloy_primitives::address!("906e8e6FB02DC4F507227Fb8c75cA1B0e9D10e23"),
            lending_pool: alloy_primitives::address!("FF0E997dA92B179349dA072f5b122977B848D44E"),
            pledge_platform: alloy_primitives::address!("6BF6CfB0779cEf6b40ff88bB19060Ee8c84c8ADD"),
            token_decimals: 6,
            ounce_decimals: 18,
        }
    }

    pub async fn token_balance(
        &self,
        provider: &dyn Provider,
        account: Address,
    ) -> Result<U256, ClientError> {
        Ok(call(provider, self.token, &IERC20::balanceOfCall { account })
            .await?
            ._0)
    }

    pub async fn allowance(
        &self,
        provider: &dyn Provider,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ClientError> {
        Ok(
            call(provider, self.token, &IERC20::allowanceCall { owner, spender })
                .await?
                ._0,
        )
    }

    /// Principal `account` has deposited in the pool.
    pub async fn principal(
        &self,
        provider: &dyn Provider,
        account: Address,
    ) -> Result<U256, ClientError> {
        let balance = call(
            provider,
            self.lending_pool,
            &ILendingPool::userBalancesCall { account },
        )
        .await?;
        Ok(balance.principal)
    }

    pub async fn pending_rewards(
        &self,
        provider: &dyn Provider,
        account: Address,
    ) -> Result<U256, ClientError> {
        Ok(
            call(provider, self.lending_pool, &ILendingPool::rewardsCall { account })
                .await?
                ._0,
        )
    }

    pub async fn pledge(
        &self,
        provider: &dyn Provider,
        pledge_id: U256,
    ) -> Result<PledgeInfo, ClientError> {
        let pledge = call(
            provider,
            self.pledge_platform,
            &IPledgePlatform::getPledgeByIdCall {
                pledgeId: pledge_id,
            },
        )
        .await?
        ._0;
        Ok(PledgeInfo::new(pledge_id, pledge))
    }

    pub async fn approve(
        &self,
        signer: &Signer,
        spender: Address,
        amount: U256,
    ) -> Result<PendingTransaction, ClientError> {
        signer
            .send(self.token, &IERC20::approveCall { spender, amount })
            .await
    }

    pub async fn lend(
        &self,
        signer: &Signer,
        amount: U256,
    ) -> Result<PendingTransaction, ClientError> {
        signer
            .send(self.lending_pool, &ILendingPool::lendUSDCCall { amount })
            .await
    }

    pub async fn withdraw(
        &self,
        signer: &Signer,
        amount: U256,
    ) -> Result<PendingTransaction, ClientError> {
        signer
            .send(self.lending_pool, &ILendingPool::withdrawCall { amount })
            .await
    }

    pub async fn claim_rewards(&self, signer: &Signer) -> Result<PendingTransaction, ClientError> {
        signer
            .send(self.lending_pool, &ILendingPool::claimRewardsCall {})
            .await
    }

    pub async fn register_pledge(
        &self,
        signer: &Signer,
        pledgor: Address,
        quantity: U256,
        spread: U256,
    ) -> Result<PendingTransaction, ClientError> {
        signer
            .send(
                self.pledge_platform,
                &IPledgePlatform::pledgeRegistryCall {
                    pledgor,
                    amount: quantity,
                    spread,
                },
            )
            .await
    }

    pub async fn amortize_pledge(
        &self,
        signer: &Signer,
        amount: U256,
        pledge_id: U256,
    ) -> Result<PendingTransaction, ClientError> {
        signer
            .send(
                self.pledge_platform,
                &IPledgePlatform::amortizePledgeCall {
                    amount,
                    pledgeId: pledge_id,
                },
            )
            .await
    }
}

impl Default for Deployment {
    fn default() -> Self {
        Self::arbitrum_sepolia()
    }
}

/// Read-only projection of a pledge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PledgeInfo {
    pub id: U256,
    pub pledgor: Address,
    pub quantity_in_ounces: U256,
    pub pledge_date: Option<DateTime<Utc>>,
    pub redemption_date: Option<DateTime<Utc>>,
    pub agreement_id: U256,
    pub redemption_approved: bool,
    pub ounce_price: U256,
}

impl PledgeInfo {
    pub fn new(id: U256, pledge: abi::Pledge) -> Self {
        Self {
            id,
            pledgor: pledge.pledgor,
            quantity_in_ounces: pledge.quantityInOunces,
            pledge_date: timestamp(pledge.pledgeDate),
            redemption_date: timestamp(pledge.redemptionDate),
            agreement_id: pledge.agreementId,
            redemption_approved: pledge.redemptionApproved,
            ounce_price: pledge.ouncePrice,
        }
    }

    /// Lines shown by the pledge lookup.
    pub fn describe(&self, deployment: &Deployment) -> Vec<String> {
        let date = |d: &Option<DateTime<Utc>>| match d {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => "-".to_owned(),
        };

        vec![
            format!("Pledge #{}", self.id),
            format!("Pledgor: {}", self.pledgor),
            format!(
                "Quantity: {} oz",
                format_units(self.quantity_in_ounces, deployment.ounce_decimals)
            ),
            format!("Pledged: {}", date(&self.pledge_date)),
            format!("Redemption: {}", date(&self.redemption_date)),
            format!("Agreement: {}", self.agreement_id),
            format!(
                "Redemption approved: {}",
                if self.redemption_approved { "yes" } else { "no" }
            ),
            format!(
                "Ounce price: {} USDC",
                display_amount(self.ounce_price, deployment.token_decimals)
            ),
        ]
    }
}

fn timestamp(value: U256) -> Option<DateTime<Utc>> {
    if value.is_zero() {
        return None;
    }

    let secs = i64::try_from(value).ok()?;
    Utc.timestamp_opt(secs, 0).single()
}
