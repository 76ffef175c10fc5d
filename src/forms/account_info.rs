// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::contracts::Deployment;
use crate::error::ClientError;
use crate::units::display_amount;
use crate::wallet::{Provider, WalletAdapter};
use alloy_primitives::{Address, U256};
use log::*;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Balances of the active account, in token units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub token_balance: U256,
    pub principal: U256,
    pub pending_rewards: U256,
}

impl AccountSnapshot {
    pub async fn read(
        provider: &dyn Provider,
        deployment: &Deployment,
        account: Address,
    ) -> Result<Self, ClientError> {
        let (token_balance, principal, pending_rewards) = futures::try_join!(
            deployment.token_balance(provider, account),
            deployment.principal(provider, account),
            deployment.pending_rewards(provider, account),
        )?;

        Ok(Self {
            token_balance,
            principal,
            pending_rewards,
        })
    }
}

/// Polls the balances of one account until dropped. Ticks that find another
/// account active in the session are skipped.
pub struct AccountInfo {
    account: Address,
    decimals: u8,
    snapshot: Arc<RwLock<AccountSnapshot>>,
    task: JoinHandle<()>,
}

impl AccountInfo {
    /// Reads right away, then every `period`.
    pub fn spawn(
        wallet: &WalletAdapter,
        deployment: Deployment,
        account: Address,
        period: Duration,
    ) -> Result<Self, ClientError> {
        let provider = wallet.provider()?;
        let wallet = wallet.clone();
        let snapshot = Arc::new(RwLock::new(AccountSnapshot::default()));
        let decimals = deployment.token_decimals;
        let published = snapshot.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                if wallet.session().account != Some(account) {
                    debug!("{} is no longer the active account, skipping poll", account);
                    continue;
                }

                match AccountSnapshot::read(provider.as_ref(), &deployment, account).await {
                    Ok(snapshot) => *published.write() = snapshot,
                    Err(err) => warn!("Error fetching account data: {}", err),
                }
            }
        });

        Ok(Self {
            account,
            decimals,
            snapshot,
            task,
        })
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        *self.snapshot.read()
    }

    pub fn render(&self) -> Vec<String> {
        let snapshot = self.snapshot();
        vec![
            format!(
                "USDC Balance: {} (available to lend)",
                display_amount(snapshot.token_balance, self.decimals)
            ),
            format!(
                "Deposited: {} (USDC in pool)",
                display_amount(snapshot.principal, self.decimals)
            ),
            format!(
                "Pending Rewards: {} (ready to claim)",
                display_amount(snapshot.pending_rewards, self.decimals)
            ),
        ]
    }
}

impl Drop for AccountInfo {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainParams;
    use crate::contracts::abi::{ILendingPool, IERC20};
    use crate::wallet::mock::*;
    use crate::wallet::{ProviderError, ProviderEvent};
    use alloy_sol_types::SolCall;
    use tokio::time::sleep;

    async fn wallet(mock: &Arc<MockProvider>) -> WalletAdapter {
        let wallet = WalletAdapter::new(
            Some(mock.clone() as Arc<dyn Provider>),
            ChainParams::arbitrum_sepolia(),
        );
        wallet.init().await.unwrap();
        wallet
    }

    fn pool_mock() -> Arc<MockProvider> {
        let mock = MockProvider::authorized(ALICE, 421614);
        mock.on_request(|method, params| {
            if method != "eth_call" {
                return None;
            }
            let sel = selector(params)?;
            let words = if sel == IERC20::balanceOfCall::SELECTOR {
                vec![word(U256::from(1_234_567_890u64))]
            } else if sel == ILendingPool::userBalancesCall::SELECTOR {
                vec![address_word(ALICE), word(U256::from(500_000_000u64))]
            } else if sel == ILendingPool::rewardsCall::SELECTOR {
                vec![word(U256::from(4_995_000u64))]
            } else {
                return None;
            };
            Some(Ok(encode_words(&words)))
        });
        mock
    }

    #[tokio::test(start_paused = true)]
    async fn polls_one_triple_per_tick_until_dropped() {
        let mock = pool_mock();
        let info = AccountInfo::spawn(
            &wallet(&mock).await,
            Deployment::arbitrum_sepolia(),
            ALICE,
            Duration::from_millis(5000),
        )
        .unwrap();

        // Ticks at 0, 5 and 10 seconds
        sleep(Duration::from_millis(12_500)).await;
        assert_eq!(mock.count("eth_call"), 9);

        drop(info);
        sleep(Duration::from_millis(30_000)).await;
        assert_eq!(mock.count("eth_call"), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_and_renders_snapshot() {
        let mock = pool_mock();
        let info = AccountInfo::spawn(
            &wallet(&mock).await,
            Deployment::arbitrum_sepolia(),
            ALICE,
            Duration::from_millis(5000),
        )
        .unwrap();
        sleep(Duration::from_millis(10)).await;

        assert_eq!(
            info.snapshot(),
            AccountSnapshot {
                token_balance: U256::from(1_234_567_890u64),
                principal: U256::from(500_000_000u64),
                pending_rewards: U256::from(4_995_000u64),
            }
        );
        assert_eq!(
            info.render(),
            vec![
                "USDC Balance: 1,234.57 (available to lend)".to_owned(),
                "Deposited: 500.00 (USDC in pool)".to_owned(),
                "Pending Rewards: 5.00 (ready to claim)".to_owned(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_keeps_polling() {
        let mock = MockProvider::authorized(ALICE, 421614);
        let mut calls = 0;
        mock.on_request(move |method, params| {
            if method != "eth_call" {
                return None;
            }
            calls += 1;
            if calls == 1 {
                return Some(Err(ProviderError::Transport("Failed to fetch".to_owned())));
            }
            if selector(params)? == ILendingPool::userBalancesCall::SELECTOR {
                return Some(Ok(encode_words(&[address_word(ALICE), word(U256::from(7u64))])));
            }
            Some(Ok(encode_words(&[word(U256::ZERO)])))
        });

        let info = AccountInfo::spawn(
            &wallet(&mock).await,
            Deployment::arbitrum_sepolia(),
            ALICE,
            Duration::from_millis(5000),
        )
        .unwrap();

        sleep(Duration::from_millis(10)).await;
        assert_eq!(info.snapshot(), AccountSnapshot::default());

        sleep(Duration::from_millis(5000)).await;
        assert_eq!(info.snapshot().principal, U256::from(7u64));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_querying_an_account_that_is_no_longer_active() {
        let mock = pool_mock();
        let wallet = wallet(&mock).await;
        let _listener = wallet.listen().unwrap();
        let info = AccountInfo::spawn(
            &wallet,
            Deployment::arbitrum_sepolia(),
            ALICE,
            Duration::from_millis(5000),
        )
        .unwrap();

        sleep(Duration::from_millis(10)).await;
        assert_eq!(mock.count("eth_call"), 3);

        mock.emit(ProviderEvent::AccountsChanged(vec![BOB]));
        sleep(Duration::from_millis(20_000)).await;
        assert_eq!(mock.count("eth_call"), 3);
        assert_eq!(info.account(), ALICE);
    }

    #[test]
    fn needs_an_installed_wallet() {
        let wallet = WalletAdapter::new(None, ChainParams::arbitrum_sepolia());
        let result = AccountInfo::spawn(
            &wallet,
            Deployment::arbitrum_sepolia(),
            ALICE,
            Duration::from_millis(5000),
        );
        assert!(matches!(result, Err(ClientError::WalletNotFound)));
    }
}
