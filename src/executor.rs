// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Bounded retry around transaction submission.
//!
//! Wallet extensions can lose their signing context while a prompt is open.
//! That condition goes away once a new signer is obtained, so it is the only
//! one retried. Everything else, including user rejections, fails fast.

use crate::contracts::Signer;
use crate::error::ClientError;
use crate::settings::Settings;
use async_trait::async_trait;
use log::*;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Hands out a signer bound to the active account.
#[async_trait]
pub trait SignerSource: Send + Sync {
    async fn signer(&self) -> Result<Signer, ClientError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionExecutor {
    max_attempts: u64,
    backoff: Duration,
}

impl TransactionExecutor {
    pub fn new(max_attempts: u64, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.client.max_attempts, settings.client.retry_backoff())
    }

    pub fn max_attempts(&self) -> u64 {
        self.max_attempts
    }

    /// Runs `submit` with a fresh signer until it succeeds, fails with a
    /// non-transient error, or the attempts run out. Before attempt `n + 1`
    /// it sleeps `backoff * n`.
    pub async fn execute<T, F, Fut>(
        &self,
        source: &dyn SignerSource,
        mut submit: F,
    ) -> Result<T, ClientError>
    where
        F: FnMut(Signer) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut attempt = 1;

        loop {
            let result = match source.signer().await {
                Ok(signer) => submit(signer).await,
                Err(err) => Err(err),
            };

            match result {
                Ok(out) => return Ok(out),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    let delay = self.backoff * attempt as u32;
                    warn!(
                        "Attempt {}/{} failed: {}. Retrying in {:?}",
                        attempt, self.max_attempts, err, delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        error!("Giving up after {} attempts: {}", attempt, err);
                    }
                    return Err(err);
                }
            }
        }
    }
}

impl Default for TransactionExecutor {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainParams;
    use crate::contracts::{Deployment, PendingTransaction};
    use crate::wallet::mock::*;
    use crate::wallet::{Provider, ProviderError, WalletAdapter};
    use alloy_primitives::{B256, U256};
    use serde_json::json;
    use std::sync::Arc;
    use tokio::time::Instant;

    fn flaky_wallet(failures: usize, error: ProviderError) -> (Arc<MockProvider>, WalletAdapter) {
        let mock = MockProvider::authorized(ALICE, 421614);
        let mut remaining = failures;
        mock.on_request(move |method, _| {
            if method != "eth_sendTransaction" {
                return None;
            }
            if remaining > 0 {
                remaining -= 1;
                return Some(Err(error.clone()));
            }
            Some(Ok(json!(TX_HASH)))
        });

        let wallet = WalletAdapter::new(
            Some(mock.clone() as Arc<dyn Provider>),
            ChainParams::arbitrum_sepolia(),
        );
        (mock, wallet)
    }

    fn invalidated() -> ProviderError {
        ProviderError::Transport("Error: Extension context invalidated.".to_owned())
    }

    async fn withdraw_one(
        executor: &TransactionExecutor,
        wallet: &WalletAdapter,
    ) -> Result<PendingTransaction, ClientError> {
        let deployment = Deployment::arbitrum_sepolia();
        executor
            .execute(wallet, |signer| {
                let deployment = deployment.clone();
                async move { deployment.withdraw(&signer, U256::from(1u64)).await }
            })
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_with_linear_backoff() {
        let (mock, wallet) = flaky_wallet(2, invalidated());
        let executor = TransactionExecutor::default();

        let start = Instant::now();
        let pending = withdraw_one(&executor, &wallet).await.unwrap();

        assert_eq!(pending.hash(), TX_HASH.parse::<B256>().unwrap());
        assert_eq!(mock.count("eth_sendTransaction"), 3);
        // A signer is requested for every attempt
        assert_eq!(mock.count("eth_requestAccounts"), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(1000 + 2000));
    }

    #[tokio::test(start_paused = true)]
    async fn surfaces_last_error_when_attempts_run_out() {
        let (mock, wallet) = flaky_wallet(5, invalidated());
        let executor = TransactionExecutor::default();

        let err = withdraw_one(&executor, &wallet).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(mock.count("eth_sendTransaction"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_other_failures() {
        let (mock, wallet) = flaky_wallet(1, ProviderError::rpc(4001, "User denied"));
        let executor = TransactionExecutor::default();

        let start = Instant::now();
        let err = withdraw_one(&executor, &wallet).await.unwrap_err();
        assert_eq!(err, ClientError::UserRejected("User denied".to_owned()));
        assert_eq!(mock.count("eth_sendTransaction"), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn missing_wallet_fails_without_submitting() {
        let wallet = WalletAdapter::new(None, ChainParams::arbitrum_sepolia());
        let executor = TransactionExecutor::default();

        let err = withdraw_one(&executor, &wallet).await.unwrap_err();
        assert_eq!(err, ClientError::WalletNotFound);
    }

    #[test]
    fn reads_limits_from_settings() {
        let executor = TransactionExecutor::from_settings(&Settings::default());
        assert_eq!(executor, TransactionExecutor::default());
        assert_eq!(TransactionExecutor::new(0, Duration::ZERO).max_attempts(), 1);
    }
}
