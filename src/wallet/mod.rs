// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::chain::{parse_chain_id, ChainParams};
use crate::contracts::Signer;
use crate::error::ClientError;
use crate::executor::SignerSource;
use alloy_primitives::Address;
use async_trait::async_trait;
use log::*;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::task::JoinHandle;

mod provider;
pub use provider::*;

#[cfg(feature = "http-provider")]
pub mod http;

#[cfg(test)]
pub mod mock;

/// What the client currently knows about the wallet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
}

impl Session {
    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// `0x1234...abcd` form of the active account.
    pub fn short_account(&self) -> Option<String> {
        self.account.map(|account| short_address(&account))
    }
}

pub fn short_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Keeps a [`Session`] in sync with the wallet provider.
#[derive(Clone)]
pub struct WalletAdapter {
    provider: Option<Arc<dyn Provider>>,
    chain: ChainParams,
    session: Arc<RwLock<Session>>,
}

impl WalletAdapter {
    pub fn new(provider: Option<Arc<dyn Provider>>, chain: ChainParams) -> Self {
        Self {
            provider,
            chain,
            session: Arc::new(RwLock::new(Session::default())),
        }
    }

    pub fn provider(&self) -> Result<Arc<dyn Provider>, ClientError> {
        self.provider.clone().ok_or(ClientError::WalletNotFound)
    }

    pub fn is_installed(&self) -> bool {
        self.provider.is_some()
    }

    pub fn chain(&self) -> &ChainParams {
        &self.chain
    }

    pub fn session(&self) -> Session {
        self.session.read().clone()
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.session.write().chain_id = Some(chain_id);
    }

    /// Reads already authorized accounts and the active chain without prompting.
    pub async fn init(&self) -> Result<Session, ClientError> {
        let provider = self.provider()?;

        let accounts = parse_accounts(&provider.request("eth_accounts", json!([])).await?)?;
        if let Some(account) = accounts.first() {
            self.session.write().account = Some(*account);
        }

        let chain_id = self.read_chain_id().await?;
        self.session.write().chain_id = Some(chain_id);
        debug!("Wallet session initialized: {:?}", self.session());

        Ok(self.session())
    }

    pub async fn read_chain_id(&self) -> Result<u64, ClientError> {
        let provider = self.provider()?;
        let raw = provider.request("eth_chainId", json!([])).await?;
        parse_chain_id(&raw).ok_or_else(|| ClientError::Decode(format!("chain id {raw}")))
    }

    pub async fn switch_chain(&self) -> Result<(), ClientError> {
        self.provider()?
            .request("wallet_switchEthereumChain", self.chain.switch_params())
            .await?;
        Ok(())
    }

    pub async fn add_chain(&self) -> Result<(), ClientError> {
        info!("Adding {} to wallet", self.chain.chain_name);
        self.provider()?
            .request("wallet_addEthereumChain", self.chain.add_params())
            .await?;
        Ok(())
    }

    /// Asks the wallet to switch to the required chain, adding it first if the
    /// wallet does not know it.
    pub async fn request_chain(&self) -> Result<(), ClientError> {
        match self.switch_chain().await {
            Err(ClientError::UnrecognizedChain(_)) => self.add_chain().await.map_err(|err| {
                error!("Error adding {}: {}", self.chain.chain_name, err);
                err
            }),
            other => other,
        }
    }

    /// Switches to the required chain, then requests account access. The wallet
    /// only prompts if the account is not authorized yet.
    pub async fn connect(&self) -> Result<Address, ClientError> {
        let provider = self.provider()?;
        self.request_chain().await?;

        let accounts =
            parse_accounts(&provider.request("eth_requestAccounts", json!([])).await?)?;
        let account = *accounts.first().ok_or(ClientError::NotConnected)?;
        self.session.write().account = Some(account);
        info!("Connected account {}", short_address(&account));

        Ok(account)
    }

    /// Forgets the account locally. Wallet side authorization is left alone.
    pub fn disconnect(&self) {
        self.session.write().account = None;
        info!("Disconnected");
    }

    /// Applies provider notifications to the session until the returned
    /// [`Subscription`] is dropped.
    pub fn listen(&self) -> Result<Subscription, ClientError> {
        let events = self.provider()?.subscribe();
        let session = self.session.clone();

        let task = tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                apply_event(&session, event);
            }
        });

        Ok(Subscription { task })
    }
}

fn apply_event(session: &RwLock<Session>, event: ProviderEvent) {
    match event {
        ProviderEvent::AccountsChanged(accounts) => {
            let account = accounts.first().copied();
            if account.is_none() {
                info!("Wallet reported no accounts, disconnecting");
            }
            session.write().account = account;
        }
        ProviderEvent::ChainChanged(chain_id) => {
            debug!("Chain changed to {}", chain_id);
            session.write().chain_id = Some(chain_id);
        }
    }
}

/// Live notification listener. Dropping it stops the listener before the
/// receiver is released, so nothing is applied to the session afterwards.
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[async_trait]
impl SignerSource for WalletAdapter {
    async fn signer(&self) -> Result<Signer, ClientError> {
        let provider = self.provider()?;
        let accounts =
            parse_accounts(&provider.request("eth_requestAccounts", json!([])).await?)?;
        let address = *accounts.first().ok_or(ClientError::NotConnected)?;
        Ok(Signer::new(provider, address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::mock::{MockProvider, ALICE, BOB};
    use std::time::Duration;

    fn adapter(mock: &Arc<MockProvider>) -> WalletAdapter {
        WalletAdapter::new(
            Some(mock.clone() as Arc<dyn Provider>),
            ChainParams::arbitrum_sepolia(),
        )
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn init_reads_without_prompting() {
        let mock = MockProvider::authorized(ALICE, 421614);
        let wallet = adapter(&mock);

        let session = wallet.init().await.unwrap();
        assert_eq!(session.account, Some(ALICE));
        assert_eq!(session.chain_id, Some(421614));
        assert_eq!(mock.count("eth_requestAccounts"), 0);
        assert_eq!(mock.prompts(), 0);
    }

    #[tokio::test]
    async fn init_without_authorization_leaves_account_empty() {
        let mock = MockProvider::locked(ALICE, 1);
        let wallet = adapter(&mock);

        let session = wallet.init().await.unwrap();
        assert_eq!(session.account, None);
        assert_eq!(session.chain_id, Some(1));
    }

    #[tokio::test]
    async fn missing_wallet_is_a_configuration_error() {
        let wallet = WalletAdapter::new(None, ChainParams::arbitrum_sepolia());
        assert_eq!(wallet.init().await, Err(ClientError::WalletNotFound));
        assert_eq!(wallet.connect().await, Err(ClientError::WalletNotFound));
        assert!(wallet.listen().is_err());
    }

    #[tokio::test]
    async fn connect_adds_unknown_chain_then_requests_accounts() {
        let mock = MockProvider::locked(ALICE, 1);
        let wallet = adapter(&mock);

        assert_eq!(wallet.connect().await.unwrap(), ALICE);
        assert_eq!(
            mock.methods(),
            vec![
                "wallet_switchEthereumChain",
                "wallet_addEthereumChain",
                "eth_requestAccounts"
            ]
        );
        assert_eq!(mock.chain_id(), 421614);
        assert_eq!(mock.prompts(), 1);
    }

    #[tokio::test]
    async fn user_rejection_is_surfaced_verbatim() {
        let mock = MockProvider::locked(ALICE, 421614);
        mock.reject_prompts();
        let wallet = adapter(&mock);

        let err = wallet.connect().await.unwrap_err();
        assert_eq!(
            err,
            ClientError::UserRejected("User rejected the request.".to_owned())
        );
        assert_eq!(wallet.session().account, None);
    }

    #[tokio::test]
    async fn disconnect_then_reconnect_does_not_prompt_again() {
        let mock = MockProvider::locked(ALICE, 421614);
        let wallet = adapter(&mock);

        wallet.connect().await.unwrap();
        assert_eq!(mock.prompts(), 1);

        wallet.disconnect();
        assert_eq!(wallet.session().account, None);
        assert!(mock.is_authorized());

        assert_eq!(wallet.connect().await.unwrap(), ALICE);
        assert_eq!(mock.prompts(), 1);
        assert_eq!(wallet.session().account, Some(ALICE));
    }

    #[tokio::test]
    async fn notifications_update_session_until_dropped() {
        let mock = MockProvider::authorized(ALICE, 421614);
        let wallet = adapter(&mock);
        wallet.init().await.unwrap();

        let subscription = wallet.listen().unwrap();
        assert!(subscription.is_active());

        mock.emit(ProviderEvent::AccountsChanged(vec![BOB, ALICE]));
        mock.emit(ProviderEvent::ChainChanged(1));
        settle().await;
        assert_eq!(wallet.session().account, Some(BOB));
        assert_eq!(wallet.session().chain_id, Some(1));

        mock.emit(ProviderEvent::AccountsChanged(vec![]));
        settle().await;
        assert_eq!(wallet.session().account, None);

        drop(subscription);
        settle().await;
        mock.emit(ProviderEvent::ChainChanged(421614));
        settle().await;
        assert_eq!(wallet.session().chain_id, Some(1));
        assert_eq!(mock.subscriber_count(), 0);
    }

    #[test]
    fn short_address_keeps_prefix_and_suffix() {
        let session = Session {
            account: Some(ALICE),
            chain_id: None,
        };
        let short = session.short_account().unwrap();
        assert!(short.starts_with("0x"));
        assert_eq!(short.len(), 13);
    }
}
