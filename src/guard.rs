// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::error::ClientError;
use crate::settings::Settings;
use crate::wallet::WalletAdapter;
use log::*;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardState {
    /// Chain id not known yet.
    Detecting,
    WrongNetwork { current: u64 },
    Ready,
}

pub fn evaluate(chain_id: Option<u64>, required: u64) -> GuardState {
    match chain_id {
        None => GuardState::Detecting,
        Some(id) if id == required => GuardState::Ready,
        Some(current) => GuardState::WrongNetwork { current },
    }
}

#[derive(Clone, Copy, Debug)]
enum Step {
    Switch,
    Add,
}

/// Blocks the functional UI until the wallet is on the required chain.
pub struct NetworkGuard {
    wallet: WalletAdapter,
    settle: Duration,
    error: Option<String>,
}

impl NetworkGuard {
    pub fn new(wallet: WalletAdapter, settle: Duration) -> Self {
        Self {
            wallet,
            settle,
            error: None,
        }
    }

    pub fn from_settings(wallet: WalletAdapter, settings: &Settings) -> Self {
        Self::new(wallet, settings.client.network_settle())
    }

    pub fn state(&self) -> GuardState {
        evaluate(self.wallet.session().chain_id, self.wallet.chain().chain_id)
    }

    pub fn is_ready(&self) -> bool {
        self.state() == GuardState::Ready
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Switch flow behind the "Switch Network" action. Any chain change
    /// notification that lands in the meantime just overwrites the session
    /// chain id, as does the final re-read.
    pub async fn switch(&mut self) -> Result<u64, ClientError> {
        self.error = None;

        self.try_switch().await.map_err(|(step, err)| {
            self.error = Some(match (&err, step) {
                (ClientError::WalletNotFound, _) => err.to_string(),
                (_, Step::Add) => format!("Failed to add {} network", self.wallet.chain().chain_name),
                (_, Step::Switch) => "Failed to switch network".to_owned(),
            });
            err
        })
    }

    async fn try_switch(&self) -> Result<u64, (Step, ClientError)> {
        match self.wallet.switch_chain().await {
            Ok(()) => {}
            Err(ClientError::UnrecognizedChain(_)) => {
                self.wallet.add_chain().await.map_err(|err| {
                    error!("Error adding chain: {}", err);
                    (Step::Add, err)
                })?;
            }
            Err(err) => {
                error!("Error switching chain: {}", err);
                return Err((Step::Switch, err));
            }
        }

        sleep(self.settle).await;

        let chain_id = self
            .wallet
            .read_chain_id()
            .await
            .map_err(|err| (Step::Switch, err))?;
        self.wallet.set_chain_id(chain_id);
        info!("Wallet now on chain {}", chain_id);

        Ok(chain_id)
    }

    /// Text shown instead of the guarded content, empty when ready.
    pub fn render(&self) -> Vec<String> {
        let chain = self.wallet.chain();

        match self.state() {
            GuardState::Ready => vec![],
            GuardState::Detecting => vec!["Detecting network...".to_owned()],
            GuardState::WrongNetwork { current } => {
                let mut lines = vec![
                    "Wrong Network".to_owned(),
                    format!("You are currently on Chain ID {current}"),
                    format!(
                        "Please switch to {} (Chain ID: {})",
                        chain.chain_name, chain.chain_id
                    ),
                    "Run `switch` and approve the network switch in your wallet.".to_owned(),
                ];
                if let Some(error) = &self.error {
                    lines.push(format!("Error: {error}"));
                }
                lines
            }
        }
    }
}
