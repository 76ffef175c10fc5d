// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use super::*;
use log::*;

const NETWORK_FAILED: &str = "Network request failed. Please check your connection and try again.";

#[derive(Clone, Debug)]
pub enum LendMessage {
    AmountChanged(String),
    Submit,
}

/// Deposits USDC into the lending pool, approving the pool first when the
/// current allowance does not cover the amount.
pub struct LendForm {
    ctx: FormContext,
    amount: String,
    status: FormStatus,
}

impl LendForm {
    pub fn new(ctx: FormContext) -> Self {
        Self {
            ctx,
            amount: String::new(),
            status: FormStatus::Idle,
        }
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub async fn update(&mut self, message: LendMessage) {
        match message {
            LendMessage::AmountChanged(value) => self.amount = value,
            LendMessage::Submit => self.submit().await,
        }
    }

    pub async fn submit(&mut self) {
        let amount = match validate_amount(&self.amount, self.ctx.deployment.token_decimals) {
            Ok(amount) => amount,
            Err(err) => {
                self.status = FormStatus::Error(err.to_string());
                return;
            }
        };

        self.status = FormStatus::Loading(String::new());

        match self.lend(amount).await {
            Ok(receipt) => {
                info!("Lent {} units in block {}", amount, receipt.block_number);
                self.status = FormStatus::Success("✓ Successfully lent USDC!".to_owned());
                self.amount.clear();
            }
            Err(err) => {
                let msg = match &err {
                    ClientError::Network(msg) if msg.contains("Failed to fetch") => {
                        NETWORK_FAILED.to_owned()
                    }
                    _ => error_message(&err, &[], LENDING_CONTEXT_LOST),
                };
                warn!("Lend failed: {}", err);
                self.status = FormStatus::Error(msg);
            }
        }
    }

    async fn lend(&mut self, amount: U256) -> Result<Receipt, ClientError> {
        let ctx = &self.ctx;
        let deployment = &ctx.deployment;
        let pool = deployment.lending_pool;
        let owner = ctx.account()?;
        let provider = ctx.wallet.provider()?;

        let allowance = deployment.allowance(provider.as_ref(), owner, pool).await?;
        if allowance < amount {
            self.status = FormStatus::Loading("Approving USDC...".to_owned());
            ctx.transact(|signer| async move { deployment.approve(&signer, pool, U256::MAX).await })
                .await?;
            debug!("USDC approval confirmed");
        }

        self.status = FormStatus::Loading("Sending transaction...".to_owned());
        ctx.transact(|signer| async move { deployment.lend(&signer, amount).await })
            .await
    }

    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![
            "Lend USDC".to_owned(),
            format!("Amount (USDC): {}", self.amount),
        ];
        lines.extend(self.status.render());
        lines.push(if self.status.is_loading() {
            "[Processing...]".to_owned()
        } else {
            "[Lend USDC]".to_owned()
        });
        lines
    }
}
