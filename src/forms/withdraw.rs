// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use super::*;
use log::*;

#[derive(Clone, Debug)]
pub enum WithdrawMessage {
    AmountChanged(String),
    Submit,
}

pub struct WithdrawForm {
    ctx: FormContext,
    amount: String,
    status: FormStatus,
}

impl WithdrawForm {
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

    pub async fn update(&mut self, message: WithdrawMessage) {
        match message {
            WithdrawMessage::AmountChanged(value) => self.amount = value,
            WithdrawMessage::Submit => self.submit().await,
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

        self.status = FormStatus::Loading("Processing withdrawal...".to_owned());

        let ctx = &self.ctx;
        let deployment = &ctx.deployment;
        let result = match ctx.account() {
            Ok(_) => {
                ctx.transact(|signer| async move { deployment.withdraw(&signer, amount).await })
                    .await
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(receipt) => {
                info!("Withdrew {} units in block {}", amount, receipt.block_number);
                self.status = FormStatus::Success("✓ Successfully withdrew USDC!".to_owned());
                self.amount.clear();
            }
            Err(err) => {
                warn!("Withdraw failed: {}", err);
                self.status = FormStatus::Error(error_message(&err, &[], LENDING_CONTEXT_LOST));
            }
        }
    }

    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![
            "Withdraw USDC".to_owned(),
            format!("Amount (USDC): {}", self.amount),
        ];
        lines.extend(self.status.render());
        lines.push(if self.status.is_loading() {
            "[Processing...]".to_owned()
        } else {
            "[Withdraw USDC]".to_owned()
        });
        lines
    }
}
