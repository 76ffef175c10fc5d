// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use super::*;
use log::*;

const KNOWN_REVERTS: &[(&str, &str)] = &[
    ("Address without registry", "No pledge found for your address"),
    ("Amount overflow", "Payment amount exceeds remaining balance"),
];

#[derive(Clone, Debug)]
pub enum AmortizePledgeMessage {
    PledgeIdChanged(String),
    AmountChanged(String),
    Submit,
}

/// Pays down a pledge. The pledge platform pulls exactly the paid amount,
/// so it is approved for that amount first.
pub struct AmortizePledgeForm {
    ctx: FormContext,
    pledge_id: String,
    amount: String,
    status: FormStatus,
}

impl AmortizePledgeForm {
    pub fn new(ctx: FormContext) -> Self {
        Self {
            ctx,
            pledge_id: String::new(),
            amount: String::new(),
            status: FormStatus::Idle,
        }
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub fn fields(&self) -> (&str, &str) {
        (&self.pledge_id, &self.amount)
    }

    pub async fn update(&mut self, message: AmortizePledgeMessage) {
        match message {
            AmortizePledgeMessage::PledgeIdChanged(value) => self.pledge_id = value,
            AmortizePledgeMessage::AmountChanged(value) => self.amount = value,
            AmortizePledgeMessage::Submit => self.submit().await,
        }
    }

    fn validate(&self) -> Result<(U256, U256), ClientError> {
        if self.pledge_id.trim().is_empty() || self.amount.trim().is_empty() {
            return Err(ClientError::Validation(MISSING_FIELDS.to_owned()));
        }

        Ok((
            validate_pledge_id(&self.pledge_id)?,
            validate_amount(&self.amount, self.ctx.deployment.token_decimals)?,
        ))
    }

    pub async fn submit(&mut self) {
        let (pledge_id, amount) = match self.validate() {
            Ok(input) => input,
            Err(err) => {
                self.status = FormStatus::Error(err.to_string());
                return;
            }
        };

        self.status = FormStatus::Loading(String::new());

        match self.amortize(pledge_id, amount).await {
            Ok(receipt) => {
                info!(
                    "Paid {} units on pledge {} in block {}",
                    amount, pledge_id, receipt.block_number
                );
                self.status = FormStatus::Success(format!(
                    "Payment processed successfully! TX: {}",
                    tx_hash(&receipt.hash)
                ));
                self.pledge_id.clear();
                self.amount.clear();
            }
            Err(err) => {
                error!("Amortize pledge error: {}", err);
                self.status =
                    FormStatus::Error(error_message(&err, KNOWN_REVERTS, PLEDGE_CONTEXT_LOST));
            }
        }
    }

    async fn amortize(&mut self, pledge_id: U256, amount: U256) -> Result<Receipt, ClientError> {
        let ctx = &self.ctx;
        let deployment = &ctx.deployment;
        let platform = deployment.pledge_platform;
        ctx.account()?;

        let approval = ctx
            .submit(|signer| async move { deployment.approve(&signer, platform, amount).await })
            .await?;
        self.status = FormStatus::Loading("Approving USDC...".to_owned());
        approval.wait(ctx.receipt_poll).await?;

        let pending = ctx
            .submit(|signer| async move {
                deployment
                    .amortize_pledge(&signer, amount, pledge_id)
                    .await
            })
            .await?;
        self.status = FormStatus::Loading(
            "Transaction submitted. Waiting for confirmation...".to_owned(),
        );
        pending.wait(ctx.receipt_poll).await
    }

    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![
            "Pay Pledge".to_owned(),
            "Make a payment towards your pledged collateral".to_owned(),
            format!("Pledge ID: {}", self.pledge_id),
            format!("Payment Amount (USDC): {}", self.amount),
        ];
        lines.extend(self.status.render());
        lines.push(if self.status.is_loading() {
            "[Processing...]".to_owned()
        } else {
            "[Pay Pledge]".to_owned()
        });
        lines
    }
}
