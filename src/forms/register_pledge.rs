// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use super::*;
use log::*;

const KNOWN_REVERTS: &[(&str, &str)] = &[
    ("Invalid spread", "Invalid spread: must be between 0-12"),
    (
        "No reward to distribute",
        "Lending pool has no rewards to distribute. Try again later.",
    ),
];

#[derive(Clone, Debug)]
pub enum RegisterPledgeMessage {
    PledgorChanged(String),
    OuncesChanged(String),
    SpreadChanged(String),
    Submit,
}

/// Validated registration input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PledgeRegistration {
    pub pledgor: Address,
    pub quantity: U256,
    pub spread: U256,
}

impl PledgeRegistration {
    pub fn parse(
        pledgor: &str,
        ounces: &str,
        spread: &str,
        ounce_decimals: u8,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            pledgor: validate_address(pledgor)?,
            quantity: validate_ounces(ounces, ounce_decimals)?,
            spread: validate_spread(spread)?,
        })
    }
}

/// Registers a pledge of metal collateral on behalf of a pledgor.
pub struct RegisterPledgeForm {
    ctx: FormContext,
    pledgor: String,
    ounces: String,
    spread: String,
    status: FormStatus,
}

impl RegisterPledgeForm {
    pub fn new(ctx: FormContext) -> Self {
        Self {
            ctx,
            pledgor: String::new(),
            ounces: String::new(),
            spread: String::new(),
            status: FormStatus::Idle,
        }
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub fn fields(&self) -> (&str, &str, &str) {
        (&self.pledgor, &self.ounces, &self.spread)
    }

    pub async fn update(&mut self, message: RegisterPledgeMessage) {
        match message {
            RegisterPledgeMessage::PledgorChanged(value) => self.pledgor = value,
            RegisterPledgeMessage::OuncesChanged(value) => self.ounces = value,
            RegisterPledgeMessage::SpreadChanged(value) => self.spread = value,
            RegisterPledgeMessage::Submit => self.submit().await,
        }
    }

    pub async fn submit(&mut self) {
        let registration = match PledgeRegistration::parse(
            &self.pledgor,
            &self.ounces,
            &self.spread,
            self.ctx.deployment.ounce_decimals,
        ) {
            Ok(registration) => registration,
            Err(err) => {
                self.status = FormStatus::Error(err.to_string());
                return;
            }
        };

        self.status = FormStatus::Loading(String::new());

        match self.register(&registration).await {
            Ok(receipt) => {
                info!(
                    "Registered pledge for {} in block {}",
                    registration.pledgor, receipt.block_number
                );
                self.status = FormStatus::Success(format!(
                    "Pledge registered successfully! TX: {}",
                    tx_hash(&receipt.hash)
                ));
                self.pledgor.clear();
                self.ounces.clear();
                self.spread.clear();
            }
            Err(err) => {
                error!("Register pledge error: {}", err);
                self.status =
                    FormStatus::Error(error_message(&err, KNOWN_REVERTS, PLEDGE_CONTEXT_LOST));
            }
        }
    }

    async fn register(&mut self, registration: &PledgeRegistration) -> Result<Receipt, ClientError> {
        let ctx = &self.ctx;
        let deployment = &ctx.deployment;
        ctx.account()?;

        let PledgeRegistration {
            pledgor,
            quantity,
            spread,
        } = *registration;

        let pending = ctx
            .submit(|signer| async move {
                deployment
                    .register_pledge(&signer, pledgor, quantity, spread)
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
            "Register New Pledge".to_owned(),
            "Register a new pledge to tokenize metal collateral for a pledgor".to_owned(),
            format!("Pledgor Address: {}", self.pledgor),
            format!("Quantity (Troy Ounces): {}", self.ounces),
            format!("Interest Rate / Spread (%): {}", self.spread),
        ];
        lines.extend(self.status.render());
        lines.push(if self.status.is_loading() {
            "[Processing...]".to_owned()
        } else {
            "[Register Pledge]".to_owned()
        });
        lines
    }
}
