// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use super::*;
use log::*;

#[derive(Clone, Debug)]
pub enum RewardsMessage {
    Claim,
}

pub struct RewardsForm {
    ctx: FormContext,
    status: FormStatus,
}

impl RewardsForm {
    pub fn new(ctx: FormContext) -> Self {
        Self {
            ctx,
            status: FormStatus::Idle,
        }
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub async fn update(&mut self, message: RewardsMessage) {
        match message {
            RewardsMessage::Claim => self.claim().await,
        }
    }

    pub async fn claim(&mut self) {
        self.status = FormStatus::Loading("Processing rewards claim...".to_owned());

        let ctx = &self.ctx;
        let deployment = &ctx.deployment;
        let result = match ctx.account() {
            Ok(_) => {
                ctx.transact(|signer| async move { deployment.claim_rewards(&signer).await })
                    .await
            }
            Err(err) => Err(err),
        };

        self.status = match result {
            Ok(receipt) => {
                info!("Claimed rewards in block {}", receipt.block_number);
                FormStatus::Success("✓ Successfully claimed rewards!".to_owned())
            }
            Err(err) => {
                warn!("Claim failed: {}", err);
                FormStatus::Error(error_message(&err, &[], LENDING_CONTEXT_LOST))
            }
        };
    }

    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![
            "Claim Rewards".to_owned(),
            "Claim your accumulated rewards from lending to the pool".to_owned(),
        ];
        lines.extend(self.status.render());
        lines.push(if self.status.is_loading() {
            "[Processing...]".to_owned()
        } else {
            "[Claim Rewards]".to_owned()
        });
        lines
    }
}
