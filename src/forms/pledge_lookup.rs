// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use super::*;
use crate::contracts::PledgeInfo;
use log::*;

#[derive(Clone, Debug)]
pub enum PledgeLookupMessage {
    PledgeIdChanged(String),
    Lookup,
}

/// Read-only view of a single pledge.
pub struct PledgeLookup {
    ctx: FormContext,
    pledge_id: String,
    pledge: Option<PledgeInfo>,
    status: FormStatus,
}

impl PledgeLookup {
    pub fn new(ctx: FormContext) -> Self {
        Self {
            ctx,
            pledge_id: String::new(),
            pledge: None,
            status: FormStatus::Idle,
        }
    }

    pub fn pledge(&self) -> Option<&PledgeInfo> {
        self.pledge.as_ref()
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub async fn update(&mut self, message: PledgeLookupMessage) {
        match message {
            PledgeLookupMessage::PledgeIdChanged(value) => self.pledge_id = value,
            PledgeLookupMessage::Lookup => self.lookup().await,
        }
    }

    pub async fn lookup(&mut self) {
        self.pledge = None;

        let pledge_id = match validate_pledge_id(&self.pledge_id) {
            Ok(id) => id,
            Err(err) => {
                self.status = FormStatus::Error(err.to_string());
                return;
            }
        };

        self.status = FormStatus::Loading(String::new());

        let result = match self.ctx.wallet.provider() {
            Ok(provider) => self.ctx.deployment.pledge(provider.as_ref(), pledge_id).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(pledge) => {
                self.pledge = Some(pledge);
                self.status = FormStatus::Idle;
            }
            Err(err) => {
                warn!("Could not read pledge {}: {}", pledge_id, err);
                self.status = FormStatus::Error(err.to_string());
            }
        }
    }

    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![
            "Pledge Details".to_owned(),
            format!("Pledge ID: {}", self.pledge_id),
        ];
        if let Some(pledge) = &self.pledge {
            lines.extend(pledge.describe(&self.ctx.deployment));
        }
        lines.extend(self.status.render());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::abi::IPledgePlatform;
    use crate::forms::test_util::*;
    use crate::wallet::mock::*;
    use alloy_sol_types::SolCall;

    #[tokio::test]
    async fn shows_pledge_details() {
        let mock = MockProvider::authorized(ALICE, 421614);
        mock.on_request(|method, params| {
            if method != "eth_call" {
                return None;
            }
            let data = hex::decode(params[0]["data"].as_str()?.trim_start_matches("0x")).ok()?;
            let call = IPledgePlatform::getPledgeByIdCall::abi_decode(&data, true).ok()?;
            assert_eq!(call.pledgeId, U256::from(2u64));
            Some(Ok(encode_words(&[
                address_word(ALICE),
                word(U256::from(5u64) * U256::from(10u64).pow(U256::from(18u64))),
                word(U256::from(1_704_067_200u64)),
                word(U256::from(1_735_689_600u64)),
                word(U256::from(11u64)),
                word(U256::ZERO),
                word(U256::from(2_000_000_000u64)),
            ])))
        });
        let ctx = context(&mock).await;

        let mut lookup = PledgeLookup::new(ctx);
        lookup
            .update(PledgeLookupMessage::PledgeIdChanged("2".to_owned()))
            .await;
        lookup.update(PledgeLookupMessage::Lookup).await;

        let pledge = lookup.pledge().unwrap();
        assert_eq!(pledge.pledgor, ALICE);
        assert!(!pledge.redemption_approved);

        let lines = lookup.render();
        assert!(lines.contains(&"Quantity: 5.0 oz".to_owned()));
        assert!(lines.contains(&"Pledged: 2024-01-01".to_owned()));
        assert!(lines.contains(&"Redemption: 2025-01-01".to_owned()));
        assert!(lines.contains(&"Redemption approved: no".to_owned()));
    }

    #[tokio::test]
    async fn rejects_malformed_id() {
        let mock = MockProvider::authorized(ALICE, 421614);
        let ctx = context(&mock).await;
        mock.clear_requests();

        let mut lookup = PledgeLookup::new(ctx);
        lookup
            .update(PledgeLookupMessage::PledgeIdChanged("one".to_owned()))
            .await;
        lookup.lookup().await;

        assert_eq!(
            lookup.status(),
            &FormStatus::Error(INVALID_PLEDGE_ID.to_owned())
        );
        assert!(mock.requests().is_empty());
    }
}
