// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use super::{tab_bar, Tab};
use crate::forms::amortize_pledge::{AmortizePledgeForm, AmortizePledgeMessage};
use crate::forms::pledge_lookup::{PledgeLookup, PledgeLookupMessage};
use crate::forms::register_pledge::{RegisterPledgeForm, RegisterPledgeMessage};
use crate::forms::FormContext;
use crate::guard::NetworkGuard;
use crate::wallet::short_address;
use log::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PledgeTab {
    #[default]
    Register,
    Pay,
}

#[derive(Clone, Debug)]
pub enum PledgePlatformMessage {
    TabSelected(PledgeTab),
    Register(RegisterPledgeMessage),
    Amortize(AmortizePledgeMessage),
    Lookup(PledgeLookupMessage),
}

impl Tab for RegisterPledgeForm {
    fn tab_label(&self) -> &'static str {
        "Register Pledge"
    }

    fn content(&self) -> Vec<String> {
        self.render()
    }
}

impl Tab for AmortizePledgeForm {
    fn tab_label(&self) -> &'static str {
        "Pay Pledge"
    }

    fn content(&self) -> Vec<String> {
        self.render()
    }
}

/// Pledge platform flow: register and pay tabs plus a pledge lookup, behind
/// the network guard.
pub struct PledgePlatform {
    ctx: FormContext,
    guard: NetworkGuard,
    active_tab: PledgeTab,
    register: RegisterPledgeForm,
    amortize: AmortizePledgeForm,
    lookup: PledgeLookup,
}

impl PledgePlatform {
    pub fn new(ctx: FormContext, guard: NetworkGuard) -> Self {
        Self {
            register: RegisterPledgeForm::new(ctx.clone()),
            amortize: AmortizePledgeForm::new(ctx.clone()),
            lookup: PledgeLookup::new(ctx.clone()),
            ctx,
            guard,
            active_tab: PledgeTab::default(),
        }
    }

    pub fn active_tab(&self) -> PledgeTab {
        self.active_tab
    }

    pub fn guard(&self) -> &NetworkGuard {
        &self.guard
    }

    pub fn guard_mut(&mut self) -> &mut NetworkGuard {
        &mut self.guard
    }

    pub async fn update(&mut self, message: PledgePlatformMessage) {
        if !self.guard.is_ready() {
            debug!("Ignoring {:?}, wrong network", message);
            return;
        }

        match message {
            PledgePlatformMessage::TabSelected(tab) => self.active_tab = tab,
            PledgePlatformMessage::Register(message) => self.register.update(message).await,
            PledgePlatformMessage::Amortize(message) => self.amortize.update(message).await,
            PledgePlatformMessage::Lookup(message) => self.lookup.update(message).await,
        }
    }

    pub fn render(&self) -> Vec<String> {
        if !self.guard.is_ready() {
            return self.guard.render();
        }

        let session = self.ctx.wallet.session();
        let mut lines = vec![
            "Pledge Platform".to_owned(),
            format!(
                "Account: {}",
                session
                    .account
                    .as_ref()
                    .map(short_address)
                    .unwrap_or_default()
            ),
            format!("Chain: {}", self.ctx.wallet.chain().label(session.chain_id)),
            String::new(),
        ];

        let tabs: [&dyn Tab; 2] = [&self.register, &self.amortize];
        let active = match self.active_tab {
            PledgeTab::Register => 0,
            PledgeTab::Pay => 1,
        };
        lines.push(tab_bar(&tabs, active));
        lines.extend(tabs[active].content());

        lines.push(String::new());
        lines.extend(self.lookup.render());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::test_util::*;
    use crate::forms::FormStatus;
    use crate::wallet::mock::*;
    use std::time::Duration;

    fn platform(ctx: FormContext) -> PledgePlatform {
        let guard = NetworkGuard::new(ctx.wallet.clone(), Duration::from_millis(1000));
        PledgePlatform::new(ctx, guard)
    }

    #[tokio::test]
    async fn renders_session_and_active_tab() {
        let mock = MockProvider::authorized(ALICE, 421614);
        let ctx = context(&mock).await;
        let mut platform = platform(ctx);

        platform
            .update(PledgePlatformMessage::TabSelected(PledgeTab::Pay))
            .await;
        let lines = platform.render();
        assert_eq!(lines[1], "Account: 0x906e...0e23");
        assert_eq!(lines[2], "Chain: Arbitrum Sepolia");
        assert!(lines.contains(&"Register Pledge | [Pay Pledge]".to_owned()));
        assert!(lines.contains(&"[Pay Pledge]".to_owned()));
    }

    #[tokio::test]
    async fn routes_form_messages() {
        let mock = MockProvider::authorized(ALICE, 421614);
        mock.on_request(|method, _| confirm_all(method));
        let ctx = context(&mock).await;
        let mut platform = platform(ctx);

        for message in [
            RegisterPledgeMessage::PledgorChanged(BOB.to_string()),
            RegisterPledgeMessage::OuncesChanged("3".to_owned()),
            RegisterPledgeMessage::SpreadChanged("4".to_owned()),
            RegisterPledgeMessage::Submit,
        ] {
            platform
                .update(PledgePlatformMessage::Register(message))
                .await;
        }

        assert!(matches!(platform.register.status(), FormStatus::Success(_)));
        assert_eq!(sent(&mock).len(), 1);
    }

    #[tokio::test]
    async fn wrong_network_shows_only_the_guard() {
        let mock = MockProvider::authorized(ALICE, 5);
        let ctx = context(&mock).await;
        let platform = platform(ctx);

        let lines = platform.render();
        assert_eq!(lines, platform.guard().render());
        assert!(!lines.iter().any(|line| line.contains("Register Pledge")));
    }
}
