// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use super::{tab_bar, Tab};
use crate::forms::account_info::AccountInfo;
use crate::forms::lend::{LendForm, LendMessage};
use crate::forms::rewards::{RewardsForm, RewardsMessage};
use crate::forms::withdraw::{WithdrawForm, WithdrawMessage};
use crate::forms::FormContext;
use crate::guard::NetworkGuard;
use log::*;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DashboardTab {
    #[default]
    Lend,
    Withdraw,
    Rewards,
}

#[derive(Clone, Debug)]
pub enum DashboardMessage {
    TabSelected(DashboardTab),
    Lend(LendMessage),
    Withdraw(WithdrawMessage),
    Rewards(RewardsMessage),
}

impl Tab for LendForm {
    fn tab_label(&self) -> &'static str {
        "Lend USDC"
    }

    fn content(&self) -> Vec<String> {
        self.render()
    }
}

impl Tab for WithdrawForm {
    fn tab_label(&self) -> &'static str {
        "Withdraw"
    }

    fn content(&self) -> Vec<String> {
        self.render()
    }
}

impl Tab for RewardsForm {
    fn tab_label(&self) -> &'static str {
        "Rewards"
    }

    fn content(&self) -> Vec<String> {
        self.render()
    }
}

/// Lending pool flow: balances, then lend / withdraw / rewards tabs, all
/// behind the network guard.
pub struct LendingDashboard {
    ctx: FormContext,
    guard: NetworkGuard,
    active_tab: DashboardTab,
    lend: LendForm,
    withdraw: WithdrawForm,
    rewards: RewardsForm,
    account_info: Option<AccountInfo>,
    balance_poll: Duration,
}

impl LendingDashboard {
    pub fn new(ctx: FormContext, guard: NetworkGuard, balance_poll: Duration) -> Self {
        Self {
            lend: LendForm::new(ctx.clone()),
            withdraw: WithdrawForm::new(ctx.clone()),
            rewards: RewardsForm::new(ctx.clone()),
            ctx,
            guard,
            active_tab: DashboardTab::default(),
            account_info: None,
            balance_poll,
        }
    }

    pub fn active_tab(&self) -> DashboardTab {
        self.active_tab
    }

    pub fn guard(&self) -> &NetworkGuard {
        &self.guard
    }

    pub fn guard_mut(&mut self) -> &mut NetworkGuard {
        &mut self.guard
    }

    pub fn account_info(&self) -> Option<&AccountInfo> {
        self.account_info.as_ref()
    }

    pub async fn update(&mut self, message: DashboardMessage) {
        if !self.guard.is_ready() {
            debug!("Ignoring {:?}, wrong network", message);
            return;
        }

        match message {
            DashboardMessage::TabSelected(tab) => self.active_tab = tab,
            DashboardMessage::Lend(message) => self.lend.update(message).await,
            DashboardMessage::Withdraw(message) => self.withdraw.update(message).await,
            DashboardMessage::Rewards(message) => self.rewards.update(message).await,
        }
    }

    /// Keeps the balance poller in line with the session: one poller for the
    /// active account while the guard is satisfied, none otherwise.
    pub fn refresh(&mut self) {
        let wanted = self
            .ctx
            .wallet
            .session()
            .account
            .filter(|_| self.guard.is_ready());
        let current = self.account_info.as_ref().map(AccountInfo::account);

        if wanted == current {
            return;
        }

        // Drop the old poller before starting a new one
        self.account_info = None;

        if let Some(account) = wanted {
            match AccountInfo::spawn(
                &self.ctx.wallet,
                self.ctx.deployment.clone(),
                account,
                self.balance_poll,
            ) {
                Ok(info) => {
                    debug!("Polling balances of {}", account);
                    self.account_info = Some(info);
                }
                Err(err) => warn!("Cannot poll balances: {}", err),
            }
        }
    }

    /// Stops background work.
    pub fn teardown(&mut self) {
        self.account_info = None;
    }

    pub fn render(&self) -> Vec<String> {
        if !self.guard.is_ready() {
            return self.guard.render();
        }

        let mut lines = self
            .account_info
            .as_ref()
            .map(AccountInfo::render)
            .unwrap_or_default();

        let tabs: [&dyn Tab; 3] = [&self.lend, &self.withdraw, &self.rewards];
        let active = match self.active_tab {
            DashboardTab::Lend => 0,
            DashboardTab::Withdraw => 1,
            DashboardTab::Rewards => 2,
        };

        lines.push(String::new());
        lines.push(tab_bar(&tabs, active));
        lines.extend(tabs[active].content());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::test_util::context;
    use crate::forms::FormStatus;
    use crate::wallet::mock::*;
    use crate::wallet::ProviderEvent;
    use tokio::time::sleep;

    fn dashboard(ctx: FormContext) -> LendingDashboard {
        let guard = NetworkGuard::new(ctx.wallet.clone(), Duration::from_millis(1000));
        LendingDashboard::new(ctx, guard, Duration::from_millis(5000))
    }

    #[tokio::test(start_paused = true)]
    async fn ready_dashboard_polls_and_renders_tabs() {
        let mock = MockProvider::authorized(ALICE, 421614);
        let ctx = context(&mock).await;
        let mut dashboard = dashboard(ctx);

        dashboard.refresh();
        assert_eq!(dashboard.account_info().map(AccountInfo::account), Some(ALICE));

        dashboard
            .update(DashboardMessage::TabSelected(DashboardTab::Rewards))
            .await;
        let lines = dashboard.render();
        assert!(lines.contains(&"Lend USDC | Withdraw | [Rewards]".to_owned()));
        assert!(lines.contains(&"[Claim Rewards]".to_owned()));

        dashboard.teardown();
        let calls = mock.count("eth_call");
        sleep(Duration::from_millis(20_000)).await;
        assert_eq!(mock.count("eth_call"), calls);
    }

    #[tokio::test]
    async fn wrong_network_blocks_forms_and_polling() {
        let mock = MockProvider::authorized(ALICE, 1);
        let ctx = context(&mock).await;
        let mut dashboard = dashboard(ctx);

        dashboard.refresh();
        assert!(dashboard.account_info().is_none());

        dashboard
            .update(DashboardMessage::Lend(LendMessage::AmountChanged("5".to_owned())))
            .await;
        dashboard
            .update(DashboardMessage::Lend(LendMessage::Submit))
            .await;
        assert_eq!(dashboard.lend.status(), &FormStatus::Idle);
        assert_eq!(dashboard.render()[0], "Wrong Network");
    }

    #[tokio::test(start_paused = true)]
    async fn account_change_restarts_poller() {
        let mock = MockProvider::authorized(ALICE, 421614);
        let ctx = context(&mock).await;
        let wallet = ctx.wallet.clone();
        let mut dashboard = dashboard(ctx);
        let _listener = wallet.listen().unwrap();

        dashboard.refresh();
        assert_eq!(dashboard.account_info().map(AccountInfo::account), Some(ALICE));

        mock.emit(ProviderEvent::AccountsChanged(vec![BOB]));
        sleep(Duration::from_millis(1)).await;
        dashboard.refresh();
        assert_eq!(dashboard.account_info().map(AccountInfo::account), Some(BOB));

        mock.emit(ProviderEvent::AccountsChanged(vec![]));
        sleep(Duration::from_millis(1)).await;
        dashboard.refresh();
        assert!(dashboard.account_info().is_none());
    }
}
