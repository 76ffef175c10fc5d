// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use super::{LendingDashboard, Message, PledgePlatform, APP_TITLE, HELP};
use crate::chain::ChainParams;
use crate::error::ClientError;
use crate::forms::FormContext;
use crate::guard::NetworkGuard;
use crate::settings::Settings;
use crate::wallet::{Provider, Subscription, WalletAdapter};
use log::*;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageKind {
    Lending,
    Pledge,
}

enum Body {
    Lending(LendingDashboard),
    Pledge(PledgePlatform),
}

/// Top level page. Owns its own wallet session, detects the wallet on mount
/// and listens to it until unmounted.
pub struct Page {
    kind: PageKind,
    wallet: WalletAdapter,
    body: Body,
    subscription: Option<Subscription>,
    mounted: bool,
    connecting_error: Option<String>,
}

impl Page {
    pub fn new(
        kind: PageKind,
        provider: Option<Arc<dyn Provider>>,
        settings: &Settings,
    ) -> Result<Self, ClientError> {
        let wallet = WalletAdapter::new(provider, ChainParams::from_settings(settings));
        let ctx = FormContext::from_settings(wallet.clone(), settings)?;
        let guard = NetworkGuard::from_settings(wallet.clone(), settings);

        let body = match kind {
            PageKind::Lending => Body::Lending(LendingDashboard::new(
                ctx,
                guard,
                settings.client.balance_poll(),
            )),
            PageKind::Pledge => Body::Pledge(PledgePlatform::new(ctx, guard)),
        };

        Ok(Self {
            kind,
            wallet,
            body,
            subscription: None,
            mounted: false,
            connecting_error: None,
        })
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }

    pub fn wallet(&self) -> &WalletAdapter {
        &self.wallet
    }

    pub fn is_listening(&self) -> bool {
        self.subscription
            .as_ref()
            .map(Subscription::is_active)
            .unwrap_or(false)
    }

    /// Reads the existing session without prompting and starts listening to
    /// wallet notifications. A missing wallet is not an error here, the page
    /// renders the connect prompt instead.
    pub async fn mount(&mut self) {
        if self.wallet.is_installed() {
            // Subscribe first so no change after the initial read goes unseen
            match self.wallet.listen() {
                Ok(subscription) => self.subscription = Some(subscription),
                Err(err) => warn!("Not listening to wallet events: {}", err),
            }

            if let Err(err) = self.wallet.init().await {
                error!("Error checking wallet: {}", err);
            }
        }

        self.mounted = true;
        self.refresh();
    }

    /// Stops the listener and the balance poller.
    pub fn unmount(&mut self) {
        self.subscription = None;
        if let Body::Lending(dashboard) = &mut self.body {
            dashboard.teardown();
        }
        self.mounted = false;
    }

    pub async fn connect(&mut self) {
        self.connecting_error = None;

        match self.wallet.connect().await {
            Ok(_) => {
                // The switch may have happened before the chainChanged
                // notification reached us
                match self.wallet.read_chain_id().await {
                    Ok(chain_id) => self.wallet.set_chain_id(chain_id),
                    Err(err) => warn!("Could not read chain id: {}", err),
                }
            }
            Err(err) => {
                error!("Error connecting wallet: {}", err);
                self.connecting_error = Some(err.to_string());
            }
        }

        self.refresh();
    }

    pub fn disconnect(&mut self) {
        self.wallet.disconnect();
        self.refresh();
    }

    pub async fn update(&mut self, message: Message) {
        match message {
            Message::Connect => self.connect().await,
            Message::Disconnect => self.disconnect(),
            Message::SwitchNetwork => {
                let guard = match &mut self.body {
                    Body::Lending(dashboard) => dashboard.guard_mut(),
                    Body::Pledge(platform) => platform.guard_mut(),
                };
                if let Err(err) = guard.switch().await {
                    debug!("Network switch failed: {}", err);
                }
            }
            Message::Lending(message) => match &mut self.body {
                Body::Lending(dashboard) => dashboard.update(message).await,
                Body::Pledge(_) => info!("Open the lending pool first (goto lend)"),
            },
            Message::Pledge(message) => match &mut self.body {
                Body::Pledge(platform) => platform.update(message).await,
                Body::Lending(_) => info!("Open the pledge platform first (goto pledge)"),
            },
            Message::Goto(_) | Message::Show | Message::Help | Message::Quit => {}
        }

        self.refresh();
    }

    /// Applies session changes made by wallet notifications.
    pub fn refresh(&mut self) {
        if let Body::Lending(dashboard) = &mut self.body {
            if self.mounted {
                dashboard.refresh();
            }
        }
    }

    fn header(&self) -> Vec<String> {
        let session = self.wallet.session();
        let mut lines = vec![APP_TITLE.to_owned()];

        if let Some(account) = session.short_account() {
            lines.push(format!(
                "Account: {} | Chain: {}",
                account,
                self.wallet.chain().label(session.chain_id)
            ));
        }

        let mut nav = "Lending Pool | Pledge Platform".to_owned();
        if session.is_connected() {
            nav.push_str(" | [Disconnect]");
        }
        lines.push(nav);
        lines.push(String::new());
        lines
    }

    fn connect_prompt(&self) -> Vec<String> {
        let mut lines = vec![
            "Connect your wallet to get started".to_owned(),
            format!(
                "You will be prompted to switch to {}",
                self.wallet.chain().chain_name
            ),
            "[Connect Wallet]".to_owned(),
        ];

        let error = if !self.wallet.is_installed() {
            Some(ClientError::WalletNotFound.to_string())
        } else {
            self.connecting_error.clone()
        };
        if let Some(error) = error {
            lines.push(format!("Error: {error}"));
        }
        lines
    }

    pub fn render(&self) -> Vec<String> {
        if !self.mounted {
            return vec!["Initializing...".to_owned()];
        }

        let mut lines = self.header();

        if !self.wallet.session().is_connected() {
            lines.extend(self.connect_prompt());
            return lines;
        }

        lines.extend(match &self.body {
            Body::Lending(dashboard) => dashboard.render(),
            Body::Pledge(platform) => platform.render(),
        });
        lines
    }
}

/// Both pages and the navigation between them.
pub struct App {
    provider: Option<Arc<dyn Provider>>,
    settings: Settings,
    page: Page,
}

impl App {
    pub async fn start(
        provider: Option<Arc<dyn Provider>>,
        settings: Settings,
    ) -> Result<Self, ClientError> {
        let mut page = Page::new(PageKind::Lending, provider.clone(), &settings)?;
        page.mount().await;

        Ok(Self {
            provider,
            settings,
            page,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Handles one message. Returns false once the user asked to quit.
    pub async fn update(&mut self, message: Message) -> Result<bool, ClientError> {
        match message {
            Message::Quit => {
                self.page.unmount();
                return Ok(false);
            }
            Message::Goto(kind) => {
                if kind != self.page.kind() {
                    self.page.unmount();
                    self.page = Page::new(kind, self.provider.clone(), &self.settings)?;
                    self.page.mount().await;
                }
            }
            message => self.page.update(message).await,
        }

        Ok(true)
    }

    pub fn refresh(&mut self) {
        self.page.refresh();
    }

    pub fn help(&self) -> Vec<String> {
        HELP.iter().map(|line| (*line).to_owned()).collect()
    }

    pub fn render(&self) -> Vec<String> {
        self.page.render()
    }
}
