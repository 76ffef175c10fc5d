// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Headless views. Each view owns its forms, reacts to [`Message`]s and
//! renders itself as lines of text.

use crate::forms::amortize_pledge::AmortizePledgeMessage;
use crate::forms::lend::LendMessage;
use crate::forms::pledge_lookup::PledgeLookupMessage;
use crate::forms::register_pledge::RegisterPledgeMessage;
use crate::forms::rewards::RewardsMessage;
use crate::forms::withdraw::WithdrawMessage;

pub mod dashboard;
pub mod pages;
pub mod pledge_platform;

pub use dashboard::{DashboardMessage, DashboardTab, LendingDashboard};
pub use pages::{App, Page, PageKind};
pub use pledge_platform::{PledgePlatform, PledgePlatformMessage, PledgeTab};

pub const APP_TITLE: &str = "Critical Money";

pub trait Tab {
    fn tab_label(&self) -> &'static str;

    fn content(&self) -> Vec<String>;
}

/// `Lend USDC | [Withdraw] | Rewards` with the active tab in brackets.
pub fn tab_bar(tabs: &[&dyn Tab], active: usize) -> String {
    tabs.iter()
        .enumerate()
        .map(|(i, tab)| {
            if i == active {
                format!("[{}]", tab.tab_label())
            } else {
                tab.tab_label().to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

#[derive(Clone, Debug)]
pub enum Message {
    Goto(PageKind),
    Connect,
    Disconnect,
    SwitchNetwork,
    Lending(DashboardMessage),
    Pledge(PledgePlatformMessage),
    Show,
    Help,
    Quit,
}

pub const HELP: &[&str] = &[
    "goto lend|pledge                    open the lending pool or the pledge platform",
    "connect | disconnect                connect or forget the wallet account",
    "switch                              switch the wallet to the required network",
    "tab lend|withdraw|rewards|register|pay",
    "lend <amount> | withdraw <amount>   lending pool actions",
    "claim                               claim lending rewards",
    "register <pledgor> <ounces> <spread>",
    "pay <pledge-id> <amount>            pay down a pledge",
    "pledge <id>                         show a pledge",
    "show | help | quit",
];

/// Translates one shell line into the messages a user would produce by
/// clicking through the page: select the tab, fill the fields, submit.
pub fn parse_command(line: &str) -> Result<Vec<Message>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(vec![]);
    };
    let args: Vec<&str> = words.collect();

    let expect = |count: usize, usage: &str| {
        if args.len() == count {
            Ok(())
        } else {
            Err(format!("usage: {usage}"))
        }
    };

    use DashboardMessage as D;
    use PledgePlatformMessage as P;

    let messages = match command {
        "goto" => {
            expect(1, "goto lend|pledge")?;
            match args[0] {
                "lend" | "lending" => vec![Message::Goto(PageKind::Lending)],
                "pledge" | "pledgee" => vec![Message::Goto(PageKind::Pledge)],
                other => return Err(format!("unknown page {other}")),
            }
        }
        "connect" => vec![Message::Connect],
        "disconnect" => vec![Message::Disconnect],
        "switch" => vec![Message::SwitchNetwork],
        "show" => vec![Message::Show],
        "help" => vec![Message::Help],
        "quit" | "exit" => vec![Message::Quit],
        "tab" => {
            expect(1, "tab lend|withdraw|rewards|register|pay")?;
            vec![match args[0] {
                "lend" => Message::Lending(D::TabSelected(DashboardTab::Lend)),
                "withdraw" => Message::Lending(D::TabSelected(DashboardTab::Withdraw)),
                "rewards" => Message::Lending(D::TabSelected(DashboardTab::Rewards)),
                "register" => Message::Pledge(P::TabSelected(PledgeTab::Register)),
                "pay" => Message::Pledge(P::TabSelected(PledgeTab::Pay)),
                other => return Err(format!("unknown tab {other}")),
            }]
        }
        "lend" => {
            expect(1, "lend <amount>")?;
            vec![
                Message::Lending(D::TabSelected(DashboardTab::Lend)),
                Message::Lending(D::Lend(LendMessage::AmountChanged(args[0].to_owned()))),
                Message::Lending(D::Lend(LendMessage::Submit)),
            ]
        }
        "withdraw" => {
            expect(1, "withdraw <amount>")?;
            vec![
                Message::Lending(D::TabSelected(DashboardTab::Withdraw)),
                Message::Lending(D::Withdraw(WithdrawMessage::AmountChanged(
                    args[0].to_owned(),
                ))),
                Message::Lending(D::Withdraw(WithdrawMessage::Submit)),
            ]
        }
        "claim" => vec![
            Message::Lending(D::TabSelected(DashboardTab::Rewards)),
            Message::Lending(D::Rewards(RewardsMessage::Claim)),
        ],
        "register" => {
            expect(3, "register <pledgor> <ounces> <spread>")?;
            vec![
                Message::Pledge(P::TabSelected(PledgeTab::Register)),
                Message::Pledge(P::Register(RegisterPledgeMessage::PledgorChanged(
                    args[0].to_owned(),
                ))),
                Message::Pledge(P::Register(RegisterPledgeMessage::OuncesChanged(
                    args[1].to_owned(),
                ))),
                Message::Pledge(P::Register(RegisterPledgeMessage::SpreadChanged(
                    args[2].to_owned(),
                ))),
                Message::Pledge(P::Register(RegisterPledgeMessage::Submit)),
            ]
        }
        "pay" => {
            expect(2, "pay <pledge-id> <amount>")?;
            vec![
                Message::Pledge(P::TabSelected(PledgeTab::Pay)),
                Message::Pledge(P::Amortize(AmortizePledgeMessage::PledgeIdChanged(
                    args[0].to_owned(),
                ))),
                Message::Pledge(P::Amortize(AmortizePledgeMessage::AmountChanged(
                    args[1].to_owned(),
                ))),
                Message::Pledge(P::Amortize(AmortizePledgeMessage::Submit)),
            ]
        }
        "pledge" => {
            expect(1, "pledge <id>")?;
            vec![
                Message::Pledge(P::Lookup(PledgeLookupMessage::PledgeIdChanged(
                    args[0].to_owned(),
                ))),
                Message::Pledge(P::Lookup(PledgeLookupMessage::Lookup)),
            ]
        }
        other => return Err(format!("unknown command {other}, try help")),
    };

    Ok(messages)
}
