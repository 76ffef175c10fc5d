// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use criticalmoney::settings::{Settings, SETTINGS};
use criticalmoney::views::{parse_command, App, Message};
use criticalmoney::wallet::Provider;
use log::*;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Builder;
use tracing_subscriber::prelude::*;

fn main() -> anyhow::Result<()> {
    let runtime = Builder::new_multi_thread()
        .worker_threads(2)
        .enable_io()
        .enable_time()
        .build()?;

    runtime.block_on(run())
}

async fn run() -> anyhow::Result<()> {
    init_tracing()?;

    let settings: Settings = SETTINGS.clone();
    settings
        .validate()
        .map_err(|err| anyhow::anyhow!("invalid configuration: {err}"))?;

    info!(
        "Running Critical Money v{} against {}",
        env!("CARGO_PKG_VERSION"),
        settings.chain.chain_name
    );

    let provider = detect_wallet(&settings).await;
    let mut app = App::start(provider, settings).await?;
    print_lines(&app.render());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let messages = match parse_command(&line) {
            Ok(messages) => messages,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        let mut show_help = false;
        for message in messages {
            if matches!(message, Message::Help) {
                show_help = true;
            }
            if !app.update(message).await? {
                return Ok(());
            }
        }

        app.refresh();
        if show_help {
            print_lines(&app.help());
        } else {
            print_lines(&app.render());
        }
    }

    Ok(())
}

#[cfg(feature = "http-provider")]
async fn detect_wallet(settings: &Settings) -> Option<Arc<dyn Provider>> {
    use criticalmoney::wallet::http::HttpProvider;

    HttpProvider::detect(
        &settings.client.wallet_endpoint,
        settings.client.notification_poll(),
    )
    .await
    .map(|provider| provider as Arc<dyn Provider>)
}

#[cfg(not(feature = "http-provider"))]
async fn detect_wallet(_settings: &Settings) -> Option<Arc<dyn Provider>> {
    warn!("Built without a wallet provider");
    None
}

fn print_lines(lines: &[String]) {
    println!();
    for line in lines {
        println!("{line}");
    }
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Logs go to stderr so they do not interleave with the rendered page.
fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}
