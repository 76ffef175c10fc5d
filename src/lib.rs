// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! # Critical Money
//! Client for the Critical Money lending pool and pledge platform on Arbitrum Sepolia.
//!
//! ## Features
//! * **Lending pool**: Lend USDC to the pool, withdraw it again and claim the rewards it accrued.
//! * **Pledge platform**: Register pledges that tokenize metal collateral for a pledgor and pay them down over time.
//! * **Wallet agnostic**: Everything goes through an EIP-1193 style [`wallet::Provider`]. The shipped provider talks
//!   JSON-RPC over HTTP to a local wallet bridge, tests use an in-memory one.
//!
//! The contracts hold all the state. This crate validates input, converts human amounts into token units,
//! submits calls through the connected wallet and reports what happened.
//!
//! ## Layout
//! * [`wallet`] wallet provider abstraction and the session it keeps in sync.
//! * [`executor`] bounded retry around transaction submission.
//! * [`contracts`] ABIs, deployment addresses, reads and writes.
//! * [`guard`] required network check and the switch/add chain flow.
//! * [`forms`] one module per user action plus the account balance poller.
//! * [`views`] dashboards and the two page shells.

pub mod chain;
pub mod contracts;
pub mod error;
pub mod executor;
pub mod forms;
pub mod guard;
pub mod settings;
pub mod units;
pub mod views;
pub mod wallet;

pub use error::ClientError;
