// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook HTTP gateway for the anketa bot.
//!
//! A thin axum server with two routes: an unauthenticated `/healthz` and
//! the Telegram webhook endpoint `POST /webhook/{secret}`. The gateway
//! validates the path secret, deserializes the update, and forwards it to
//! the dispatcher over a bounded channel. It never does business logic.

pub mod handlers;
pub mod server;

pub use server::{build_router, start_server, GatewayState};
