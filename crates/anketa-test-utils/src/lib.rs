// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test doubles for the anketa workspace.
//!
//! Currently provides [`MockBackend`], an in-memory `StateBackend` with a
//! switchable outage mode for exercising the persistence store's failure
//! paths without a network.

pub mod mock_backend;

pub use mock_backend::MockBackend;
