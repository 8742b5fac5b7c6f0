// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all pluggable components implement.

use async_trait::async_trait;

use crate::error::AnketaError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for anketa adapters.
///
/// Every adapter (storage, channel, gateway) implements this trait, which
/// provides identity, health check, and shutdown capabilities.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the type of adapter (channel, storage, gateway).
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    ///
    /// Errors indicate the dependency is unreachable; callers decide
    /// whether that is fatal (it is at startup).
    async fn health_check(&self) -> Result<HealthStatus, AnketaError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), AnketaError>;
}
