// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row-level interface to the remote state table.
//!
//! The persistence store depends only on this capability set -- select by
//! id, upsert, delete -- never on a concrete HTTP client type. Production
//! uses the PostgREST implementation; tests use an in-memory mock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnketaError;

/// One row of the remote state table: an opaque id and a JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRow {
    pub id: String,
    pub data: serde_json::Value,
}

impl StateRow {
    pub fn new(id: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Adapter for the remote `(id, data)` row store.
#[async_trait]
pub trait StateBackend: Send + Sync + 'static {
    /// Fetches the rows whose ids are in `ids`. Missing ids are simply
    /// absent from the result; only transport/protocol failures error.
    async fn select_rows(&self, ids: &[String]) -> Result<Vec<StateRow>, AnketaError>;

    /// Upserts the given rows; last writer wins per row id.
    async fn upsert_rows(&self, rows: Vec<StateRow>) -> Result<(), AnketaError>;

    /// Deletes a row by id. Deleting a non-existent row is not an error.
    async fn delete_row(&self, id: &str) -> Result<(), AnketaError>;
}
