// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock state backend for deterministic testing.
//!
//! `MockBackend` implements `StateBackend` over an in-memory row map, with a
//! switchable outage mode so tests can simulate the remote table going away
//! mid-run and coming back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use anketa_core::traits::backend::{StateBackend, StateRow};
use anketa_core::AnketaError;

/// An in-memory `(id, data)` row table for tests.
#[derive(Default)]
pub struct MockBackend {
    rows: Mutex<HashMap<String, serde_json::Value>>,
    failing: AtomicBool,
    write_count: AtomicUsize,
}

impl MockBackend {
    /// Create an empty mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle outage mode. While failing, every backend call errors.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Seed a row directly, bypassing the trait.
    pub async fn seed_row(&self, id: impl Into<String>, data: serde_json::Value) {
        self.rows.lock().await.insert(id.into(), data);
    }

    /// Read a row's payload directly, bypassing the trait.
    pub async fn row(&self, id: &str) -> Option<serde_json::Value> {
        self.rows.lock().await.get(id).cloned()
    }

    /// Number of rows currently stored.
    pub async fn row_count(&self) -> usize {
        self.rows.lock().await.len()
    }

    /// Number of successful upsert calls so far.
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    fn check_up(&self) -> Result<(), AnketaError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(AnketaError::backend_msg("simulated backend outage"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StateBackend for MockBackend {
    async fn select_rows(&self, ids: &[String]) -> Result<Vec<StateRow>, AnketaError> {
        self.check_up()?;
        let rows = self.rows.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| rows.get(id).map(|data| StateRow::new(id.clone(), data.clone())))
            .collect())
    }

    async fn upsert_rows(&self, new_rows: Vec<StateRow>) -> Result<(), AnketaError> {
        self.check_up()?;
        let mut rows = self.rows.lock().await;
        for row in new_rows {
            rows.insert(row.id, row.data);
        }
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_row(&self, id: &str) -> Result<(), AnketaError> {
        self.check_up()?;
        self.rows.lock().await.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_then_select_round_trips() {
        let backend = MockBackend::new();
        backend
            .upsert_rows(vec![StateRow::new("a", serde_json::json!({"x": 1}))])
            .await
            .unwrap();

        let rows = backend.select_rows(&["a".to_string()]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].data["x"], 1);
    }

    #[tokio::test]
    async fn select_skips_missing_ids() {
        let backend = MockBackend::new();
        backend.seed_row("present", serde_json::json!({})).await;

        let rows = backend
            .select_rows(&["present".to_string(), "absent".to_string()])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "present");
    }

    #[tokio::test]
    async fn outage_mode_fails_every_call() {
        let backend = MockBackend::new();
        backend.set_failing(true);

        assert!(backend.select_rows(&["a".to_string()]).await.is_err());
        assert!(backend.upsert_rows(vec![]).await.is_err());
        assert!(backend.delete_row("a").await.is_err());

        backend.set_failing(false);
        assert!(backend.delete_row("a").await.is_ok());
    }

    #[tokio::test]
    async fn delete_missing_row_is_not_an_error() {
        let backend = MockBackend::new();
        assert!(backend.delete_row("never-existed").await.is_ok());
    }
}
