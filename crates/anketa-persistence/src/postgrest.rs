// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PostgREST implementation of [`StateBackend`].
//!
//! Talks to a hosted Postgres service (Supabase) through its REST row API:
//! `GET/POST/DELETE {url}/rest/v1/{table}`. Rows are `(id, data)` with `id`
//! as the primary key; upserts use `Prefer: resolution=merge-duplicates` so
//! writes are idempotent and last-writer-wins.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::trace;

use anketa_config::model::BackendConfig;
use anketa_core::traits::backend::{StateBackend, StateRow};
use anketa_core::AnketaError;

/// Reqwest-based client for the remote state table.
pub struct PostgrestBackend {
    http: Client,
    endpoint: String,
    service_key: String,
}

impl PostgrestBackend {
    /// Create a backend from configuration.
    ///
    /// Requires `backend.url` and `backend.service_key` to be set.
    pub fn new(config: &BackendConfig) -> Result<Self, AnketaError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| AnketaError::Config("backend.url is required".into()))?;
        let service_key = config
            .service_key
            .as_deref()
            .ok_or_else(|| AnketaError::Config("backend.service_key is required".into()))?;

        if service_key.is_empty() {
            return Err(AnketaError::Config(
                "backend.service_key cannot be empty".into(),
            ));
        }

        let endpoint = format!("{}/rest/v1/{}", url.trim_end_matches('/'), config.table);
        Ok(Self {
            http: Client::new(),
            endpoint,
            service_key: service_key.to_string(),
        })
    }

    /// Attach the `apikey` and bearer auth headers Supabase expects.
    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    /// Map a non-success response into a backend error with a body excerpt.
    async fn check_status(response: Response, what: &str) -> Result<Response, AnketaError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let excerpt: String = body.chars().take(200).collect();
        Err(AnketaError::backend_msg(format!(
            "{what} returned {status}: {excerpt}"
        )))
    }
}

#[async_trait]
impl StateBackend for PostgrestBackend {
    async fn select_rows(&self, ids: &[String]) -> Result<Vec<StateRow>, AnketaError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // PostgREST `in.` lists need each value double-quoted because row
        // ids contain `:`.
        let quoted: Vec<String> = ids.iter().map(|id| format!("\"{id}\"")).collect();
        let filter = format!("in.({})", quoted.join(","));

        trace!(filter = filter.as_str(), "selecting state rows");
        let response = self
            .authed(self.http.get(&self.endpoint))
            .query(&[("select", "id,data"), ("id", filter.as_str())])
            .send()
            .await
            .map_err(|e| AnketaError::backend("select request failed", e))?;

        let response = Self::check_status(response, "select").await?;
        response
            .json::<Vec<StateRow>>()
            .await
            .map_err(|e| AnketaError::backend("select returned unparseable body", e))
    }

    async fn upsert_rows(&self, rows: Vec<StateRow>) -> Result<(), AnketaError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=minimal"),
        );

        trace!(rows = rows.len(), "upserting state rows");
        let response = self
            .authed(self.http.post(&self.endpoint))
            .headers(headers)
            .json(&rows)
            .send()
            .await
            .map_err(|e| AnketaError::backend("upsert request failed", e))?;

        Self::check_status(response, "upsert").await?;
        Ok(())
    }

    async fn delete_row(&self, id: &str) -> Result<(), AnketaError> {
        let response = self
            .authed(self.http.delete(&self.endpoint))
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await
            .map_err(|e| AnketaError::backend("delete request failed", e))?;

        // PostgREST answers 200/204 whether or not the row existed, so
        // idempotency comes for free; 404 here means the table is missing.
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AnketaError::backend_msg("delete returned 404: table not found"));
        }
        Self::check_status(response, "delete").await?;
        Ok(())
    }
}
