// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The persistence store: five cached record kinds mirrored to the backend.
//!
//! The store keeps one in-memory mapping per record kind and treats the
//! remote table as the source of truth only during [`StateStore::load_all`];
//! afterwards the cache is authoritative for reads. Mutations are mirrored
//! to the backend synchronously (write-through) or deferred to `flush()`
//! (write-back), selected by a single configuration knob.
//!
//! Mid-run backend errors never propagate to message handling: a failed
//! write leaves the kind dirty and the next flush retries it. Startup-time
//! errors (`load_all`, the health probe) do propagate, so the process fails
//! fast instead of serving empty state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use anketa_config::model::{BackendConfig, PersistenceConfig};
use anketa_config::WritePolicy;
use anketa_core::traits::backend::{StateBackend, StateRow};
use anketa_core::{
    AdapterType, AnketaError, ConversationKey, HealthStatus, PluginAdapter, RecordKind, RecordMap,
    RecordRef,
};

use crate::convkey;

/// In-memory mirror of the five record kinds, plus dirty tracking.
#[derive(Default)]
struct StateCache {
    user_data: HashMap<i64, RecordMap>,
    chat_data: HashMap<i64, RecordMap>,
    bot_data: RecordMap,
    conversations: HashMap<String, HashMap<ConversationKey, Value>>,
    callback_data: RecordMap,
    dirty: HashSet<RecordKind>,
}

/// Durable store for user, chat, bot-wide, conversation, and callback-data
/// records, backed by a remote `(id, data)` row table.
pub struct StateStore {
    backend: Arc<dyn StateBackend>,
    prefix: String,
    policy: WritePolicy,
    cache: RwLock<StateCache>,
}

impl StateStore {
    /// Create a store over the given backend.
    ///
    /// The cache starts empty; call [`load_all`](Self::load_all) before
    /// serving traffic.
    pub fn new(
        backend: Arc<dyn StateBackend>,
        backend_config: &BackendConfig,
        persistence_config: &PersistenceConfig,
    ) -> Self {
        Self {
            backend,
            prefix: backend_config.prefix.clone(),
            policy: persistence_config.write_policy,
            cache: RwLock::new(StateCache::default()),
        }
    }

    /// The row id for a record kind, e.g. `main:user_data`.
    fn row_id(&self, kind: RecordKind) -> String {
        format!("{}:{kind}", self.prefix)
    }

    /// The configured write policy.
    pub fn write_policy(&self) -> WritePolicy {
        self.policy
    }

    // ---------- Record operations ----------

    /// Current value for a record; an empty mapping when none exists.
    pub async fn load(&self, rec: RecordRef) -> RecordMap {
        let cache = self.cache.read().await;
        match rec {
            RecordRef::User(id) => cache.user_data.get(&id).cloned().unwrap_or_default(),
            RecordRef::Chat(id) => cache.chat_data.get(&id).cloned().unwrap_or_default(),
            RecordRef::Bot => cache.bot_data.clone(),
            RecordRef::CallbackData => cache.callback_data.clone(),
        }
    }

    /// Idempotent upsert of one record; last writer wins.
    pub async fn save(&self, rec: RecordRef, data: RecordMap) {
        let row = {
            let mut cache = self.cache.write().await;
            match rec {
                RecordRef::User(id) => {
                    cache.user_data.insert(id, data);
                }
                RecordRef::Chat(id) => {
                    cache.chat_data.insert(id, data);
                }
                RecordRef::Bot => cache.bot_data = data,
                RecordRef::CallbackData => cache.callback_data = data,
            }
            cache.dirty.insert(rec.kind());
            encode_kind(&cache, rec.kind(), &self.prefix)
        };
        self.mirror(rec.kind(), row).await;
    }

    /// Remove one record. Removing an absent record is a no-op.
    pub async fn drop_record(&self, rec: RecordRef) {
        let row = {
            let mut cache = self.cache.write().await;
            match rec {
                RecordRef::User(id) => {
                    cache.user_data.remove(&id);
                }
                RecordRef::Chat(id) => {
                    cache.chat_data.remove(&id);
                }
                RecordRef::Bot => cache.bot_data.clear(),
                RecordRef::CallbackData => cache.callback_data.clear(),
            }
            cache.dirty.insert(rec.kind());
            encode_kind(&cache, rec.kind(), &self.prefix)
        };
        self.mirror(rec.kind(), row).await;
    }

    // ---------- Conversation operations ----------

    /// Full decoded table for one named conversation flow.
    pub async fn list_conversation_entries(
        &self,
        flow: &str,
    ) -> HashMap<ConversationKey, Value> {
        let cache = self.cache.read().await;
        cache.conversations.get(flow).cloned().unwrap_or_default()
    }

    /// State of one conversation slot, if a conversation is active there.
    pub async fn get_conversation_entry(
        &self,
        flow: &str,
        key: ConversationKey,
    ) -> Option<Value> {
        let cache = self.cache.read().await;
        cache
            .conversations
            .get(flow)
            .and_then(|table| table.get(&key))
            .cloned()
    }

    /// Upsert one conversation entry, or remove it when `state` is `None`,
    /// then persist the flow's whole table.
    pub async fn set_conversation_entry(
        &self,
        flow: &str,
        key: ConversationKey,
        state: Option<Value>,
    ) {
        let row = {
            let mut cache = self.cache.write().await;
            let table = cache.conversations.entry(flow.to_string()).or_default();
            match state {
                Some(state) => {
                    table.insert(key, state);
                }
                // Absent state means "conversation over": drop the entry
                // instead of storing a null.
                None => {
                    table.remove(&key);
                }
            }
            cache.dirty.insert(RecordKind::Conversations);
            encode_kind(&cache, RecordKind::Conversations, &self.prefix)
        };
        self.mirror(RecordKind::Conversations, row).await;
    }

    // ---------- Flush and startup load ----------

    /// Write every cached record kind to the backend.
    ///
    /// Backend failure is logged and swallowed; the dirty set is left
    /// intact so the next flush retries.
    pub async fn flush(&self) {
        let rows: Vec<StateRow> = {
            let cache = self.cache.read().await;
            RecordKind::ALL
                .iter()
                .map(|&kind| encode_kind(&cache, kind, &self.prefix))
                .collect()
        };
        match self.backend.upsert_rows(rows).await {
            Ok(()) => {
                self.cache.write().await.dirty.clear();
                debug!("flushed all record kinds");
            }
            Err(e) => {
                warn!(error = %e, "flush failed, keeping in-memory state for retry");
            }
        }
    }

    /// Record kinds with mutations not yet confirmed by the backend.
    pub async fn dirty_kinds(&self) -> Vec<RecordKind> {
        let cache = self.cache.read().await;
        let mut kinds: Vec<_> = cache.dirty.iter().copied().collect();
        kinds.sort_by_key(|k| k.to_string());
        kinds
    }

    /// Eagerly load all five record kinds from the backend.
    ///
    /// Transport failure is fatal: serving traffic with silently-empty state
    /// would corrupt user-visible behavior. A malformed row degrades to an
    /// empty record with a warning; an unparseable conversation key skips
    /// that entry only.
    pub async fn load_all(&self) -> Result<(), AnketaError> {
        let ids: Vec<String> = RecordKind::ALL.iter().map(|&k| self.row_id(k)).collect();
        let rows = self.backend.select_rows(&ids).await?;
        let mut by_id: HashMap<String, Value> =
            rows.into_iter().map(|row| (row.id, row.data)).collect();

        let mut cache = self.cache.write().await;
        cache.user_data =
            decode_keyed_maps(by_id.remove(&self.row_id(RecordKind::UserData)), "user_data");
        cache.chat_data =
            decode_keyed_maps(by_id.remove(&self.row_id(RecordKind::ChatData)), "chat_data");
        cache.bot_data =
            decode_map(by_id.remove(&self.row_id(RecordKind::BotData)), "bot_data");
        cache.conversations =
            decode_conversations(by_id.remove(&self.row_id(RecordKind::Conversations)));
        cache.callback_data = decode_map(
            by_id.remove(&self.row_id(RecordKind::CallbackData)),
            "callback_data",
        );
        cache.dirty.clear();

        info!(
            users = cache.user_data.len(),
            chats = cache.chat_data.len(),
            flows = cache.conversations.len(),
            "state loaded from backend"
        );
        Ok(())
    }

    /// One select + upsert + select + delete round-trip of a sentinel row,
    /// verifying backend reachability and table existence.
    pub async fn probe(&self) -> Result<(), AnketaError> {
        let probe_id = format!("{}:__healthcheck__", self.prefix);

        // Light select first: catches a missing table before writing.
        self.backend.select_rows(&[probe_id.clone()]).await?;

        self.backend
            .upsert_rows(vec![StateRow::new(
                probe_id.clone(),
                serde_json::json!({"ok": true}),
            )])
            .await?;
        let got = self.backend.select_rows(&[probe_id.clone()]).await?;
        if got.is_empty() {
            return Err(AnketaError::backend_msg(
                "health probe upsert succeeded but select returned no row",
            ));
        }

        if let Err(e) = self.backend.delete_row(&probe_id).await {
            warn!(error = %e, "health probe cleanup failed");
        }
        Ok(())
    }

    // ---------- Internals ----------

    /// Mirror one kind's row to the backend per the write policy.
    async fn mirror(&self, kind: RecordKind, row: StateRow) {
        match self.policy {
            WritePolicy::WriteThrough => match self.backend.upsert_rows(vec![row]).await {
                Ok(()) => {
                    self.cache.write().await.dirty.remove(&kind);
                }
                Err(e) => {
                    warn!(%kind, error = %e, "write-through failed, keeping in-memory state for retry");
                }
            },
            WritePolicy::WriteBack => {
                debug!(%kind, "mutation deferred to next flush");
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for StateStore {
    fn name(&self) -> &str {
        "state-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, AnketaError> {
        self.probe().await?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AnketaError> {
        self.flush().await;
        debug!("state store shut down");
        Ok(())
    }
}

// ---------- Row encoding / decoding ----------

/// Encode one kind's cache slice into its backing row.
fn encode_kind(cache: &StateCache, kind: RecordKind, prefix: &str) -> StateRow {
    let data = match kind {
        RecordKind::UserData => encode_keyed_maps(&cache.user_data),
        RecordKind::ChatData => encode_keyed_maps(&cache.chat_data),
        RecordKind::BotData => Value::Object(cache.bot_data.clone()),
        RecordKind::Conversations => encode_conversations(&cache.conversations),
        RecordKind::CallbackData => Value::Object(cache.callback_data.clone()),
    };
    StateRow::new(format!("{prefix}:{kind}"), data)
}

fn encode_keyed_maps(maps: &HashMap<i64, RecordMap>) -> Value {
    let obj: serde_json::Map<String, Value> = maps
        .iter()
        .map(|(id, map)| (id.to_string(), Value::Object(map.clone())))
        .collect();
    Value::Object(obj)
}

fn encode_conversations(flows: &HashMap<String, HashMap<ConversationKey, Value>>) -> Value {
    let obj: serde_json::Map<String, Value> = flows
        .iter()
        .map(|(flow, table)| {
            let encoded: serde_json::Map<String, Value> = table
                .iter()
                .map(|(&key, state)| (convkey::encode(key), state.clone()))
                .collect();
            (flow.clone(), Value::Object(encoded))
        })
        .collect();
    Value::Object(obj)
}

/// Decode a per-id map-of-maps row (user_data, chat_data).
fn decode_keyed_maps(data: Option<Value>, what: &str) -> HashMap<i64, RecordMap> {
    let obj = match data {
        None => return HashMap::new(),
        Some(Value::Object(obj)) => obj,
        Some(other) => {
            warn!(kind = what, found = %json_type(&other), "malformed stored row, treating as empty");
            return HashMap::new();
        }
    };

    let mut out = HashMap::new();
    for (key, value) in obj {
        let id: i64 = match key.parse() {
            Ok(id) => id,
            Err(_) => {
                warn!(kind = what, key = key.as_str(), "non-numeric record key, skipping entry");
                continue;
            }
        };
        match value {
            Value::Object(map) => {
                out.insert(id, map);
            }
            other => {
                warn!(kind = what, key = key.as_str(), found = %json_type(&other), "non-object record value, skipping entry");
            }
        }
    }
    out
}

/// Decode a singleton map row (bot_data, callback_data).
fn decode_map(data: Option<Value>, what: &str) -> RecordMap {
    match data {
        None => RecordMap::new(),
        Some(Value::Object(obj)) => obj,
        Some(other) => {
            warn!(kind = what, found = %json_type(&other), "malformed stored row, treating as empty");
            RecordMap::new()
        }
    }
}

fn decode_conversations(data: Option<Value>) -> HashMap<String, HashMap<ConversationKey, Value>> {
    let obj = match data {
        None => return HashMap::new(),
        Some(Value::Object(obj)) => obj,
        Some(other) => {
            warn!(kind = "conversations", found = %json_type(&other), "malformed stored row, treating as empty");
            return HashMap::new();
        }
    };

    let mut out = HashMap::new();
    for (flow, table) in obj {
        let table_obj = match table {
            Value::Object(t) => t,
            other => {
                warn!(flow = flow.as_str(), found = %json_type(&other), "non-object conversation table, skipping flow");
                continue;
            }
        };
        let mut decoded = HashMap::new();
        for (key_str, state) in table_obj {
            match convkey::decode(&key_str) {
                Ok(key) => {
                    decoded.insert(key, state);
                }
                Err(e) => {
                    warn!(flow = flow.as_str(), error = %e, "skipping conversation entry");
                }
            }
        }
        out.insert(flow, decoded);
    }
    out
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
