//! Request-scoped memoization for content fetches.
//!
//! A `RenderScope` is created for each incoming request and dropped with it.
//! Within one scope, identical `(query, params)` pairs resolve exactly once,
//! including when several accessors await the same key concurrently.
//! Scopes never share state with each other.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use metrics::counter;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;
use uuid::Uuid;

use super::queries::Query;
use super::store::QueryParams;
use crate::cache::lock::mutex_lock;

const SOURCE: &str = "application::scope";

type MemoKey = (&'static str, String);

/// Memoized outcome of one store call; `None` records a failed fetch.
type MemoSlot = Arc<OnceCell<Option<Value>>>;

pub struct RenderScope {
    id: Uuid,
    entries: Mutex<HashMap<MemoKey, MemoSlot>>,
}

impl RenderScope {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Scope tagged with an existing request identifier.
    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Resolve `(query, params)` through the scope, running `load` only on the
    /// first request for that key.
    pub async fn memoize<F, Fut>(&self, query: &Query, params: &QueryParams, load: F) -> Option<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<Value>>,
    {
        let key = (query.name, params.canonical());
        let slot = {
            let mut entries = mutex_lock(&self.entries, SOURCE, "memoize");
            Arc::clone(entries.entry(key).or_default())
        };

        let mut loaded = false;
        let value = slot
            .get_or_init(|| {
                loaded = true;
                load()
            })
            .await
            .clone();

        if !loaded {
            counter!("agency_memo_hit_total", "query" => query.name).increment(1);
            debug!(scope = %self.id, query = query.name, "memoized result reused");
        }

        value
    }

    /// Number of distinct keys resolved or in flight in this scope.
    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RenderScope {
    fn default() -> Self {
        Self::new()
    }
}
