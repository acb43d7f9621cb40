#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use agency_content::application::queries::Query;
use agency_content::application::store::{ContentStore, FetchError, QueryParams};
use agency_content::cache::{AssetRequest, AssetResponse, Network, WorkerError};
use async_trait::async_trait;
use serde_json::Value;

/// In-memory document store. Responses are keyed by query name; a query that
/// reads `$limit` gets its canned array sliced the way the remote store would.
#[derive(Default)]
pub struct MemoryStore {
    responses: HashMap<&'static str, Value>,
    failing: bool,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn with(mut self, query: &Query, value: Value) -> Self {
        self.responses.insert(query.name, value);
        self
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn fetch_value(&self, query: &Query, params: &QueryParams) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        params.check(query)?;
        if self.failing {
            return Err(FetchError::Status {
                status: 503,
                message: "dataset unavailable".to_string(),
            });
        }

        let value = self.responses.get(query.name).cloned().unwrap_or(Value::Null);
        let limit = params.get("limit").and_then(Value::as_u64);
        Ok(match (value, limit) {
            (Value::Array(items), Some(limit)) => {
                Value::Array(items.into_iter().take(limit as usize).collect())
            }
            (value, _) => value,
        })
    }
}

/// Scripted network: each URL answers with a counter-stamped body after an
/// optional delay; URLs can be switched to fail.
#[derive(Default)]
pub struct ScriptedNetwork {
    calls: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    failing: Mutex<bool>,
    extra_headers: Mutex<Vec<(String, String)>>,
}

impl ScriptedNetwork {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().expect("delay lock") = delay;
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().expect("failing lock") = failing;
    }

    pub fn set_header(&self, name: &str, value: &str) {
        self.extra_headers
            .lock()
            .expect("headers lock")
            .push((name.to_string(), value.to_string()));
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, WorkerError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = *self.delay.lock().expect("delay lock");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.failing.lock().expect("failing lock") {
            return Err(WorkerError::Network("connection refused".to_string()));
        }

        let mut response = AssetResponse::new(200, format!("{} v{n}", request.url))
            .with_header("content-type", "text/plain");
        for (name, value) in self.extra_headers.lock().expect("headers lock").iter() {
            response = response.with_header(name.clone(), value.clone());
        }
        Ok(response)
    }
}
