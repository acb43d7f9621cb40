//! Content store port: the seam between accessors and the remote document store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use super::queries::Query;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("store responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to decode result of `{query}`: {message}")]
    Decode { query: &'static str, message: String },
    #[error("query `{query}` is missing parameter `${name}`")]
    MissingParam { query: &'static str, name: String },
}

impl FetchError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(query: &Query, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            query: query.name,
            message: err.to_string(),
        }
    }
}

/// Query parameters bound to `$name` placeholders.
///
/// Keys are kept sorted so the serialized form is stable and can be used as
/// part of a memoization key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryParams(BTreeMap<String, Value>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deterministic serialized form of the parameter map.
    pub fn canonical(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    /// Ensure every placeholder in `query` has a bound value.
    pub fn check(&self, query: &Query) -> Result<(), FetchError> {
        match query
            .placeholders()
            .into_iter()
            .find(|name| !self.0.contains_key(*name))
        {
            Some(name) => Err(FetchError::MissingParam {
                query: query.name,
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Read access to the remote document store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Run `query` once and return the raw `result` payload.
    async fn fetch_value(&self, query: &Query, params: &QueryParams) -> Result<Value, FetchError>;
}

impl dyn ContentStore {
    /// Run `query` and decode its result into `T`.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        query: &Query,
        params: &QueryParams,
    ) -> Result<T, FetchError> {
        let value = self.fetch_value(query, params).await?;
        serde_json::from_value(value).map_err(|err| FetchError::decode(query, err))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::queries::posts;

    #[test]
    fn canonical_form_is_order_independent() {
        let first = QueryParams::new().with("limit", 3).with("slug", "hello");
        let second = QueryParams::new().with("slug", "hello").with("limit", 3);
        assert_eq!(first.canonical(), second.canonical());
        assert_eq!(first.canonical(), r#"{"limit":3,"slug":"hello"}"#);
    }

    #[test]
    fn check_reports_first_missing_placeholder() {
        let params = QueryParams::new().with("slug", "hello").with("limit", 3);
        let err = params.check(&posts::RELATED).expect_err("categoryIds missing");
        assert!(matches!(
            err,
            FetchError::MissingParam { ref name, .. } if name == "categoryIds"
        ));

        let complete = params.with("categoryIds", json!(["c1"]));
        assert!(complete.check(&posts::RELATED).is_ok());
    }
}
