//! Memoized data accessors.
//!
//! Each accessor resolves through the caller's [`RenderScope`], so repeated
//! calls while serving one request hit the store once. Accessors never fail:
//! store and decode errors are logged and mapped to an empty list or `None`.

mod pages;
mod posts;
mod projects;
mod search;
mod services;
mod team;
mod testimonials;

pub use testimonials::FeaturedTestimonials;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::queries::Query;
use super::scope::RenderScope;
use super::store::{ContentStore, FetchError, QueryParams};

pub const DEFAULT_RECENT_POSTS_LIMIT: usize = 3;
pub const DEFAULT_RELATED_POSTS_LIMIT: usize = 3;
pub const DEFAULT_FEATURED_PROJECTS_LIMIT: usize = 3;
pub const DEFAULT_FEATURED_TESTIMONIALS_LIMIT: usize = 3;
pub const DEFAULT_MIN_TESTIMONIAL_RATING: u8 = 4;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn ContentStore>,
}

impl ContentService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Fetch and decode `query`, memoized per scope. `None` on any failure.
    async fn load<T: DeserializeOwned>(
        &self,
        scope: &RenderScope,
        query: &Query,
        params: QueryParams,
    ) -> Option<T> {
        let params = &params;
        let store = &self.store;
        let value = scope
            .memoize(query, params, move || async move {
                match store.fetch_value(query, params).await {
                    Ok(value) => Some(value),
                    Err(err) => {
                        report_failure(scope, query, &err);
                        None
                    }
                }
            })
            .await?;

        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                report_failure(scope, query, &FetchError::decode(query, err));
                None
            }
        }
    }

    /// Documents are decoded one by one; a malformed document is skipped and
    /// logged instead of emptying the whole list.
    async fn list<T: DeserializeOwned>(
        &self,
        scope: &RenderScope,
        query: &Query,
        params: QueryParams,
    ) -> Vec<T> {
        let documents = self
            .load::<Option<Vec<Value>>>(scope, query, params)
            .await
            .flatten()
            .unwrap_or_default();

        documents
            .into_iter()
            .filter_map(|document| {
                let id = document
                    .get("_id")
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                match serde_json::from_value(document) {
                    Ok(decoded) => Some(decoded),
                    Err(err) => {
                        warn!(
                            scope = %scope.id(),
                            query = query.name,
                            document = id.as_deref().unwrap_or("<unknown>"),
                            error = %err,
                            "skipping malformed document"
                        );
                        None
                    }
                }
            })
            .collect()
    }

    async fn single<T: DeserializeOwned>(
        &self,
        scope: &RenderScope,
        query: &Query,
        params: QueryParams,
    ) -> Option<T> {
        self.load::<Option<T>>(scope, query, params).await.flatten()
    }
}

fn report_failure(scope: &RenderScope, query: &Query, err: &FetchError) {
    warn!(
        scope = %scope.id(),
        query = query.name,
        entity = ?query.entity,
        error = %err,
        "content fetch failed, serving fallback"
    );
}

/// Normalize a caller-supplied slug; blank slugs never reach the store.
fn clean_slug(slug: &str) -> Option<&str> {
    let trimmed = slug.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
