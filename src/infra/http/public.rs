use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE, ETAG, LAST_MODIFIED},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::{
    application::{error::HttpError, page_data::PageDataService, scope::RenderScope},
    cache::{AssetRequest, AssetResponse, AssetWorker, CacheManifest, Strategy},
};

use super::middleware::{log_responses, set_request_context};

const MANIFEST_CACHE_CONTROL: &str = "public, max-age=300";
const FORWARDED_ASSET_HEADERS: [axum::http::HeaderName; 4] =
    [CONTENT_TYPE, CACHE_CONTROL, ETAG, LAST_MODIFIED];

#[derive(Clone)]
pub struct HttpState {
    pub pages: Arc<PageDataService>,
    pub worker: Arc<AssetWorker>,
    pub manifest: Arc<CacheManifest>,
}

impl HttpState {
    pub fn new(pages: PageDataService, worker: AssetWorker) -> Self {
        let manifest = worker.policy().manifest();
        Self {
            pages: Arc::new(pages),
            worker: Arc::new(worker),
            manifest: Arc::new(manifest),
        }
    }
}

pub fn build_router(state: HttpState) -> Router {
    let content_routes = Router::new()
        .route("/content/home", get(home))
        .route("/content/about", get(about))
        .route("/content/blog", get(blog_index))
        .route("/content/blog/{slug}", get(post_detail))
        .route("/content/projects/{slug}", get(project_detail))
        .route("/content/services/{slug}", get(service_detail))
        .route("/content/search", get(search));

    let worker_routes = Router::new()
        .route("/worker/cache-manifest.json", get(cache_manifest))
        .route("/worker/fetch", get(proxy_asset))
        .route("/_health", get(health));

    content_routes
        .merge(worker_routes)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BlogQuery {
    category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchQuery {
    q: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AssetQuery {
    url: String,
}

type Scope = Extension<Arc<RenderScope>>;

async fn home(State(state): State<HttpState>, Extension(scope): Scope) -> Response {
    Json(state.pages.home(&scope).await).into_response()
}

async fn about(State(state): State<HttpState>, Extension(scope): Scope) -> Response {
    Json(state.pages.about(&scope).await).into_response()
}

async fn blog_index(
    State(state): State<HttpState>,
    Extension(scope): Scope,
    Query(query): Query<BlogQuery>,
) -> Response {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|category| !category.is_empty());
    Json(state.pages.blog_index(&scope, category).await).into_response()
}

async fn post_detail(
    State(state): State<HttpState>,
    Extension(scope): Scope,
    Path(slug): Path<String>,
) -> Response {
    match state.pages.post(&scope, &slug).await {
        Some(page) => Json(page).into_response(),
        None => HttpError::not_found(
            "infra::http::public::post_detail",
            format!("post `{slug}` not found"),
        )
        .into_response(),
    }
}

async fn project_detail(
    State(state): State<HttpState>,
    Extension(scope): Scope,
    Path(slug): Path<String>,
) -> Response {
    match state.pages.project(&scope, &slug).await {
        Some(page) => Json(page).into_response(),
        None => HttpError::not_found(
            "infra::http::public::project_detail",
            format!("project `{slug}` not found"),
        )
        .into_response(),
    }
}

async fn service_detail(
    State(state): State<HttpState>,
    Extension(scope): Scope,
    Path(slug): Path<String>,
) -> Response {
    match state.pages.service(&scope, &slug).await {
        Some(page) => Json(page).into_response(),
        None => HttpError::not_found(
            "infra::http::public::service_detail",
            format!("service `{slug}` not found"),
        )
        .into_response(),
    }
}

async fn search(
    State(state): State<HttpState>,
    Extension(scope): Scope,
    Query(query): Query<SearchQuery>,
) -> Response {
    Json(state.pages.search(&scope, &query.q).await).into_response()
}

async fn cache_manifest(State(state): State<HttpState>) -> Response {
    let mut response = Json(state.manifest.as_ref()).into_response();
    response.headers_mut().insert(
        CACHE_CONTROL,
        HeaderValue::from_static(MANIFEST_CACHE_CONTROL),
    );
    response
}

/// Serve a static asset through the worker so repeat loads come from its cache.
///
/// Only URLs governed by a cache-first or stale-while-revalidate rule are accepted;
/// anything else would turn this route into an open proxy.
async fn proxy_asset(State(state): State<HttpState>, Query(query): Query<AssetQuery>) -> Response {
    const SOURCE: &str = "infra::http::public::proxy_asset";

    let url = query.url.trim();
    let proxyable = state
        .worker
        .policy()
        .rule_for(url)
        .is_some_and(|rule| rule.strategy != Strategy::NetworkFirst);
    if !proxyable {
        return HttpError::new(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "URL is not a cacheable asset",
            format!("`{url}` matches no static asset rule"),
        )
        .into_response();
    }

    match state.worker.handle(&AssetRequest::get(url)).await {
        Ok(asset) => asset_response(asset),
        Err(err) => HttpError::from(err).into_response(),
    }
}

fn asset_response(asset: AssetResponse) -> Response {
    let mut builder = Response::builder().status(asset.status);
    for name in FORWARDED_ASSET_HEADERS.iter() {
        let value = asset
            .header(name.as_str())
            .and_then(|value| HeaderValue::from_str(value).ok());
        if let Some(value) = value {
            builder = builder.header(name, value);
        }
    }

    builder
        .body(Body::from(asset.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
