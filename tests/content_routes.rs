mod common;

use std::sync::Arc;
use std::time::Duration;

use agency_content::application::content::ContentService;
use agency_content::application::page_data::PageDataService;
use agency_content::application::queries::{pages, projects};
use agency_content::cache::{AssetWorker, CachePolicy};
use agency_content::infra::http::{HttpState, build_router};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header::CACHE_CONTROL},
    response::Response,
};
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{MemoryStore, ScriptedNetwork};

struct Harness {
    router: Router,
    store: Arc<MemoryStore>,
    network: Arc<ScriptedNetwork>,
}

fn harness() -> Harness {
    build_harness(true)
}

fn build_harness(worker_enabled: bool) -> Harness {
    let store = Arc::new(
        MemoryStore::default()
            .with(
                &pages::SITE_CONFIG,
                json!({ "_id": "site", "_type": "siteConfig", "title": "Studio North" }),
            )
            .with(
                &projects::BY_SLUG,
                json!({ "_id": "p1", "_type": "project", "title": "Harbour", "slug": "harbour", "featured": true }),
            ),
    );
    let network = Arc::new(ScriptedNetwork::default());

    let pages = PageDataService::new(ContentService::new(store.clone()));
    let policy = CachePolicy::standard("cdn.sanity.io", Duration::from_secs(10));
    let worker = if worker_enabled {
        AssetWorker::new(policy, network.clone())
    } else {
        AssetWorker::disabled(policy, network.clone())
    };

    Harness {
        router: build_router(HttpState::new(pages, worker)),
        store,
        network,
    }
}

async fn get(router: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should collect");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

#[tokio::test]
async fn home_returns_page_data_with_empty_sections() {
    let harness = harness();

    let response = get(&harness.router, "/content/home").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["site"]["title"], json!("Studio North"));
    assert_eq!(body["featuredProjects"], json!([]));
    assert_eq!(body["testimonialStats"]["total"], json!(0));
}

#[tokio::test]
async fn each_request_gets_its_own_scope() {
    let harness = harness();

    get(&harness.router, "/content/home").await;
    let per_request = harness.store.calls();
    get(&harness.router, "/content/home").await;

    assert_eq!(harness.store.calls(), per_request * 2);
}

#[tokio::test]
async fn detail_routes_return_404_for_missing_documents() {
    let harness = harness();

    let found = get(&harness.router, "/content/projects/harbour").await;
    assert_eq!(found.status(), StatusCode::OK);
    let body = json_body(found).await;
    assert_eq!(body["project"]["title"], json!("Harbour"));

    for uri in ["/content/blog/missing", "/content/services/missing"] {
        let response = get(&harness.router, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn search_with_blank_term_returns_no_hits() {
    let harness = harness();

    let response = get(&harness.router, "/content/search?q=%20").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["hits"], json!([]));
    assert_eq!(harness.store.calls(), 0);
}

#[tokio::test]
async fn manifest_lists_rules_in_order() {
    let harness = harness();

    let response = get(&harness.router, "/worker/cache-manifest.json").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(CACHE_CONTROL));

    let body = json_body(response).await;
    let names: Vec<&str> = body["rules"]
        .as_array()
        .expect("rules array")
        .iter()
        .filter_map(|rule| rule["cacheName"].as_str())
        .collect();
    assert_eq!(names, vec!["images", "fonts", "static-assets", "pages"]);
}

#[tokio::test]
async fn asset_proxy_serves_repeat_loads_from_cache() {
    let harness = harness();
    let uri = "/worker/fetch?url=https%3A%2F%2Fcdn.sanity.io%2Fimages%2Fhero.jpg";

    let first = get(&harness.router, uri).await;
    let second = get(&harness.router, uri).await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(harness.network.calls(), 1);
}

#[tokio::test]
async fn asset_proxy_rejects_page_urls() {
    let harness = harness();

    let response = get(
        &harness.router,
        "/worker/fetch?url=https%3A%2F%2Finternal.example%2Fadmin",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(harness.network.calls(), 0);
}

#[tokio::test]
async fn development_mode_proxies_assets_without_caching() {
    let harness = build_harness(false);
    let uri = "/worker/fetch?url=https%3A%2F%2Fcdn.sanity.io%2Fimages%2Fa.png";

    let first = get(&harness.router, uri).await;
    let second = get(&harness.router, uri).await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(harness.network.calls(), 2);
}

#[tokio::test]
async fn development_mode_publishes_the_full_manifest() {
    let harness = build_harness(false);

    let response = get(&harness.router, "/worker/cache-manifest.json").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["rules"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn health_is_no_content() {
    let harness = harness();
    let response = get(&harness.router, "/_health").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
