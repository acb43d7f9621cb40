//! HTTP client for the hosted document store's query endpoint.

use std::time::Instant;

use async_trait::async_trait;
use metrics::counter;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::application::queries::Query;
use crate::application::store::{ContentStore, FetchError, QueryParams};
use crate::config::StoreSettings;

use super::error::InfraError;

/// Which credentials (and host) a client uses.
#[derive(Clone)]
pub enum ClientMode {
    /// Anonymous reads; may go through the CDN host.
    ReadOnly,
    /// Bearer-authenticated reads against the live API host.
    Privileged { token: String },
}

impl std::fmt::Debug for ClientMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadOnly => f.write_str("ReadOnly"),
            Self::Privileged { .. } => f.write_str("Privileged { token: <redacted> }"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreClient {
    client: Client,
    endpoint: Url,
    mode: ClientMode,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    ms: Option<u64>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl StoreClient {
    /// Anonymous client; honours `use_cdn`.
    pub fn read_only(settings: &StoreSettings) -> Result<Self, InfraError> {
        Self::build(settings, ClientMode::ReadOnly)
    }

    /// Authenticated client; requires a configured token.
    pub fn privileged(settings: &StoreSettings) -> Result<Self, InfraError> {
        let token = settings
            .token
            .clone()
            .ok_or_else(|| InfraError::configuration("store.token is required for privileged access"))?;
        Self::build(settings, ClientMode::Privileged { token })
    }

    fn build(settings: &StoreSettings, mode: ClientMode) -> Result<Self, InfraError> {
        let project_id = required(&settings.project_id, "store.project_id")?;
        let dataset = required(&settings.dataset, "store.dataset")?;

        let host = match mode {
            ClientMode::ReadOnly if settings.use_cdn => settings.cdn_host.as_str(),
            _ => settings.api_host.as_str(),
        };
        let base = format!(
            "https://{project_id}.{host}/v{version}/data/query/{dataset}",
            version = settings.api_version
        );
        let endpoint = Url::parse(&base)
            .map_err(|err| InfraError::configuration(format!("invalid store endpoint `{base}`: {err}")))?;

        let client = Client::builder()
            .user_agent(concat!("agency-content/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| InfraError::configuration(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            endpoint,
            mode,
        })
    }

    pub fn mode(&self) -> &ClientMode {
        &self.mode
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Full request URL with the query text and `$`-prefixed JSON parameters.
    pub fn request_url(&self, query: &Query, params: &QueryParams) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", query.text);
            for (name, value) in params.iter() {
                pairs.append_pair(&format!("${name}"), &value.to_string());
            }
        }
        url
    }

    /// GET request for `query`, authenticated when the client is privileged.
    fn request(&self, query: &Query, params: &QueryParams) -> reqwest::RequestBuilder {
        let request = self.client.get(self.request_url(query, params));
        match &self.mode {
            ClientMode::Privileged { token } => request.bearer_auth(token),
            ClientMode::ReadOnly => request,
        }
    }
}

#[async_trait]
impl ContentStore for StoreClient {
    async fn fetch_value(&self, query: &Query, params: &QueryParams) -> Result<Value, FetchError> {
        params.check(query)?;

        let request = self.request(query, params);

        counter!("agency_store_fetch_total", "query" => query.name).increment(1);
        let started = Instant::now();
        let outcome = send(request, query).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(body) => {
                debug!(
                    query = query.name,
                    elapsed_ms,
                    server_ms = body.ms,
                    "store query completed"
                );
                Ok(body.result)
            }
            Err(err) => {
                counter!("agency_store_fetch_error_total", "query" => query.name).increment(1);
                debug!(query = query.name, elapsed_ms, error = %err, "store query failed");
                Err(err)
            }
        }
    }
}

async fn send(request: reqwest::RequestBuilder, query: &Query) -> Result<QueryResponse, FetchError> {
    let response = request.send().await.map_err(FetchError::transport)?;
    let status = response.status();
    let bytes = response.bytes().await.map_err(FetchError::transport)?;

    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            message: error_message(status, &bytes),
        });
    }

    serde_json::from_slice(&bytes).map_err(|err| FetchError::decode(query, err))
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(|parsed| parsed.error.description.or(parsed.error.message))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        })
}

fn required<'a>(value: &'a Option<String>, key: &'static str) -> Result<&'a str, InfraError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| InfraError::configuration(format!("{key} must be set")))
}
