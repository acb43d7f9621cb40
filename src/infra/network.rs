//! reqwest-backed network for the asset worker.

use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::cache::{AssetRequest, AssetResponse, Network, WorkerError};

use super::error::InfraError;

#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: Client,
}

impl HttpNetwork {
    pub fn new() -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("agency-content/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| InfraError::configuration(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, WorkerError> {
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(WorkerError::network)?;
        let response = self
            .client
            .request(method, &request.url)
            .send()
            .await
            .map_err(WorkerError::network)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(WorkerError::network)?;

        Ok(AssetResponse {
            status,
            headers,
            body,
        })
    }
}
