use crate::api::command::Command;
use crate::api::routes::Route;
use crate::config::ClientConfig;
use crate::error::{AppError, AppResult};
use crate::infrastructure::query_key::QueryKey;
use crate::infrastructure::traits::{Backend, QueryFetcher};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

/// Error body returned by the REST backend.
#[derive(Deserialize)]
struct ApiErrorResponse {
    error: String,
}

/// HTTP backend speaking the `/api` REST contract.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: Client,
    base_url: String,
}

impl RemoteBackend {
    pub fn new(config: &ClientConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::ConfigurationError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn handle_response(response: reqwest::Response) -> AppResult<Value> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            let message = match serde_json::from_str::<ApiErrorResponse>(&text) {
                Ok(body) => body.error,
                Err(_) if text.is_empty() => status.to_string(),
                Err(_) => text,
            };
            return Err(AppError::from_status(status.as_u16(), message));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl QueryFetcher for RemoteBackend {
    #[instrument(skip(self, key), fields(key = %key))]
    async fn fetch(&self, key: &QueryKey) -> AppResult<Value> {
        let route = Route::parse(key)?;
        let url = self.url(&route.api_path());
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .query(&key.query_params())
            .send()
            .await?;
        Self::handle_response(response).await
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    #[instrument(skip(self, command), fields(command = command.name()))]
    async fn send(&self, command: Command) -> AppResult<Value> {
        command.validate()?;
        let url = self.url(&command.path());
        debug!("{} {}", command.method(), url);
        let mut request = self.client.request(command.method(), &url);
        if let Some(body) = command.body()? {
            request = request.json(&body);
        }
        let response = request.send().await?;
        Self::handle_response(response).await
    }
}
