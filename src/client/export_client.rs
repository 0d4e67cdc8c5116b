//! # Export API Client
//!
//! HTTP client for the export service. Supports the two request shapes the
//! service has exposed over time:
//!
//! - **collection**: `POST /api/projects/{team}/exports` with
//!   `{export_format, dashboard?, insight?}`, answered by `{id, has_content}`
//! - **resource_scoped**: `POST /api/projects/{team}/{kind}s/{id}/exports`,
//!   answered by `{export_id, has_content?}`
//!
//! Both poll `GET /api/projects/{team}/exports/{id}` for `{has_content}`.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use super::backend::{CreatedExport, ExportBackend};
use super::error::{ClientError, ClientResult};
use crate::constants::{DEFAULT_API_KEY_HEADER, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_MS};
use crate::models::{ExportRequest, JobId, PollResult, ResourceIdentity};

/// Request shape spoken by the export service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiProtocol {
    #[default]
    Collection,
    ResourceScoped,
}

/// Configuration for the export API client
#[derive(Debug, Clone)]
pub struct ExportApiConfig {
    /// Base URL of the service (e.g., "<http://localhost:8000>")
    pub base_url: String,
    /// Project/team the exports belong to
    pub team_id: u64,
    pub protocol: ApiProtocol,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Personal API key sent with every request, if set
    pub api_key: Option<String>,
    pub api_key_header: String,
}

impl Default for ExportApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            team_id: 1,
            protocol: ApiProtocol::default(),
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            api_key: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
        }
    }
}

/// Creation response as sent by either protocol variant
#[derive(Debug, Deserialize)]
struct CreateExportResponse {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    export_id: Option<Value>,
    #[serde(default)]
    has_content: Option<bool>,
}

impl CreateExportResponse {
    fn into_created(self) -> CreatedExport {
        let job_id = self.id.or(self.export_id).and_then(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        CreatedExport {
            job_id,
            has_content: self.has_content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExportStatusResponse {
    #[serde(default)]
    has_content: bool,
}

/// HTTP client for the export service
#[derive(Clone)]
pub struct ExportApiClient {
    client: Client,
    config: ExportApiConfig,
}

impl std::fmt::Debug for ExportApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportApiClient")
            .field("base_url", &self.config.base_url)
            .field("team_id", &self.config.team_id)
            .field("protocol", &self.config.protocol)
            .field("timeout_ms", &self.config.timeout_ms)
            .field("auth_enabled", &self.config.api_key.is_some())
            .finish()
    }
}

impl ExportApiClient {
    /// Create a new client, validating the base URL and auth header
    pub fn new(config: ExportApiConfig) -> ClientResult<Self> {
        Url::parse(&config.base_url)
            .map_err(|e| ClientError::config_error(format!("Invalid base URL: {e}")))?;

        let mut client_builder = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("export-orchestrator/{}", env!("CARGO_PKG_VERSION")));

        if let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let header_name =
                reqwest::header::HeaderName::from_bytes(config.api_key_header.as_bytes())
                    .map_err(|e| {
                        ClientError::config_error(format!("Invalid API key header name: {e}"))
                    })?;
            let header_value = if header_name == reqwest::header::AUTHORIZATION {
                format!("Bearer {api_key}")
            } else {
                api_key.to_string()
            };

            let mut default_headers = reqwest::header::HeaderMap::new();
            default_headers.insert(
                header_name,
                header_value
                    .parse()
                    .map_err(|e| ClientError::config_error(format!("Invalid API key: {e}")))?,
            );
            client_builder = client_builder.default_headers(default_headers);

            debug!(header = %config.api_key_header, "Configured API key authentication");
        }

        let client = client_builder
            .build()
            .map_err(|e| ClientError::config_error(format!("Failed to create HTTP client: {e}")))?;

        info!(
            base_url = %config.base_url,
            team_id = config.team_id,
            protocol = ?config.protocol,
            timeout_ms = config.timeout_ms,
            auth_enabled = config.api_key.is_some(),
            "Created export API client"
        );

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ExportApiConfig {
        &self.config
    }

    fn project_path(&self) -> String {
        format!(
            "{}/api/projects/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.team_id
        )
    }

    fn endpoint(&self, suffix: &str) -> ClientResult<Url> {
        let raw = format!("{}/{}", self.project_path(), suffix.trim_start_matches('/'));
        Url::parse(&raw).map_err(|e| ClientError::config_error(format!("Failed to construct URL: {e}")))
    }

    /// URL the creation request is sent to for this protocol
    pub fn create_url(&self, request: &ExportRequest) -> ClientResult<Url> {
        match self.config.protocol {
            ApiProtocol::Collection => self.endpoint("exports"),
            ApiProtocol::ResourceScoped => {
                let (kind, id) = request.key.target();
                let mut url = self.endpoint(kind.path_segment())?;
                // Pushed as one escaped segment so the id cannot change the route
                url.path_segments_mut()
                    .map_err(|_| ClientError::config_error("Base URL cannot hold a path"))?
                    .push(&id)
                    .push("exports");
                Ok(url)
            }
        }
    }

    /// JSON body of the creation request for this protocol
    pub fn create_body(&self, request: &ExportRequest) -> Value {
        let mut body = Map::new();
        body.insert(
            "export_format".to_string(),
            Value::String(request.format.mime_type().to_string()),
        );

        if self.config.protocol == ApiProtocol::Collection {
            match request.key.identity() {
                ResourceIdentity::Ids {
                    dashboard_id,
                    insight_id,
                } => {
                    body.insert("dashboard".to_string(), (*dashboard_id).into());
                    body.insert("insight".to_string(), (*insight_id).into());
                }
                ResourceIdentity::Resource { kind, id } => {
                    let value = id
                        .parse::<u64>()
                        .map(Value::from)
                        .unwrap_or_else(|_| Value::String(id.clone()));
                    body.insert(kind.to_string(), value);
                }
            }
        }

        Value::Object(body)
    }

    /// Stream an artifact to `path`, returning the number of bytes written
    pub async fn download_artifact(&self, url: &str, path: &Path) -> ClientResult<u64> {
        debug!(url = %url, path = %path.display(), "Downloading export artifact");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Failed to download artifact");
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        let mut file = tokio::fs::File::create(path).await?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!(path = %path.display(), bytes = written, "Export artifact downloaded");
        Ok(written)
    }

    /// Handle HTTP response with proper error handling and deserialization
    async fn handle_response<T>(&self, response: reqwest::Response, operation: &str) -> ClientResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        if response.status().is_success() {
            let body = response.bytes().await?;
            let result = serde_json::from_slice::<T>(&body)?;
            debug!("Successfully completed operation: {}", operation);
            Ok(result)
        } else {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Failed operation: {}", operation);
            Err(ClientError::api_error(status.as_u16(), error_text))
        }
    }
}

#[async_trait]
impl ExportBackend for ExportApiClient {
    async fn create_export(&self, request: &ExportRequest) -> ClientResult<CreatedExport> {
        let url = self.create_url(request)?;
        let body = self.create_body(request);

        debug!(url = %url, resource = %request.key, format = %request.format, "Creating export");

        let response = self.client.post(url).json(&body).send().await?;
        let created: CreateExportResponse = self.handle_response(response, "create_export").await?;
        Ok(created.into_created())
    }

    async fn export_status(&self, job_id: &JobId) -> ClientResult<PollResult> {
        let url = self.endpoint(&format!("exports/{job_id}"))?;

        debug!(url = %url, job_id = %job_id, "Checking export status");

        let response = self.client.get(url).send().await?;
        let status: ExportStatusResponse = self.handle_response(response, "export_status").await?;
        Ok(PollResult {
            ready: status.has_content,
        })
    }

    fn determine_export_url(&self, job_id: &JobId) -> String {
        format!("{}/exports/{}/content?download=true", self.project_path(), job_id)
    }
}
