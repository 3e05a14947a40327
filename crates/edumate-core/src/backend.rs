use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const GENERATE_PATH: &str = "/generate";

#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub prompt: &'a str,
}

/// Body returned by `/generate`, either the success or the error shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub narration: Option<String>,
    #[serde(default, rename = "videoUrl")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("could not reach backend: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned an unreadable body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can answer a generate request
#[async_trait]
pub trait GenerateBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GenerateResponse, BackendError>;
}

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, GENERATE_PATH)
    }
}

#[async_trait]
impl GenerateBackend for HttpBackend {
    async fn generate(&self, prompt: &str) -> Result<GenerateResponse, BackendError> {
        let url = self.endpoint();

        // `json()` sets Content-Type: application/json
        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest { prompt })
            .send()
            .await?;

        // The backend reports failures as {"error": ...} with a 4xx/5xx
        // status, so the body decides the outcome rather than the status.
        let status = response.status();
        let body = response.bytes().await?;
        tracing::debug!(%status, bytes = body.len(), "generate response received");

        let parsed: GenerateResponse = serde_json::from_slice(&body)?;
        Ok(parsed)
    }
}
