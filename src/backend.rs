use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/chat";

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

/// Why a chat request produced no usable reply
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned an unusable body: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    endpoint: String,
}

impl BackendClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST `{"message": ...}` and return the `response` field of the reply.
    ///
    /// The status code is not inspected: any body that decodes to
    /// `{"response": string}` counts as a reply.
    pub async fn send(&self, message: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { message })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%status, bytes = body.len(), "backend replied");

        let reply: ChatResponse = serde_json::from_str(&body)?;
        Ok(reply.response)
    }
}
