//! Embedding client turns free text into vectors for similarity search.
//!
//! Speaks the OpenAI-compatible `/embeddings` wire format. Retries on 429 and
//! 5xx with exponential backoff; every other failure is returned as
//! `AppError::Embedding` for the caller to degrade on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::AppError;

const MAX_RETRIES: u32 = 3;

#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;
}

#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    dimensions: usize,
}

#[derive(Clone)]
pub struct HttpEmbeddingClient {
    client: Client,
    settings: EmbeddingSettings,
}

impl HttpEmbeddingClient {
    pub fn new(settings: EmbeddingSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Embedding(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, settings })
    }
}

#[async_trait]
impl TextEmbedder for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let request_body = EmbeddingRequest {
            model: &self.settings.model,
            input: text,
            dimensions: self.settings.dimensions,
        };

        let mut last_error: Option<AppError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // 500ms, 1s
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                warn!(
                    "Embedding attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(&self.settings.api_url)
                .bearer_auth(&self.settings.api_key)
                .json(&request_body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(AppError::Embedding(e.to_string()));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = Some(AppError::Embedding(format!("status {status}: {body}")));
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::Embedding(format!("status {status}: {body}")));
            }

            let json: Value = response
                .json()
                .await
                .map_err(|e| AppError::Embedding(format!("malformed response: {e}")))?;
            let vector = parse_embedding_response(&json, self.settings.dimensions)?;
            debug!("Embedded {} chars into {} dims", text.len(), vector.len());
            return Ok(vector);
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::Embedding(format!("gave up after {MAX_RETRIES} attempts"))
        }))
    }
}

/// Extracts `data[0].embedding` and checks its dimensionality.
fn parse_embedding_response(json: &Value, dimensions: usize) -> Result<Vec<f32>, AppError> {
    let embedding = json
        .get("data")
        .and_then(|v| v.as_array())
        .and_then(|data| data.first())
        .and_then(|item| item.get("embedding"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| AppError::Embedding("response is missing data[0].embedding".to_string()))?;

    let vector = embedding
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|n| n as f32)
                .ok_or_else(|| AppError::Embedding("embedding value must be numeric".to_string()))
        })
        .collect::<Result<Vec<f32>, AppError>>()?;

    if vector.len() != dimensions {
        return Err(AppError::Embedding(format!(
            "expected {dimensions} dimensions, got {}",
            vector.len()
        )));
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_first_embedding() {
        let json = json!({ "data": [{ "index": 0, "embedding": [0.5, -1.0, 2.0] }] });
        assert_eq!(
            parse_embedding_response(&json, 3).unwrap(),
            vec![0.5, -1.0, 2.0]
        );
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let json = json!({ "data": [{ "embedding": [0.5, 1.0] }] });
        assert!(matches!(
            parse_embedding_response(&json, 768),
            Err(AppError::Embedding(_))
        ));
    }

    #[test]
    fn test_missing_data_is_error() {
        assert!(parse_embedding_response(&json!({ "error": "nope" }), 3).is_err());
    }

    #[test]
    fn test_non_numeric_value_is_error() {
        let json = json!({ "data": [{ "embedding": [0.5, "x", 1.0] }] });
        assert!(parse_embedding_response(&json, 3).is_err());
    }
}
