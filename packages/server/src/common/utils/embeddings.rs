use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::kernel::{BaseEmbeddingService, EmbeddingError};

/// Embedding service backed by Google's `embedContent` endpoint
pub struct EmbeddingService {
    client: Client,
    api_key: Option<String>,
    model: String,
    api_url: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    output_dimensionality: usize,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

impl EmbeddingService {
    pub fn new(config: EmbeddingConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key: config.api_key,
            model: config.model,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            dimensions: config.dimensions,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:embedContent", self.api_url, self.model)
    }
}

#[async_trait]
impl BaseEmbeddingService for EmbeddingService {
    async fn generate(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| EmbeddingError::Configuration("GOOGLE_API_KEY is not set".into()))?;

        if text.trim().is_empty() {
            return Err(EmbeddingError::DataIntegrity(
                "cannot embed empty text".into(),
            ));
        }

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&EmbedContentRequest {
                model: format!("models/{}", self.model),
                content: Content {
                    parts: vec![Part { text }],
                },
                output_dimensionality: self.dimensions,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Transient(format!("request timed out: {}", e))
                } else {
                    EmbeddingError::Transient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    EmbeddingError::Configuration(format!("credential rejected ({}): {}", status, body))
                }
                _ => EmbeddingError::Transient(format!("embedding API error {}: {}", status, body)),
            });
        }

        let parsed: EmbedContentResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::DataIntegrity(e.to_string()))?;

        let values = parsed
            .embedding
            .ok_or_else(|| EmbeddingError::DataIntegrity("no embedding returned".into()))?
            .values;

        if values.len() != self.dimensions {
            return Err(EmbeddingError::DataIntegrity(format!(
                "expected {} dimensions, got {}",
                self.dimensions,
                values.len()
            )));
        }

        debug!(model = %self.model, dimensions = values.len(), "generated embedding");

        Ok(values)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer, api_key: Option<&str>, dimensions: usize) -> EmbeddingService {
        EmbeddingService::new(EmbeddingConfig {
            api_key: api_key.map(str::to_string),
            model: "gemini-embedding-001".to_string(),
            api_url: server.uri(),
            dimensions,
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_returns_vector_from_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-embedding-001:embedContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "embedding": { "values": [0.1, 0.2, 0.3] } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let service = service_for(&server, Some("test-key"), 3);
        let embedding = service.generate("Is the new board shipping?").await.unwrap();

        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_missing_credential_is_configuration_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let service = service_for(&server, None, 3);
        let err = service.generate("hello").await.unwrap_err();

        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_rejected_credential_is_configuration_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let service = service_for(&server, Some("bad-key"), 3);
        let err = service.generate("hello").await.unwrap_err();

        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let service = service_for(&server, Some("test-key"), 3);
        let err = service.generate("hello").await.unwrap_err();

        assert!(matches!(err, EmbeddingError::Transient(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_wrong_dimensionality_is_data_integrity_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "embedding": { "values": [0.1] } })),
            )
            .mount(&server)
            .await;

        let service = service_for(&server, Some("test-key"), 3);
        let err = service.generate("hello").await.unwrap_err();

        assert!(matches!(err, EmbeddingError::DataIntegrity(_)));
    }

    #[tokio::test]
    async fn test_missing_embedding_field_is_data_integrity_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let service = service_for(&server, Some("test-key"), 3);
        let err = service.generate("hello").await.unwrap_err();

        assert!(matches!(err, EmbeddingError::DataIntegrity(_)));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let service = service_for(&server, Some("test-key"), 3);
        assert!(service.generate("   ").await.is_err());
    }

    #[tokio::test]
    #[ignore] // Requires API key
    async fn test_generate_embedding_live() {
        let api_key = std::env::var("GOOGLE_API_KEY").expect("GOOGLE_API_KEY not set");
        let service = EmbeddingService::new(EmbeddingConfig {
            api_key: Some(api_key),
            ..EmbeddingConfig::default()
        })
        .unwrap();

        let embedding = service
            .generate("How do I flash the ConnectOS image onto the gateway?")
            .await
            .expect("Failed to generate embedding");

        assert_eq!(embedding.len(), 768);
    }
}
