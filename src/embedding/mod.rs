//! 임베딩 모듈 - Ollama API를 통한 텍스트 벡터화
//!
//! 텍스트를 벡터로 변환하는 로컬 Ollama 임베딩 프로바이더입니다.
//! 인메모리 벡터 인덱스의 문서/쿼리 임베딩에 사용됩니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = OllamaEmbedding::new("http://localhost:11434", "all-minilm")?;
//! let embedding = embedder.embed("Hello, world!").await?;
//! ```

use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::normalize_base_url;

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 벡터로 변환하는 인터페이스입니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 배치 임베딩 (기본 구현: 순차 호출)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// 임베딩 차원 수 (아직 모르면 0)
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Ollama Embedding
// ============================================================================

/// 전송 실패 시 최대 재시도 횟수
const MAX_RETRIES: u32 = 2;
/// 재시도 시 초기 백오프 (ms)
const INITIAL_BACKOFF_MS: u64 = 500;
/// 한 요청에 담을 최대 텍스트 수
const BATCH_SIZE: usize = 64;

/// Ollama 임베딩 구현체
///
/// `POST {base_url}/api/embed` 엔드포인트를 사용합니다.
#[derive(Debug)]
pub struct OllamaEmbedding {
    base_url: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
    dimension: OnceLock<usize>,
}

impl OllamaEmbedding {
    /// 새 Ollama 임베딩 인스턴스 생성
    ///
    /// # Arguments
    /// * `base_url` - Ollama 서버 URL
    /// * `model` - 임베딩 모델 이름 (예: all-minilm, nomic-embed-text)
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: normalize_base_url(base_url),
            model: model.into(),
            client,
            max_retries: MAX_RETRIES,
            dimension: OnceLock::new(),
        })
    }

    /// 재시도 횟수 지정
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// 모델 이름
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }

    /// 한 번의 요청으로 여러 텍스트 임베딩
    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            model: &self.model,
            input,
        };

        let mut last_error: Option<anyhow::Error> = None;

        // 재시도 루프 (전송 실패 시 지수 백오프)
        for attempt in 0..=self.max_retries {
            let response = match self.client.post(self.endpoint()).json(&request).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(anyhow::anyhow!("Failed to send embedding request: {}", e));
                    if attempt < self.max_retries {
                        let backoff = Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt));
                        tracing::warn!(
                            "Embedding request failed, retrying in {:?} (attempt {}/{})",
                            backoff,
                            attempt + 1,
                            self.max_retries
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    break;
                }
            };

            let status = response.status();
            let body = response
                .text()
                .await
                .context("Failed to read response body")?;

            if !status.is_success() {
                if let Ok(error) = serde_json::from_str::<OllamaError>(&body) {
                    anyhow::bail!("Ollama embedding error ({}): {}", status, error.error);
                }
                anyhow::bail!("Ollama embedding error ({}): {}", status, body);
            }

            let parsed: EmbedResponse =
                serde_json::from_str(&body).context("Failed to parse embedding response")?;

            if parsed.embeddings.len() != input.len() {
                anyhow::bail!(
                    "Embedding count mismatch: requested {}, received {}",
                    input.len(),
                    parsed.embeddings.len()
                );
            }

            if let Some(first) = parsed.embeddings.first() {
                let _ = self.dimension.set(first.len());
            }

            return Ok(parsed.embeddings);
        }

        Err(last_error.unwrap_or_else(|| {
            anyhow::anyhow!("Embedding failed after {} retries", self.max_retries)
        }))
    }
}

/// Ollama embed 요청 본문
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Ollama embed 응답
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Ollama 에러 응답
#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.request(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Ollama returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());

        for (i, batch) in texts.chunks(BATCH_SIZE).enumerate() {
            tracing::debug!(
                "Embedding batch {}/{}",
                i + 1,
                texts.len().div_ceil(BATCH_SIZE)
            );
            results.extend(self.request(batch).await?);
        }

        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension.get().copied().unwrap_or(0)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let input = vec!["hello".to_string(), "world".to_string()];
        let request = EmbedRequest {
            model: "all-minilm",
            input: &input,
        };
        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(value["model"], "all-minilm");
        assert_eq!(value["input"][1], "world");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"model":"all-minilm","embeddings":[[0.1,0.2],[0.3,0.4]]}"#;
        let parsed: EmbedResponse = serde_json::from_str(body).expect("parse");
        assert_eq!(parsed.embeddings.len(), 2);
        assert!((parsed.embeddings[1][0] - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_endpoint_and_dimension() {
        let embedder = OllamaEmbedding::new("localhost:11434/", "all-minilm").expect("client");
        assert_eq!(embedder.endpoint(), "http://localhost:11434/api/embed");
        assert_eq!(embedder.dimension(), 0);
        assert_eq!(embedder.name(), "all-minilm");
    }

    #[tokio::test]
    async fn test_unreachable_server_returns_error() {
        let embedder = OllamaEmbedding::new("http://127.0.0.1:1", "all-minilm")
            .expect("client")
            .with_retries(0);
        let result = embedder.embed("hello").await;
        assert!(result.is_err());
    }
}
