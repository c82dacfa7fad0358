//! Ollama 채팅 클라이언트
//!
//! `POST {base_url}/api/chat` (비스트리밍)으로 응답을 생성합니다.
//! HTTP 에러 상태는 잘못된 모델로, 전송 실패/타임아웃은 서비스 접속 불가로 분류되며
//! 2xx인데 본문을 해석할 수 없으면 [`RagError::Generation`]으로 실패합니다.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{normalize_base_url, GenerationConfig};
use crate::error::{RagError, Result};
use crate::knowledge::ScoredChunk;

use super::postprocess::{classify_generation_outcome, RawGeneration};
use super::prompt::build_prompt;
use super::{Generation, Generator};

// ============================================================================
// Wire Types
// ============================================================================

/// 채팅 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// 채팅 요청 본문
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

/// 채팅 응답 (비스트리밍)
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub model: String,
    #[serde(default)]
    pub created_at: Option<String>,
    pub message: ChatMessage,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub done_reason: Option<String>,
    #[serde(default)]
    pub total_duration: Option<u64>,
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

// ============================================================================
// Client
// ============================================================================

/// Ollama 생성 클라이언트
#[derive(Debug)]
pub struct OllamaClient {
    base_url: String,
    config: GenerationConfig,
    client: reqwest::Client,
}

impl OllamaClient {
    /// 새 클라이언트 생성
    pub fn new(base_url: &str, config: GenerationConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: normalize_base_url(base_url),
            config,
            client,
        })
    }

    /// 서버 주소
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 프롬프트 하나로 채팅 호출 (분류 전 결과)
    pub async fn chat(&self, prompt: String) -> Result<RawGeneration> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            stream: false,
            options: ChatOptions {
                temperature: self.config.temperature,
                num_predict: self.config.num_predict,
            },
        };

        let url = format!("{}/api/chat", self.base_url);
        let response = match self.client.post(&url).json(&request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                return Ok(RawGeneration::Unreachable {
                    reason: e.to_string(),
                })
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Ok(RawGeneration::Unreachable {
                    reason: format!("Failed to read response body: {}", e),
                })
            }
        };

        if !status.is_success() {
            let message = serde_json::from_str::<OllamaError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Ok(RawGeneration::ModelRejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| RagError::Generation(format!("Failed to parse chat response: {}", e)))?;

        tracing::debug!(
            "Chat response from {} (done: {}, reason: {:?})",
            parsed.model,
            parsed.done,
            parsed.done_reason
        );
        Ok(RawGeneration::Completed(parsed))
    }

    /// 서버 버전 조회 (`GET /api/version`)
    pub async fn version(&self) -> anyhow::Result<String> {
        let url = format!("{}/api/version", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach Ollama server")?
            .error_for_status()
            .context("Ollama version request failed")?;

        let parsed: VersionResponse = response
            .json()
            .await
            .context("Failed to parse version response")?;
        Ok(parsed.version)
    }

    /// 설치된 모델 목록 조회 (`GET /api/tags`)
    pub async fn list_models(&self) -> anyhow::Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach Ollama server")?
            .error_for_status()
            .context("Ollama tags request failed")?;

        let parsed: TagsResponse = response
            .json()
            .await
            .context("Failed to parse tags response")?;
        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, query: &str, context: Option<&[ScoredChunk]>) -> Result<Generation> {
        let prompt = build_prompt(query, context);
        tracing::info!("Loading response using the {} model...", self.config.model);

        let raw = self.chat(prompt).await?;
        Ok(classify_generation_outcome(raw))
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// ============================================================================
// Tests
// ============================================================================
