//! LLM 모듈 - 응답 생성
//!
//! 생성 협력자 인터페이스([`Generator`])와 그 결과 타입을 정의합니다.
//! 생성 결과는 정상 출력 또는 두 가지 센티넬(잘못된 모델, 서비스 접속 불가) 중
//! 하나이며, 호출자는 문자열 비교 없이 변형(variant)으로 분기합니다.

mod ollama;
mod postprocess;
mod prompt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::knowledge::ScoredChunk;

// Re-exports
pub use ollama::{ChatMessage, ChatResponse, OllamaClient};
pub use postprocess::{classify_generation_outcome, extract_reasoning, RawGeneration};
pub use prompt::{build_prompt, WITHOUT_CONTEXT_TEMPLATE, WITH_CONTEXT_TEMPLATE};

/// 잘못된 모델 센티넬 메시지
pub const INVALID_MODEL_MESSAGE: &str = "Invalid model.";

/// 서비스 접속 불가 센티넬 메시지
pub const SERVICE_UNREACHABLE_MESSAGE: &str = "Error while accessing LLM service. Please ensure the Ollama server is running by running 'ollama ps'.\n(Maybe the model is listening on a different port?)";

// ============================================================================
// Types
// ============================================================================

/// 토큰 사용량
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageInfo {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

/// 정상 생성 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOutput {
    /// 추론 구간을 제거한 응답 본문
    pub content: String,
    /// `<think>` 구간에서 추출한 추론 조각 (등장 순서)
    pub reasoning: Vec<String>,
    /// 응답 ID (`run-<uuid>`)
    pub id: String,
    /// 응답한 모델
    pub model: String,
    pub created_at: Option<DateTime<Utc>>,
    pub done_reason: Option<String>,
    pub usage: Option<UsageInfo>,
    /// 전체 처리 시간 (나노초)
    pub total_duration_ns: Option<u64>,
}

impl GenerationOutput {
    /// 본문만으로 생성 (메타데이터 없음)
    pub fn from_text(content: impl Into<String>, reasoning: Vec<String>) -> Self {
        Self {
            content: content.into(),
            reasoning,
            id: new_run_id(),
            model: String::new(),
            created_at: None,
            done_reason: None,
            usage: None,
            total_duration_ns: None,
        }
    }
}

pub(crate) fn new_run_id() -> String {
    format!("run-{}", uuid::Uuid::new_v4())
}

/// 생성 결과 (정상 출력 또는 센티넬)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Generation {
    /// 정상 출력
    Output(GenerationOutput),
    /// 런타임이 모델을 인식하지 못함
    InvalidModel,
    /// 생성 서비스에 접속할 수 없음
    ServiceUnreachable,
}

impl Generation {
    /// 센티넬 여부
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Generation::Output(_))
    }

    /// 정상 출력 참조
    pub fn output(&self) -> Option<&GenerationOutput> {
        match self {
            Generation::Output(output) => Some(output),
            _ => None,
        }
    }

    /// 사용자에게 보여줄 텍스트 (센티넬은 고정 메시지)
    pub fn message(&self) -> &str {
        match self {
            Generation::Output(output) => &output.content,
            Generation::InvalidModel => INVALID_MODEL_MESSAGE,
            Generation::ServiceUnreachable => SERVICE_UNREACHABLE_MESSAGE,
        }
    }
}

// ============================================================================
// Generator Trait
// ============================================================================

/// 생성 협력자 트레이트
///
/// `context`가 `None`이면 컨텍스트 없는 템플릿을, `Some`이면 (비어 있더라도)
/// 컨텍스트 템플릿을 사용합니다.
#[async_trait]
pub trait Generator: Send + Sync {
    /// 쿼리(와 컨텍스트)로 응답 생성
    async fn generate(&self, query: &str, context: Option<&[ScoredChunk]>) -> Result<Generation>;

    /// 모델 이름
    fn model(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
