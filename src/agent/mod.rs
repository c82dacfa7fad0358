//! 에이전트 - 쿼리 오케스트레이션
//!
//! 검색 → 관련도 필터 → 도구 선택 → 생성 → 후처리 순서로 쿼리 하나를 처리하고
//! 단계별 로그를 담은 [`QueryTrace`]를 반환합니다.
//!
//! 관련 청크가 하나라도 있으면 `rag` 도구(컨텍스트 있음),
//! 없으면 `none` 도구(컨텍스트 없음, 모델 지식만 사용)로 응답합니다.

use std::sync::Arc;

use serde::Serialize;

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::knowledge::{RelevancePolicy, Retriever, ScoredChunk};
use crate::llm::{Generation, Generator};

// ============================================================================
// Trace Types
// ============================================================================

/// 선택된 도구
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// 검색 컨텍스트 사용
    Rag,
    /// 컨텍스트 없이 생성
    None,
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolKind::Rag => write!(f, "rag"),
            ToolKind::None => write!(f, "none"),
        }
    }
}

/// 쿼리 처리 결과
#[derive(Debug, Clone, Serialize)]
pub struct QueryTrace {
    /// 입력 쿼리 (원문 그대로)
    pub query: String,
    pub tool_used: ToolKind,
    /// 임계값을 넘긴 청크 (도구가 none이면 비어 있음)
    pub retrieved_chunks: Vec<ScoredChunk>,
    /// 실행된 단계 로그 (순서 유지)
    pub log: Vec<String>,
    /// 추론 조각 (정상 출력일 때만)
    pub reason: Option<Vec<String>>,
    pub result: Generation,
}

// ============================================================================
// Agent
// ============================================================================

/// RAG 에이전트
pub struct Agent {
    retriever: Retriever,
    generator: Arc<dyn Generator>,
    policy: RelevancePolicy,
    top_k: usize,
}

impl Agent {
    pub fn new(retriever: Retriever, generator: Arc<dyn Generator>, config: &RetrievalConfig) -> Self {
        Self {
            retriever,
            generator,
            policy: RelevancePolicy::new(config.relevance_threshold),
            top_k: config.top_k,
        }
    }

    /// 생성 모델 이름
    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// 쿼리 하나 처리
    ///
    /// 검색 에러(빈 인덱스 포함)는 그대로 전파되며 이 경우 생성은 호출되지 않습니다.
    /// 센티넬 결과는 에러가 아니라 `result`에 담겨 반환됩니다.
    pub async fn process_query(&self, query: &str) -> Result<QueryTrace> {
        let mut trace = TraceLog::default();

        trace.push("Retrieving relevant chunks...");
        let chunks = self.retriever.retrieve(query, self.top_k).await?;
        let retrieved_count = chunks.len();

        let relevant: Vec<ScoredChunk> = chunks
            .into_iter()
            .filter(|c| self.policy.is_relevant(c.relevance_score))
            .collect();

        let tool_used = if relevant.is_empty() {
            trace.push("No relevant chunks found.");
            trace.push("Agent detected tool: none");
            ToolKind::None
        } else {
            trace.push(format!("Retrieved {} chunks", retrieved_count));
            trace.push("Agent detected tool: rag");
            ToolKind::Rag
        };

        trace.push("Generating response with LLM...");
        let context = match tool_used {
            ToolKind::Rag => Some(relevant.as_slice()),
            ToolKind::None => None,
        };
        let result = self.generator.generate(query, context).await?;

        let reason = match &result {
            Generation::InvalidModel => {
                trace.push("Invalid model.");
                None
            }
            Generation::ServiceUnreachable => {
                trace.push("Error occurred while accessing LLM service.");
                None
            }
            Generation::Output(output) => {
                trace.push("LLM response generated");
                Some(output.reasoning.clone())
            }
        };

        Ok(QueryTrace {
            query: query.to_string(),
            tool_used,
            retrieved_chunks: relevant,
            log: trace.into_entries(),
            reason,
            result,
        })
    }
}

/// 단계 로그 (tracing으로도 함께 출력)
#[derive(Default)]
struct TraceLog {
    entries: Vec<String>,
}

impl TraceLog {
    fn push(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        tracing::info!("{}", entry);
        self.entries.push(entry);
    }

    fn into_entries(self) -> Vec<String> {
        self.entries
    }
}

// ============================================================================
// Tests
// ============================================================================
