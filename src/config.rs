//! 설정 모듈
//!
//! 에이전트 실행 설정을 정의합니다.
//! 우선순위: CLI 인자 > 환경변수 > 기본값
//!
//! ## 환경변수
//! - `RAG_AGENT_MODEL`: 생성 모델 이름 (기본: gemma3:1b)
//! - `OLLAMA_HOST`: Ollama 서버 URL (기본: http://localhost:11434)
//! - `RAG_AGENT_EMBED_MODEL`: 임베딩 모델 이름 (기본: all-minilm)
//! - `RAG_AGENT_DATA_DIR`: 문서 디렉토리 (기본: ./data)

use std::path::PathBuf;
use std::time::Duration;

use crate::knowledge::ChunkConfig;

/// 기본 생성 모델
pub const DEFAULT_MODEL: &str = "gemma3:1b";

/// 기본 Ollama 서버 URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// 기본 임베딩 모델
pub const DEFAULT_EMBED_MODEL: &str = "all-minilm";

/// 기본 관련도 임계값 (score > 0.4 인 청크만 사용)
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.4;

/// 기본 검색 결과 수
pub const DEFAULT_TOP_K: usize = 3;

// ============================================================================
// Sub Configs
// ============================================================================

/// 검색 설정
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalConfig {
    /// 벡터 검색 결과 수
    pub top_k: usize,
    /// 관련도 임계값 (이 값을 초과해야 컨텍스트로 사용)
    pub relevance_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
        }
    }
}

/// 생성 설정
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// 모델 이름
    pub model: String,
    /// 샘플링 온도
    pub temperature: f32,
    /// 최대 생성 토큰 수
    pub num_predict: u32,
    /// 요청 타임아웃
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            num_predict: 500,
            timeout: Duration::from_secs(300),
        }
    }
}

// ============================================================================
// AgentConfig
// ============================================================================

/// 에이전트 전체 설정
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Ollama 서버 URL
    pub base_url: String,
    /// 임베딩 모델 이름
    pub embed_model: String,
    /// 문서 디렉토리
    pub data_dir: PathBuf,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub chunk: ChunkConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            data_dir: PathBuf::from("data"),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
            chunk: ChunkConfig::default(),
        }
    }
}

impl AgentConfig {
    /// 환경변수를 반영한 설정 생성
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 생성 (빈 값은 무시)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(model) = get("RAG_AGENT_MODEL") {
            tracing::debug!("Using model from RAG_AGENT_MODEL");
            config.generation.model = model;
        }
        if let Some(host) = get("OLLAMA_HOST") {
            config.base_url = normalize_base_url(&host);
        }
        if let Some(embed_model) = get("RAG_AGENT_EMBED_MODEL") {
            config.embed_model = embed_model;
        }
        if let Some(dir) = get("RAG_AGENT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        config
    }

    /// 모델 이름 지정
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.generation.model = model.into();
        self
    }

    /// Ollama URL 지정
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = normalize_base_url(url);
        self
    }
}

/// URL 정규화
///
/// `OLLAMA_HOST`는 `127.0.0.1:11434`처럼 스킴 없이 지정되는 경우가 많습니다.
pub fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.generation.model, "gemma3:1b");
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.retrieval.top_k, 3);
        assert!((config.retrieval.relevance_threshold - 0.4).abs() < f32::EPSILON);
        assert_eq!(config.generation.num_predict, 500);
        assert_eq!(config.chunk.chunk_size, 1000);
        assert_eq!(config.chunk.chunk_overlap, 200);
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RAG_AGENT_MODEL", "qwen3:4b"),
            ("OLLAMA_HOST", "127.0.0.1:9999"),
            ("RAG_AGENT_DATA_DIR", "/tmp/docs"),
            ("RAG_AGENT_EMBED_MODEL", "  "),
        ]
        .into_iter()
        .collect();

        let config = AgentConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.generation.model, "qwen3:4b");
        assert_eq!(config.base_url, "http://127.0.0.1:9999");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/docs"));
        // 공백 값은 무시
        assert_eq!(config.embed_model, DEFAULT_EMBED_MODEL);
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://host:1/"), "http://host:1");
        assert_eq!(normalize_base_url("https://host"), "https://host");
        assert_eq!(normalize_base_url("localhost:11434"), "http://localhost:11434");
    }

    #[test]
    fn test_builder_methods() {
        let config = AgentConfig::default()
            .with_model("llama3")
            .with_base_url("http://other:1234/");
        assert_eq!(config.generation.model, "llama3");
        assert_eq!(config.base_url, "http://other:1234");
    }
}
