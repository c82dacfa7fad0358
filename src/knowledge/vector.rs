//! Vector Store - 벡터 검색 트레이트 및 유틸리티
//!
//! 청크/검색 결과 타입과 벡터 저장소의 공통 인터페이스를 정의합니다.
//! 저장소는 쿼리 텍스트를 받아 거리 오름차순으로 결과를 반환합니다.

use std::convert::TryFrom;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RagError, Result};

// ============================================================================
// Types
// ============================================================================

/// 청크 메타데이터
///
/// 임의의 JSON 값을 담는 맵이며, 문자열 `source` 키를 항상 포함합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ChunkMetadata(Map<String, Value>);

impl ChunkMetadata {
    /// 출처만 가진 메타데이터 생성
    pub fn new(source: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("source".to_string(), Value::String(source.into()));
        Self(map)
    }

    /// 맵에서 생성 (`source` 검증)
    pub fn from_map(map: Map<String, Value>) -> Result<Self> {
        match map.get("source") {
            Some(Value::String(_)) => Ok(Self(map)),
            _ => Err(RagError::MissingSource),
        }
    }

    /// 출처
    pub fn source(&self) -> &str {
        self.0
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// 값 조회
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// 값 추가 (`source`는 문자열만 허용)
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if key == "source" && !value.is_string() {
            tracing::warn!("Ignoring non-string source metadata: {}", value);
            return;
        }
        self.0.insert(key, value);
    }
}

impl TryFrom<Map<String, Value>> for ChunkMetadata {
    type Error = RagError;

    fn try_from(map: Map<String, Value>) -> Result<Self> {
        Self::from_map(map)
    }
}

impl From<ChunkMetadata> for Map<String, Value> {
    fn from(meta: ChunkMetadata) -> Self {
        meta.0
    }
}

/// 검색 가능한 텍스트 단위
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// 청크 생성 (빈 콘텐츠 거부)
    pub fn new(content: impl Into<String>, metadata: ChunkMetadata) -> Result<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(RagError::EmptyContent);
        }
        Ok(Self { content, metadata })
    }
}

/// 벡터 검색 결과
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// 청크 텍스트
    pub content: String,
    /// 청크 메타데이터
    pub metadata: ChunkMetadata,
    /// 쿼리와의 거리 (작을수록 가까움, 보고되지 않을 수 있음)
    pub distance: Option<f32>,
}

// ============================================================================
// VectorStore Trait
// ============================================================================

/// VectorStore 트레이트 (async)
///
/// 벡터 저장소의 공통 인터페이스입니다.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// 청크 배치 추가, 추가된 개수 반환
    async fn add(&self, chunks: &[Chunk]) -> Result<usize>;

    /// 쿼리와 가장 가까운 `limit`개 청크 (거리 오름차순)
    ///
    /// 저장된 청크가 없으면 [`RagError::EmptyIndex`]를 반환합니다.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;

    /// 저장된 청크 수
    async fn count(&self) -> Result<usize>;
}

// ============================================================================
// Distance Metrics
// ============================================================================

/// 거리 척도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    /// 유클리드 거리 제곱
    #[default]
    SquaredL2,
    /// 1 - 코사인 유사도
    Cosine,
}

impl DistanceMetric {
    /// 두 벡터 간 거리 (항상 0 이상)
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::SquaredL2 => squared_l2(a, b),
            DistanceMetric::Cosine => (1.0 - cosine_similarity(a, b)).max(0.0),
        }
    }
}

/// 코사인 유사도 계산
///
/// 결과는 -1.0 ~ 1.0 범위입니다.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// 유클리드 거리 제곱
///
/// 길이가 다른 벡터는 비교할 수 없으므로 무한대를 반환합니다.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

// ============================================================================
// Tests
// ============================================================================
