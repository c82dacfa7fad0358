//! Retriever - 벡터 검색 + 관련도 점수
//!
//! 벡터 저장소에서 상위 K개 청크를 가져와 관련도 점수를 붙입니다.
//! 순위는 저장소가 반환한 순서(거리 오름차순)를 그대로 유지합니다.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{RagError, Result};

use super::relevance;
use super::vector::{ChunkMetadata, VectorStore};

/// 관련도 점수가 붙은 청크
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub content: String,
    pub metadata: ChunkMetadata,
    /// 1 / (1 + distance)
    pub relevance_score: f32,
}

impl ScoredChunk {
    /// 청크 출처
    pub fn source(&self) -> &str {
        self.metadata.source()
    }
}

/// 검색기
pub struct Retriever {
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// 쿼리와 관련된 상위 `top_k`개 청크 검색
    ///
    /// 인덱스가 비어 있으면 [`RagError::EmptyIndex`]를 반환합니다.
    /// 저장소 에러는 그대로 전파합니다.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>> {
        if self.store.count().await? == 0 {
            return Err(RagError::EmptyIndex);
        }

        let hits = self.store.search(query, top_k).await?;
        tracing::debug!("Vector search returned {} hits", hits.len());

        hits.into_iter()
            .map(|hit| {
                // 거리가 보고되지 않으면 0으로 간주
                let relevance_score = relevance::score(hit.distance.unwrap_or(0.0))?;
                Ok(ScoredChunk {
                    content: hit.content,
                    metadata: hit.metadata,
                    relevance_score,
                })
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
