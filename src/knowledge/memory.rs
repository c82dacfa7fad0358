//! 인메모리 벡터 저장소
//!
//! 프로세스 수명 동안만 유지되는 휘발성 인덱스입니다.
//! 검색은 저장된 모든 벡터에 대한 전수 거리 계산으로 수행됩니다.

use std::sync::{Arc, RwLock};

use anyhow::anyhow;
use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

use super::vector::{Chunk, DistanceMetric, SearchHit, VectorStore};

struct StoredChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// 인메모리 벡터 저장소
pub struct InMemoryVectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    metric: DistanceMetric,
    entries: RwLock<Vec<StoredChunk>>,
}

impl InMemoryVectorStore {
    /// 임베딩 프로바이더로 생성 (기본 척도: 유클리드 거리 제곱)
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_metric(embedder, DistanceMetric::default())
    }

    /// 거리 척도 지정
    pub fn with_metric(embedder: Arc<dyn EmbeddingProvider>, metric: DistanceMetric) -> Self {
        Self {
            embedder,
            metric,
            entries: RwLock::new(Vec::new()),
        }
    }
}

fn poisoned() -> RagError {
    RagError::Other(anyhow!("Vector store lock poisoned"))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            tracing::warn!("No chunks provided to add to the vector store");
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::Embedding(format!(
                "expected {} embeddings, received {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            entries.push(StoredChunk {
                chunk: chunk.clone(),
                embedding,
            });
        }

        tracing::info!(
            "Added {} chunks to vector store (total={})",
            chunks.len(),
            entries.len()
        );
        Ok(chunks.len())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        if self.count().await? == 0 {
            return Err(RagError::EmptyIndex);
        }

        let query_embedding = self.embedder.embed(query).await?;

        let entries = self.entries.read().map_err(|_| poisoned())?;
        let mut scored: Vec<(f32, &StoredChunk)> = entries
            .iter()
            .map(|e| (self.metric.distance(&query_embedding, &e.embedding), e))
            .collect();

        // 안정 정렬: 같은 거리는 삽입 순서 유지
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(distance, e)| SearchHit {
                content: e.chunk.content.clone(),
                metadata: e.chunk.metadata.clone(),
                distance: Some(distance),
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().map_err(|_| poisoned())?.len())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::knowledge::vector::ChunkMetadata;

    /// 알파벳 빈도 기반 결정적 임베딩 (테스트용)
    pub(crate) struct LetterEmbedding;

    #[async_trait]
    impl EmbeddingProvider for LetterEmbedding {
        async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            let mut v = vec![0.0f32; 26];
            for c in text.to_lowercase().chars() {
                if c.is_ascii_lowercase() {
                    v[(c as u8 - b'a') as usize] += 1.0;
                }
            }
            let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                v.iter_mut().for_each(|x| *x /= norm);
            }
            Ok(v)
        }

        fn dimension(&self) -> usize {
            26
        }

        fn name(&self) -> &str {
            "letters"
        }
    }

    fn chunk(text: &str) -> Chunk {
        Chunk::new(text, ChunkMetadata::new(format!("{}.txt", text))).expect("chunk")
    }

    #[tokio::test]
    async fn test_search_empty_store() {
        let store = InMemoryVectorStore::new(Arc::new(LetterEmbedding));
        let result = store.search("anything", 3).await;
        assert!(matches!(result, Err(RagError::EmptyIndex)));
    }

    #[tokio::test]
    async fn test_add_empty_batch() {
        let store = InMemoryVectorStore::new(Arc::new(LetterEmbedding));
        assert_eq!(store.add(&[]).await.expect("add"), 0);
        assert_eq!(store.count().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn test_search_orders_by_distance() {
        let store = InMemoryVectorStore::new(Arc::new(LetterEmbedding));
        store
            .add(&[chunk("zzzz"), chunk("abab"), chunk("abcz")])
            .await
            .expect("add");

        let hits = store.search("ab", 3).await.expect("search");
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].content, "abab");
        assert_eq!(hits[2].content, "zzzz");

        let distances: Vec<f32> = hits.iter().filter_map(|h| h.distance).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        assert!(distances.iter().all(|d| *d >= 0.0));
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let store = InMemoryVectorStore::with_metric(Arc::new(LetterEmbedding), DistanceMetric::Cosine);
        store
            .add(&[chunk("aaa"), chunk("bbb"), chunk("ccc"), chunk("ddd")])
            .await
            .expect("add");

        let hits = store.search("aaa", 2).await.expect("search");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "aaa");
        assert_eq!(hits[0].metadata.source(), "aaa.txt");
        assert_eq!(store.count().await.expect("count"), 4);
    }
}
