//! Knowledge 모듈 - 인메모리 RAG 지식 저장소
//!
//! - Chunker: 재귀 문자 분할
//! - Vector: 청크 타입 + 벡터 저장소 트레이트
//! - Memory: 휘발성 인메모리 벡터 인덱스
//! - Relevance / Retriever: 거리 → 관련도 점수, 상위 K 검색
//! - Ingest: 디렉토리 로드 → 청킹 → 저장

mod chunker;
mod ingest;
mod memory;
mod relevance;
mod retriever;
mod vector;

// Re-exports
pub use chunker::{recursive_chunker, ChunkConfig, Chunker, RecursiveChunker};
pub use ingest::{chunk_documents, ingest_directory, load_documents, IngestReport, LoadedDocument};
pub use memory::InMemoryVectorStore;
pub use relevance::{score, RelevancePolicy};
pub use retriever::{Retriever, ScoredChunk};
pub use vector::{
    cosine_similarity, squared_l2, Chunk, ChunkMetadata, DistanceMetric, SearchHit, VectorStore,
};

#[cfg(test)]
pub(crate) use memory::tests::LetterEmbedding;
#[cfg(test)]
pub(crate) use retriever::tests::FixedStore;
