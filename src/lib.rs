//! local-rag-agent - 로컬 RAG 에이전트
//!
//! 문서 디렉토리를 인메모리 벡터 인덱스로 적재하고, 관련 청크가 있으면
//! 컨텍스트로 붙여 로컬 Ollama 모델로 답변합니다.

pub mod agent;
pub mod cli;
pub mod collector;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extractor;
pub mod knowledge;
pub mod llm;

// Re-exports
pub use agent::{Agent, QueryTrace, ToolKind};
pub use config::{AgentConfig, GenerationConfig, RetrievalConfig};
pub use embedding::{EmbeddingProvider, OllamaEmbedding};
pub use error::{RagError, Result};
pub use knowledge::{
    Chunk, ChunkConfig, ChunkMetadata, Chunker, InMemoryVectorStore, RelevancePolicy, Retriever,
    ScoredChunk, SearchHit, VectorStore, ingest_directory, recursive_chunker,
};
pub use llm::{
    Generation, GenerationOutput, Generator, OllamaClient, UsageInfo, classify_generation_outcome,
    extract_reasoning,
};
