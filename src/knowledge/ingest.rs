//! 문서 수집 파이프라인
//!
//! 데이터 디렉토리의 파일을 읽어 문서로 만들고, 청킹 후 벡터 저장소에 추가합니다.
//! 읽기에 실패한 파일은 경고를 남기고 건너뜁니다 (전체 배치는 계속 진행).

use std::path::Path;

use anyhow::Result;
use serde_json::Value;

use crate::collector::FileCollector;
use crate::extractor::{ContentExtractor, ExtractedContent};

use super::chunker::Chunker;
use super::vector::{Chunk, ChunkMetadata, VectorStore};

/// 청킹 전 문서
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// 수집 결과 요약
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// 수집 대상 파일 수
    pub files_seen: usize,
    /// 읽기에 실패해 건너뛴 파일 수
    pub files_failed: usize,
    /// 생성된 문서 수 (CSV 행, PDF 페이지 포함)
    pub documents: usize,
    /// 저장소에 추가된 청크 수
    pub chunks: usize,
}

/// 디렉토리의 지원 파일을 문서로 로드
///
/// 반환값: (문서 목록, 수집 대상 파일 수, 실패 파일 수)
pub async fn load_documents(
    dir: &Path,
    collector: &FileCollector,
    extractor: &ContentExtractor,
) -> Result<(Vec<LoadedDocument>, usize, usize)> {
    let files = collector.collect_directory(dir)?;
    let mut documents = Vec::new();
    let mut failed = 0;

    for file in &files {
        let file_name = file.file_name();
        tracing::info!("Loading {}...", file_name);

        let contents = match extractor.extract(&file.path, file.file_type).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Error loading {}: {:#}", file_name, e);
                failed += 1;
                continue;
            }
        };

        for content in contents {
            let metadata = document_metadata(&file.path, &file_name, &content);
            documents.push(LoadedDocument {
                content: content.text,
                metadata,
            });
        }
    }

    Ok((documents, files.len(), failed))
}

fn document_metadata(path: &Path, file_name: &str, content: &ExtractedContent) -> ChunkMetadata {
    let mut metadata = ChunkMetadata::new(path.display().to_string());
    metadata.insert("filename", file_name);
    metadata.insert("file_type", content.source_type.extension());

    let extra = &content.metadata;
    if let Some(page) = extra.page {
        metadata.insert("page", page);
    }
    if let Some(total) = extra.total_pages {
        metadata.insert("total_pages", total);
    }
    if let Some(row) = extra.row {
        metadata.insert("row", row);
    }
    if let Some(seq) = extra.seq_num {
        metadata.insert("seq_num", seq);
    }

    metadata
}

/// 문서를 청크로 분할 (`chunk_id`는 전체 청크 기준 순번)
pub fn chunk_documents(documents: &[LoadedDocument], chunker: &dyn Chunker) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for doc in documents {
        for piece in chunker.chunk(&doc.content) {
            let mut metadata = doc.metadata.clone();
            metadata.insert("chunk_id", Value::from(chunks.len()));
            match Chunk::new(piece, metadata) {
                Ok(chunk) => chunks.push(chunk),
                Err(e) => tracing::debug!("Skipping chunk: {}", e),
            }
        }
    }

    tracing::debug!(
        "Split {} documents into {} chunks ({})",
        documents.len(),
        chunks.len(),
        chunker.name()
    );
    chunks
}

/// 디렉토리 전체 수집: 로드 → 청킹 → 저장소 추가
pub async fn ingest_directory(
    dir: &Path,
    collector: &FileCollector,
    extractor: &ContentExtractor,
    chunker: &dyn Chunker,
    store: &dyn VectorStore,
) -> Result<IngestReport> {
    let (documents, files_seen, files_failed) = load_documents(dir, collector, extractor).await?;
    let chunks = chunk_documents(&documents, chunker);
    let added = store.add(&chunks).await?;

    let report = IngestReport {
        files_seen,
        files_failed,
        documents: documents.len(),
        chunks: added,
    };

    tracing::info!(
        "Ingested {} files ({} failed): {} documents, {} chunks",
        report.files_seen,
        report.files_failed,
        report.documents,
        report.chunks
    );
    Ok(report)
}

// ============================================================================
// Tests
// ============================================================================
