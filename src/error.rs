//! 에러 타입
//!
//! 검색-응답 파이프라인의 핵심 실패 조건을 정의합니다.
//! 생성 단계의 두 가지 센티넬(잘못된 모델, 서비스 접속 불가)은
//! 에러가 아니라 [`crate::llm::Generation`]의 변형으로 전달됩니다.

use thiserror::Error;

/// 파이프라인 에러
#[derive(Debug, Error)]
pub enum RagError {
    /// 문서가 하나도 추가되지 않은 인덱스에서 검색 시도
    #[error("Vector store is empty. Please add documents first.")]
    EmptyIndex,

    /// 음수 또는 NaN 거리 (벡터 저장소 계약 위반)
    #[error("Invalid distance reported by vector store: {0}")]
    InvalidDistance(f32),

    /// 메타데이터에 `source` 키가 없음
    #[error("Chunk metadata is missing a string 'source' entry")]
    MissingSource,

    /// 빈 청크 콘텐츠
    #[error("Chunk content is empty")]
    EmptyContent,

    /// 임베딩 응답 형식 오류
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// 생성 서비스가 응답했으나 본문을 해석할 수 없음
    #[error("Generation error: {0}")]
    Generation(String),

    /// 기타 협력자 에러
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RagError>;
