//! 콘텐츠 추출 모듈
//!
//! 다양한 파일 형식에서 텍스트 콘텐츠를 추출합니다.
//! - 텍스트 파일: 파일 전체가 하나의 문서
//! - CSV 파일: 행마다 하나의 문서
//! - JSON 파일: 파싱 후 한 줄로 직렬화한 전체 값이 하나의 문서 (키 순서 유지)
//! - PDF 파일: 페이지마다 하나의 문서

pub mod csv;
pub mod pdf;

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::collector::FileType;

// ============================================================================
// Extracted Content
// ============================================================================

/// 추출된 콘텐츠
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// 추출된 텍스트
    pub text: String,
    /// 원본 파일 타입
    pub source_type: FileType,
    /// 메타데이터 (PDF 페이지 번호 등)
    pub metadata: ContentMetadata,
}

/// 콘텐츠 메타데이터
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentMetadata {
    /// PDF 페이지 번호 (0부터 시작)
    pub page: Option<usize>,
    /// 총 페이지 수 (PDF)
    pub total_pages: Option<usize>,
    /// CSV 행 번호 (0부터 시작, 헤더 제외)
    pub row: Option<usize>,
    /// JSON 문서 순번 (1부터 시작)
    pub seq_num: Option<usize>,
}

// ============================================================================
// Content Extractor
// ============================================================================

/// 콘텐츠 추출기
#[derive(Debug, Default)]
pub struct ContentExtractor;

impl ContentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 파일에서 콘텐츠 추출
    pub async fn extract(&self, path: &Path, file_type: FileType) -> Result<Vec<ExtractedContent>> {
        match file_type {
            FileType::Text => self.extract_text(path).await,
            FileType::Csv => self.extract_csv(path).await,
            FileType::Json => self.extract_json(path).await,
            FileType::Pdf => self.extract_pdf(path).await,
        }
    }

    /// 텍스트 파일에서 추출
    async fn extract_text(&self, path: &Path) -> Result<Vec<ExtractedContent>> {
        let text = read_utf8(path).await?;

        Ok(vec![ExtractedContent {
            text,
            source_type: FileType::Text,
            metadata: ContentMetadata::default(),
        }])
    }

    /// CSV 파일에서 추출
    async fn extract_csv(&self, path: &Path) -> Result<Vec<ExtractedContent>> {
        let text = read_utf8(path).await?;

        Ok(csv::rows_to_documents(&text)
            .into_iter()
            .map(|(row, text)| ExtractedContent {
                text,
                source_type: FileType::Csv,
                metadata: ContentMetadata {
                    row: Some(row),
                    ..Default::default()
                },
            })
            .collect())
    }

    /// JSON 파일에서 추출
    async fn extract_json(&self, path: &Path) -> Result<Vec<ExtractedContent>> {
        let raw = read_utf8(path).await?;
        let value: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON: {:?}", path))?;
        let text = to_spaced_json(&value)?;

        Ok(vec![ExtractedContent {
            text,
            source_type: FileType::Json,
            metadata: ContentMetadata {
                seq_num: Some(1),
                ..Default::default()
            },
        }])
    }

    /// PDF 파일에서 추출
    async fn extract_pdf(&self, path: &Path) -> Result<Vec<ExtractedContent>> {
        // PDF 추출은 CPU 바운드이므로 spawn_blocking 사용
        let path = path.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || pdf::extract_pages(&path))
            .await
            .context("PDF extraction task failed")??;

        Ok(page_contents(pages))
    }
}

/// 페이지 텍스트를 문서로 변환
///
/// 빈 페이지는 번호만 차지하고 문서로 만들지 않습니다.
fn page_contents(pages: Vec<String>) -> Vec<ExtractedContent> {
    let total_pages = pages.len();

    pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(page, text)| ExtractedContent {
            text,
            source_type: FileType::Pdf,
            metadata: ContentMetadata {
                page: Some(page),
                total_pages: Some(total_pages),
                ..Default::default()
            },
        })
        .collect()
}

/// JSON 값을 `, ` / `: ` 구분자로 한 줄 직렬화
fn to_spaced_json(value: &serde_json::Value) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value
        .serialize(&mut serializer)
        .context("Failed to serialize JSON")?;
    String::from_utf8(buf).context("Serialized JSON is not UTF-8")
}

/// 쉼표/콜론 뒤에 공백을 넣는 포매터
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> std::io::Result<()>
    where
        W: ?Sized + std::io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> std::io::Result<()>
    where
        W: ?Sized + std::io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> std::io::Result<()>
    where
        W: ?Sized + std::io::Write,
    {
        writer.write_all(b": ")
    }
}

async fn read_utf8(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file as UTF-8: {:?}", path))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> tempfile::TempDir {
        tempfile::Builder::new()
            .prefix("extractor")
            .tempdir()
            .expect("tempdir")
    }

    #[tokio::test]
    async fn test_extract_text() {
        let dir = temp_dir();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello world").expect("write");

        let contents = ContentExtractor::new()
            .extract(&path, FileType::Text)
            .await
            .expect("extract");
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].text, "hello world");
        assert_eq!(contents[0].metadata, ContentMetadata::default());
    }

    #[tokio::test]
    async fn test_extract_csv_rows() {
        let dir = temp_dir();
        let path = dir.path().join("products.csv");
        std::fs::write(&path, "name,price\nLamp,20\nDesk,150\n").expect("write");

        let contents = ContentExtractor::new()
            .extract(&path, FileType::Csv)
            .await
            .expect("extract");
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1].text, "name: Desk\nprice: 150");
        assert_eq!(contents[1].metadata.row, Some(1));
    }

    #[tokio::test]
    async fn test_extract_json_single_line_with_spaced_separators() {
        let dir = temp_dir();
        let path = dir.path().join("faq.json");
        std::fs::write(&path, "{\n  \"q\": \"What?\",\n  \"a\": [1,2],\n  \"n\": {}\n}")
            .expect("write");

        let contents = ContentExtractor::new()
            .extract(&path, FileType::Json)
            .await
            .expect("extract");
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].text, r#"{"q": "What?", "a": [1, 2], "n": {}}"#);
        assert_eq!(contents[0].metadata.seq_num, Some(1));
    }

    #[test]
    fn test_blank_pdf_page_keeps_numbering() {
        let pages = vec!["cover".to_string(), "  ".to_string(), "chapter".to_string()];
        let contents = page_contents(pages);

        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].metadata.page, Some(0));
        assert_eq!(contents[1].text, "chapter");
        assert_eq!(contents[1].metadata.page, Some(2));
        assert_eq!(contents[1].metadata.total_pages, Some(3));
    }

    #[tokio::test]
    async fn test_extract_invalid_json_fails() {
        let dir = temp_dir();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").expect("write");

        let result = ContentExtractor::new().extract(&path, FileType::Json).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_extract_non_utf8_text_fails() {
        let dir = temp_dir();
        let path = dir.path().join("bin.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).expect("write");

        let result = ContentExtractor::new().extract(&path, FileType::Text).await;
        assert!(result.is_err());
    }
}
