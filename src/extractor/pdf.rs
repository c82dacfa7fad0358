//! PDF 텍스트 추출 모듈
//!
//! pdf-extract 크레이트를 사용하여 PDF에서 텍스트를 추출합니다.

use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;

/// PDF에서 페이지별 텍스트 추출
///
/// 페이지 순서대로 텍스트 벡터를 반환합니다 (인덱스 = 0부터 시작하는 페이지 번호).
/// 텍스트가 없는 PDF(스캔 문서 등)는 빈 벡터를 반환합니다.
pub fn extract_pages(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read PDF: {:?}", path))?;

    let text = pdf_extract::extract_text_from_mem(&bytes)
        .with_context(|| format!("Failed to extract text from PDF: {:?}", path))?;

    if text.trim().is_empty() {
        tracing::warn!(
            "No text extracted from PDF: {:?}. It might be a scanned document.",
            path
        );
        return Ok(vec![]);
    }

    Ok(split_pdf_pages(&text))
}

/// PDF 텍스트를 페이지별로 분리
///
/// 빈 페이지도 자리를 유지하므로 인덱스가 실제 페이지 번호와 일치합니다.
fn split_pdf_pages(text: &str) -> Vec<String> {
    // 폼피드 문자 (\x0c)로 페이지 분리 시도 (마지막 페이지 뒤의 폼피드는 무시)
    if text.contains('\x0c') {
        let body = text.trim_end_matches([' ', '\t', '\r', '\n']);
        let body = body.strip_suffix('\x0c').unwrap_or(body);
        return body.split('\x0c').map(|s| s.trim().to_string()).collect();
    }

    // 페이지 구분자 패턴 (예: "--- Page 1 ---")
    if let Ok(page_pattern) =
        Regex::new(r"(?m)^[\s]*[-=]+[\s]*(?:Page[\s]*)?(\d+)[\s]*[-=]+[\s]*$")
    {
        let mut pages: Vec<String> = page_pattern
            .split(text)
            .map(|s| s.trim().to_string())
            .collect();

        // 첫 구분자 앞의 빈 머리말은 페이지가 아님
        if pages.len() > 1 && pages[0].is_empty() {
            pages.remove(0);
        }

        if pages.len() > 1 {
            return pages;
        }
    }

    vec![text.trim().to_string()]
}

// ============================================================================
// Tests
// ============================================================================
