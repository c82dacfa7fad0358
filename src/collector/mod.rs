//! 파일 수집 모듈
//!
//! 데이터 디렉토리에서 지원하는 문서 파일을 수집합니다.
//! .gitignore 패턴을 존중하고, 지원하는 확장자(.txt, .csv, .json, .pdf)만 수집합니다.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;

// ============================================================================
// File Types
// ============================================================================

/// 지원하는 파일 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// 일반 텍스트 파일
    Text,
    /// CSV 파일 (행 단위 문서)
    Csv,
    /// JSON 파일 (파일 전체가 하나의 문서)
    Json,
    /// PDF 파일 (페이지 단위 문서)
    Pdf,
}

impl FileType {
    /// 확장자로 파일 타입 결정
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(FileType::Text),
            "csv" => Some(FileType::Csv),
            "json" => Some(FileType::Json),
            "pdf" => Some(FileType::Pdf),
            _ => None,
        }
    }

    /// 파일 경로에서 타입 결정
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// 점을 포함한 확장자 표기 (메타데이터 `file_type`)
    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Text => ".txt",
            FileType::Csv => ".csv",
            FileType::Json => ".json",
            FileType::Pdf => ".pdf",
        }
    }
}

// ============================================================================
// Collected File
// ============================================================================

/// 수집된 파일 정보
#[derive(Debug, Clone)]
pub struct CollectedFile {
    /// 파일 경로
    pub path: PathBuf,
    /// 파일 타입
    pub file_type: FileType,
    /// 파일 크기 (바이트)
    pub size: u64,
}

impl CollectedFile {
    /// 파일에서 CollectedFile 생성
    pub fn from_path(path: PathBuf) -> Result<Option<Self>> {
        let file_type = match FileType::from_path(&path) {
            Some(ft) => ft,
            None => {
                tracing::info!("Unsupported file extension, skipping: {:?}", path);
                return Ok(None);
            }
        };

        let metadata = std::fs::metadata(&path)
            .with_context(|| format!("Failed to read metadata: {:?}", path))?;

        if !metadata.is_file() {
            return Ok(None);
        }

        Ok(Some(Self {
            path,
            file_type,
            size: metadata.len(),
        }))
    }

    /// 파일 이름
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

// ============================================================================
// File Collector
// ============================================================================

/// 파일 수집기 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// .gitignore 패턴 존중 여부
    pub respect_gitignore: bool,
    /// 숨김 파일 포함 여부
    pub include_hidden: bool,
    /// 하위 폴더까지 수집할지 여부
    pub recursive: bool,
    /// 최대 파일 크기 (바이트, 0이면 제한 없음)
    pub max_file_size: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            respect_gitignore: true,
            include_hidden: false,
            recursive: false,
            max_file_size: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// 파일 수집기
pub struct FileCollector {
    config: CollectorConfig,
}

impl FileCollector {
    /// 새 수집기 생성
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// 기본 설정으로 수집기 생성
    pub fn with_defaults() -> Self {
        Self::new(CollectorConfig::default())
    }

    /// 폴더에서 지원 파일 수집 (경로 순 정렬)
    pub fn collect_directory(&self, path: &Path) -> Result<Vec<CollectedFile>> {
        if !path.exists() {
            anyhow::bail!("Directory not found: {:?}", path);
        }

        if !path.is_dir() {
            anyhow::bail!("Not a directory: {:?}", path);
        }

        let mut files = Vec::new();

        let walker = WalkBuilder::new(path)
            .hidden(!self.config.include_hidden)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .max_depth(if self.config.recursive { None } else { Some(1) })
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read entry: {}", e);
                    continue;
                }
            };

            // 파일만 처리
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            match CollectedFile::from_path(entry.path().to_path_buf()) {
                Ok(Some(file)) => {
                    if self.should_include(&file) {
                        files.push(file);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Failed to collect file: {}", e);
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::info!("Collected {} files from {:?}", files.len(), path);
        Ok(files)
    }

    /// 파일이 필터 조건을 만족하는지 확인
    fn should_include(&self, file: &CollectedFile) -> bool {
        if self.config.max_file_size > 0 && file.size > self.config.max_file_size {
            tracing::debug!("Skipping large file: {:?} ({} bytes)", file.path, file.size);
            return false;
        }
        true
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// 수집 통계
#[derive(Debug, Default)]
pub struct CollectionStats {
    pub total_files: usize,
    pub text_files: usize,
    pub csv_files: usize,
    pub json_files: usize,
    pub pdf_files: usize,
    pub total_size: u64,
}

impl CollectionStats {
    /// 수집된 파일 목록에서 통계 계산
    pub fn from_files(files: &[CollectedFile]) -> Self {
        let mut stats = Self::default();

        for file in files {
            stats.total_files += 1;
            stats.total_size += file.size;

            match file.file_type {
                FileType::Text => stats.text_files += 1,
                FileType::Csv => stats.csv_files += 1,
                FileType::Json => stats.json_files += 1,
                FileType::Pdf => stats.pdf_files += 1,
            }
        }

        stats
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> tempfile::TempDir {
        tempfile::Builder::new()
            .prefix("collector")
            .tempdir()
            .expect("tempdir")
    }

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(FileType::from_extension("txt"), Some(FileType::Text));
        assert_eq!(FileType::from_extension("CSV"), Some(FileType::Csv));
        assert_eq!(FileType::from_extension("json"), Some(FileType::Json));
        assert_eq!(FileType::from_extension("PDF"), Some(FileType::Pdf));
        assert_eq!(FileType::from_extension("md"), None);
        assert_eq!(FileType::Pdf.extension(), ".pdf");
    }

    #[test]
    fn test_collect_directory_filters_and_sorts() {
        let dir = temp_dir();
        std::fs::write(dir.path().join("b.txt"), "bee").expect("write");
        std::fs::write(dir.path().join("a.csv"), "h\n1").expect("write");
        std::fs::write(dir.path().join("notes.md"), "# skip").expect("write");
        std::fs::create_dir(dir.path().join("nested")).expect("mkdir");
        std::fs::write(dir.path().join("nested").join("c.txt"), "sea").expect("write");

        let files = FileCollector::with_defaults()
            .collect_directory(dir.path())
            .expect("collect");

        let names: Vec<String> = files.iter().map(|f| f.file_name()).collect();
        assert_eq!(names, vec!["a.csv", "b.txt"]);

        let stats = CollectionStats::from_files(&files);
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.csv_files, 1);
        assert_eq!(stats.text_files, 1);
    }

    #[test]
    fn test_collect_directory_recursive() {
        let dir = temp_dir();
        std::fs::create_dir(dir.path().join("nested")).expect("mkdir");
        std::fs::write(dir.path().join("nested").join("c.txt"), "sea").expect("write");

        let collector = FileCollector::new(CollectorConfig {
            recursive: true,
            ..Default::default()
        });
        let files = collector.collect_directory(dir.path()).expect("collect");
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_collect_missing_directory() {
        let result = FileCollector::with_defaults().collect_directory(Path::new("/no/such/dir"));
        assert!(result.is_err());
    }

    #[test]
    fn test_collector_skips_large_files() {
        let dir = temp_dir();
        std::fs::write(dir.path().join("big.txt"), "x".repeat(100)).expect("write");

        let collector = FileCollector::new(CollectorConfig {
            max_file_size: 10,
            ..Default::default()
        });
        let files = collector.collect_directory(dir.path()).expect("collect");
        assert!(files.is_empty());
    }
}
