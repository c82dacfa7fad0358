//! CLI 모듈
//!
//! rag-agent CLI 명령어 정의 및 구현

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;

use crate::agent::{Agent, QueryTrace, ToolKind};
use crate::collector::{CollectionStats, FileCollector};
use crate::config::AgentConfig;
use crate::embedding::OllamaEmbedding;
use crate::extractor::ContentExtractor;
use crate::knowledge::{
    ingest_directory, recursive_chunker, InMemoryVectorStore, IngestReport, Retriever,
};
use crate::llm::{Generation, OllamaClient};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "rag-agent")]
#[command(version, about = "로컬 RAG 에이전트 (Ollama)", long_about = None)]
pub struct Cli {
    /// 생성 모델 이름
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Ollama 서버 URL
    #[arg(long, global = true)]
    pub model_url: Option<String>,

    /// 임베딩 모델 이름
    #[arg(long, global = true)]
    pub embed_model: Option<String>,

    /// 문서 디렉토리
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// 검색 결과 수
    #[arg(long, global = true)]
    pub top_k: Option<usize>,

    /// 관련도 임계값
    #[arg(long, global = true)]
    pub threshold: Option<f32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 질문 하나에 답변
    Ask {
        /// 질문
        query: String,

        /// 전체 처리 결과를 JSON으로 출력
        #[arg(long)]
        json: bool,
    },

    /// 대화형 모드
    Chat,

    /// 상태 확인
    Status,
}

impl Cli {
    /// 환경변수 위에 CLI 인자를 덮어쓴 설정
    pub fn config(&self) -> AgentConfig {
        self.apply(AgentConfig::from_env())
    }

    fn apply(&self, mut config: AgentConfig) -> AgentConfig {
        if let Some(ref model) = self.model {
            config = config.with_model(model.clone());
        }
        if let Some(ref url) = self.model_url {
            config = config.with_base_url(url);
        }
        if let Some(ref embed_model) = self.embed_model {
            config.embed_model = embed_model.clone();
        }
        if let Some(ref dir) = self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(top_k) = self.top_k {
            config.retrieval.top_k = top_k;
        }
        if let Some(threshold) = self.threshold {
            config.retrieval.relevance_threshold = threshold;
        }
        config
    }
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.config();

    match cli.command {
        Commands::Ask { query, json } => cmd_ask(&config, &query, json).await,
        Commands::Chat => cmd_chat(&config).await,
        Commands::Status => cmd_status(&config).await,
    }
}

/// 문서 디렉토리를 인메모리 인덱스로 적재하고 에이전트 구성
async fn bootstrap(config: &AgentConfig) -> Result<(Agent, IngestReport)> {
    let embedder = OllamaEmbedding::new(&config.base_url, config.embed_model.clone())
        .context("임베딩 클라이언트 생성 실패")?;
    let store = Arc::new(InMemoryVectorStore::new(Arc::new(embedder)));

    let chunker = recursive_chunker(config.chunk.clone());
    let report = ingest_directory(
        &config.data_dir,
        &FileCollector::with_defaults(),
        &ContentExtractor::new(),
        chunker.as_ref(),
        store.as_ref(),
    )
    .await
    .with_context(|| format!("문서 인덱싱 실패: {}", config.data_dir.display()))?;

    let generator = OllamaClient::new(&config.base_url, config.generation.clone())
        .context("생성 클라이언트 생성 실패")?;
    let agent = Agent::new(Retriever::new(store), Arc::new(generator), &config.retrieval);

    Ok((agent, report))
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 단일 질문 명령어 (ask)
async fn cmd_ask(config: &AgentConfig, query: &str, json: bool) -> Result<()> {
    let (agent, report) = bootstrap(config).await?;
    if !json {
        print_report(&report);
    }

    let trace = agent.process_query(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&trace)?);
    } else if !trace.result.is_sentinel() {
        println!("{}", render_answer(&trace, config));
    }

    // 센티넬은 0이 아닌 종료 코드로
    if let Some(guidance) = sentinel_guidance(&trace.result, config) {
        bail!(guidance);
    }

    Ok(())
}

/// 대화형 명령어 (chat)
async fn cmd_chat(config: &AgentConfig) -> Result<()> {
    let (agent, report) = bootstrap(config).await?;
    print_report(&report);

    println!("[*] 모델: {}", agent.model());
    println!("    종료: exit | quit | bye, 응답 정보: info, 처리 로그: logs");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut last: Option<QueryTrace> = None;

    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let query = match ChatCommand::parse(&line) {
            ChatCommand::Empty => continue,
            ChatCommand::Exit => break,
            ChatCommand::Info => {
                match &last {
                    Some(trace) => print_info(trace),
                    None => println!("[!] 이전 응답이 없습니다."),
                }
                continue;
            }
            ChatCommand::Logs => {
                match &last {
                    Some(trace) => print_logs(trace),
                    None => println!("[!] 이전 로그가 없습니다."),
                }
                continue;
            }
            ChatCommand::Query(query) => query,
        };

        match agent.process_query(&query).await {
            Ok(trace) => {
                println!("{}", render_answer(&trace, config));
                let stop = trace.result.is_sentinel();
                last = Some(trace);
                if stop {
                    break;
                }
            }
            Err(e) => println!("[!] {}", e),
        }
    }

    println!("[*] 대화를 종료합니다.");
    Ok(())
}

/// 상태 명령어 (status)
async fn cmd_status(config: &AgentConfig) -> Result<()> {
    println!("rag-agent v{}", env!("CARGO_PKG_VERSION"));
    println!();

    // 문서 디렉토리
    println!("[*] 문서 디렉토리: {}", config.data_dir.display());
    match FileCollector::with_defaults().collect_directory(&config.data_dir) {
        Ok(files) => {
            let stats = CollectionStats::from_files(&files);
            println!("[OK] 문서 파일: {} 개", stats.total_files);
            println!(
                "     TXT: {}, CSV: {}, JSON: {}, PDF: {}",
                stats.text_files, stats.csv_files, stats.json_files, stats.pdf_files
            );
            println!("     총 크기: {}", format_bytes(stats.total_size));
        }
        Err(e) => println!("[!] 문서 디렉토리 확인 실패: {}", e),
    }

    // Ollama 상태
    let client = OllamaClient::new(&config.base_url, config.generation.clone())?;
    println!("[*] Ollama: {}", client.base_url());

    match client.version().await {
        Ok(version) => println!("[OK] Ollama 실행 중 (v{})", version),
        Err(e) => {
            tracing::debug!("Ollama version check failed: {:#}", e);
            println!("[!] Ollama에 연결할 수 없습니다. 'ollama ps'로 서버 상태를 확인하세요.");
            return Ok(());
        }
    }

    match client.list_models().await {
        Ok(models) => {
            println!("[OK] 설치된 모델: {} 개", models.len());
            for model in &models {
                println!("     - {}", model);
            }
            for (label, name) in [
                ("생성 모델", config.generation.model.as_str()),
                ("임베딩 모델", config.embed_model.as_str()),
            ] {
                if model_installed(&models, name) {
                    println!("[OK] {}: {}", label, name);
                } else {
                    println!("[!] {} '{}' 미설치 (ollama pull {})", label, name, name);
                }
            }
        }
        Err(e) => println!("[!] 모델 목록 조회 실패: {}", e),
    }

    Ok(())
}

// ============================================================================
// Chat Commands
// ============================================================================

/// 대화형 입력 해석 결과
#[derive(Debug, PartialEq, Eq)]
enum ChatCommand {
    Empty,
    Exit,
    Info,
    Logs,
    Query(String),
}

impl ChatCommand {
    fn parse(line: &str) -> Self {
        let input = line.trim();
        match input.to_lowercase().as_str() {
            "" => ChatCommand::Empty,
            "exit" | "quit" | "bye" => ChatCommand::Exit,
            "info" | "information" => ChatCommand::Info,
            "logs" | "log" => ChatCommand::Logs,
            _ => ChatCommand::Query(input.to_string()),
        }
    }
}

// ============================================================================
// Output
// ============================================================================

fn print_report(report: &IngestReport) {
    println!(
        "[OK] 인덱싱 완료: 파일 {} (실패 {}), 문서 {}, 청크 {}",
        report.files_seen, report.files_failed, report.documents, report.chunks
    );
}

/// 답변 출력 문자열 (질문/도구 머리말, 검색 청크, 추론, 결과)
fn render_answer(trace: &QueryTrace, config: &AgentConfig) -> String {
    let heavy = "=".repeat(50);
    let light = "-".repeat(50);
    let mut out = Vec::new();

    out.push(format!("\n{}", heavy));
    out.push(format!("질문: {}", trace.query));
    out.push(format!("도구: {}", trace.tool_used));
    out.push(light.clone());

    if trace.tool_used == ToolKind::Rag {
        out.push("검색된 청크:".to_string());
        for (i, chunk) in trace.retrieved_chunks.iter().enumerate() {
            out.push(format!(
                "  {}. {} [점수: {:.2}] {}",
                i + 1,
                chunk.source(),
                chunk.relevance_score,
                truncate_text(&chunk.content, 200)
            ));
        }
        out.push(light.clone());
    }

    if let Some(reason) = trace.reason.as_ref().filter(|r| !r.is_empty()) {
        out.push("추론:".to_string());
        out.extend(reason.iter().map(|fragment| fragment.trim().to_string()));
        out.push(light);
    }

    out.push("답변:".to_string());
    match sentinel_guidance(&trace.result, config) {
        Some(guidance) => out.push(format!("[!] {}", guidance)),
        None => out.push(trace.result.message().trim().to_string()),
    }
    out.push(heavy);

    out.join("\n")
}

/// 센티넬 결과에 대한 조치 안내 (정상 출력이면 None)
fn sentinel_guidance(result: &Generation, config: &AgentConfig) -> Option<String> {
    match result {
        Generation::Output(_) => None,
        Generation::InvalidModel => Some(format!(
            "{} 모델 '{}'을(를) {}에서 찾을 수 없습니다.\n    모델 이름과 URL을 확인하거나 'ollama pull {}'로 설치하세요.",
            result.message(),
            config.generation.model,
            config.base_url,
            config.generation.model
        )),
        Generation::ServiceUnreachable => Some(format!(
            "{}\n    Ollama 서버 주소: {}",
            result.message(),
            config.base_url
        )),
    }
}

fn print_info(trace: &QueryTrace) {
    let Some(output) = trace.result.output() else {
        println!("[!] {}", trace.result.message());
        return;
    };

    println!("ID: {}", output.id);
    println!("모델: {}", output.model);
    if let Some(created_at) = output.created_at {
        println!("생성 시각: {}", created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(ref reason) = output.done_reason {
        println!("종료 사유: {}", reason);
    }
    if let Some(usage) = output.usage {
        println!(
            "토큰: 입력 {}, 출력 {}, 합계 {}",
            usage.input_tokens, usage.output_tokens, usage.total_tokens
        );
    }
    if let Some(ns) = output.total_duration_ns {
        println!("소요 시간: {:.2}s", ns as f64 / 1e9);
    }
    println!("도구: {}", trace.tool_used);
    if !output.reasoning.is_empty() {
        println!("추론:");
        for fragment in &output.reasoning {
            println!("  {}", truncate_text(fragment, 200));
        }
    }
}

fn print_logs(trace: &QueryTrace) {
    for (i, entry) in trace.log.iter().enumerate() {
        println!("{:>2}. {}", i + 1, entry);
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 설치 목록에 모델이 있는지 확인 (태그 없는 이름은 `:latest`로 간주)
fn model_installed(models: &[String], name: &str) -> bool {
    models
        .iter()
        .any(|m| m == name || (!name.contains(':') && *m == format!("{}:latest", name)))
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::GenerationOutput;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
    }

    #[test]
    fn test_truncate_unicode() {
        let korean = "안녕하세요 세계";
        let truncated = truncate_text(korean, 5);
        assert_eq!(truncated, "안녕하세요...");
    }

    #[test]
    fn test_chat_command_parse() {
        assert_eq!(ChatCommand::parse("  "), ChatCommand::Empty);
        assert_eq!(ChatCommand::parse("Bye"), ChatCommand::Exit);
        assert_eq!(ChatCommand::parse("quit"), ChatCommand::Exit);
        assert_eq!(ChatCommand::parse("information"), ChatCommand::Info);
        assert_eq!(ChatCommand::parse("LOG"), ChatCommand::Logs);
        assert_eq!(
            ChatCommand::parse(" What is the refund policy? "),
            ChatCommand::Query("What is the refund policy?".to_string())
        );
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "rag-agent",
            "--model",
            "llama3.2",
            "--model-url",
            "127.0.0.1:9999",
            "ask",
            "hello",
            "--top-k",
            "5",
            "--threshold",
            "0.6",
            "--json",
        ])
        .expect("parse");

        let config = cli.apply(AgentConfig::default());
        assert_eq!(config.generation.model, "llama3.2");
        assert_eq!(config.base_url, "http://127.0.0.1:9999");
        assert_eq!(config.retrieval.top_k, 5);
        assert!((config.retrieval.relevance_threshold - 0.6).abs() < f32::EPSILON);
        assert!(matches!(cli.command, Commands::Ask { json: true, .. }));
    }

    #[test]
    fn test_cli_without_overrides_keeps_config() {
        let cli = Cli::try_parse_from(["rag-agent", "status"]).expect("parse");
        assert_eq!(cli.apply(AgentConfig::default()), AgentConfig::default());
    }

    fn trace(result: Generation, tool_used: ToolKind, reason: Option<Vec<String>>) -> QueryTrace {
        QueryTrace {
            query: "What is the flagship product?".to_string(),
            tool_used,
            retrieved_chunks: vec![],
            log: vec![],
            reason,
            result,
        }
    }

    #[test]
    fn test_invalid_model_guidance_names_model_and_url() {
        let config = AgentConfig::default()
            .with_model("nope:7b")
            .with_base_url("127.0.0.1:9999");

        let guidance = sentinel_guidance(&Generation::InvalidModel, &config).expect("guidance");
        assert!(guidance.starts_with("Invalid model."));
        assert!(guidance.contains("'nope:7b'"));
        assert!(guidance.contains("http://127.0.0.1:9999"));
        assert!(guidance.contains("ollama pull nope:7b"));
    }

    #[test]
    fn test_unreachable_guidance_names_url() {
        let config = AgentConfig::default().with_base_url("http://10.0.0.2:11434");

        let guidance =
            sentinel_guidance(&Generation::ServiceUnreachable, &config).expect("guidance");
        assert!(guidance.contains("ollama ps"));
        assert!(guidance.contains("http://10.0.0.2:11434"));
        assert_ne!(
            Some(guidance),
            sentinel_guidance(&Generation::InvalidModel, &config)
        );
    }

    #[test]
    fn test_output_has_no_guidance() {
        let output = Generation::Output(GenerationOutput::from_text("answer", vec![]));
        assert!(sentinel_guidance(&output, &AgentConfig::default()).is_none());
    }

    #[test]
    fn test_render_answer_shows_header_and_reasoning() {
        let result = Generation::Output(GenerationOutput::from_text(
            "The lamp.",
            vec!["checked the catalog".to_string()],
        ));
        let trace = trace(
            result,
            ToolKind::None,
            Some(vec!["checked the catalog".to_string()]),
        );

        let rendered = render_answer(&trace, &AgentConfig::default());
        assert!(rendered.contains("질문: What is the flagship product?"));
        assert!(rendered.contains("도구: none"));
        assert!(rendered.contains("추론:\nchecked the catalog"));
        assert!(rendered.contains("답변:\nThe lamp."));
        assert!(!rendered.contains("검색된 청크:"));
    }

    #[test]
    fn test_render_answer_skips_empty_reasoning() {
        let result = Generation::Output(GenerationOutput::from_text("ok", vec![]));
        let rendered = render_answer(
            &trace(result, ToolKind::None, Some(vec![])),
            &AgentConfig::default(),
        );
        assert!(!rendered.contains("추론:"));
    }

    #[test]
    fn test_render_answer_sentinel_uses_guidance() {
        let rendered = render_answer(
            &trace(Generation::InvalidModel, ToolKind::Rag, None),
            &AgentConfig::default(),
        );
        assert!(rendered.contains("[!] Invalid model."));
        assert!(rendered.contains("ollama pull gemma3:1b"));
    }

    #[test]
    fn test_model_installed() {
        let models = vec!["gemma3:1b".to_string(), "all-minilm:latest".to_string()];
        assert!(model_installed(&models, "gemma3:1b"));
        assert!(model_installed(&models, "all-minilm"));
        assert!(!model_installed(&models, "gemma3"));
        assert!(!model_installed(&models, "llama3.2"));
    }
}
