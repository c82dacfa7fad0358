//! 생성 결과 후처리
//!
//! - `<think>…</think>` 추론 구간 분리
//! - 런타임 응답을 [`Generation`] 변형으로 분류

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use super::ollama::ChatResponse;
use super::{new_run_id, Generation, GenerationOutput, UsageInfo};

/// 분류 전 런타임 호출 결과
#[derive(Debug, Clone)]
pub enum RawGeneration {
    /// 2xx 응답 본문
    Completed(ChatResponse),
    /// 런타임이 HTTP 에러 상태로 거부 (알 수 없는 모델 등)
    ModelRejected { status: u16, message: String },
    /// 연결 실패, 타임아웃 등 전송 계층 실패
    Unreachable { reason: String },
}

fn think_regex() -> &'static Regex {
    static THINK_RE: OnceLock<Regex> = OnceLock::new();
    THINK_RE.get_or_init(|| Regex::new(r"(?s)<think>(.*?)</think>").expect("Invalid regex"))
}

/// 추론 구간 분리
///
/// 반환값: (추론 구간을 제거한 텍스트, 추론 조각 목록)
/// 태그는 대소문자를 구분하며 줄바꿈을 포함할 수 있습니다.
/// 제거 후 새로 맞물린 태그도 남지 않도록 더 이상 매치가 없을 때까지 반복합니다.
pub fn extract_reasoning(raw: &str) -> (String, Vec<String>) {
    let re = think_regex();
    let mut text = raw.to_string();
    let mut fragments = Vec::new();

    while re.is_match(&text) {
        fragments.extend(
            re.captures_iter(&text)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
        );
        text = re.replace_all(&text, "").into_owned();
    }

    (text, fragments)
}

/// 런타임 호출 결과를 생성 결과로 분류
pub fn classify_generation_outcome(raw: RawGeneration) -> Generation {
    match raw {
        RawGeneration::Completed(response) => {
            let (content, reasoning) = extract_reasoning(&response.message.content);

            let usage = match (response.prompt_eval_count, response.eval_count) {
                (None, None) => None,
                (input, output) => {
                    let input_tokens = input.unwrap_or(0);
                    let output_tokens = output.unwrap_or(0);
                    Some(UsageInfo {
                        input_tokens,
                        output_tokens,
                        total_tokens: input_tokens + output_tokens,
                    })
                }
            };

            let created_at = response
                .created_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc));

            Generation::Output(GenerationOutput {
                content,
                reasoning,
                id: new_run_id(),
                model: response.model,
                created_at,
                done_reason: response.done_reason,
                usage,
                total_duration_ns: response.total_duration,
            })
        }
        RawGeneration::ModelRejected { status, message } => {
            tracing::warn!("Model rejected by runtime (HTTP {}): {}", status, message);
            Generation::InvalidModel
        }
        RawGeneration::Unreachable { reason } => {
            tracing::warn!("LLM service unreachable: {}", reason);
            Generation::ServiceUnreachable
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
