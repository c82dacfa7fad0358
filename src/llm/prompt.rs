//! 프롬프트 템플릿
//!
//! 컨텍스트 유무에 따라 두 가지 템플릿 중 하나를 채웁니다.

use crate::knowledge::ScoredChunk;

/// 검색 컨텍스트가 있을 때의 템플릿
pub const WITH_CONTEXT_TEMPLATE: &str = "\
You are an AI assistant with access to the following information.
Use this information to answer the user's question.
If the information doesn't contain the answer, say so. Do not make up information.
If the question seems nonsensical, say so.

CONTEXT INFORMATION:
{context}

USER QUESTION: {question}";

/// 컨텍스트 없이 모델 지식만 사용하는 템플릿
pub const WITHOUT_CONTEXT_TEMPLATE: &str = "\
You are a helpful AI assistant. Answer the user's question based on your knowledge.
If the question seems nonsensical, say so.

USER QUESTION: {question}";

/// 프롬프트 생성
///
/// `Some`이면 비어 있더라도 컨텍스트 템플릿을 사용합니다.
/// 청크 본문은 빈 줄 하나로 구분해 순서대로 이어 붙입니다.
pub fn build_prompt(query: &str, context: Option<&[ScoredChunk]>) -> String {
    match context {
        Some(chunks) => {
            let joined = chunks
                .iter()
                .map(|c| c.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            render(
                WITH_CONTEXT_TEMPLATE,
                &[("context", &joined), ("question", query)],
            )
        }
        None => render(WITHOUT_CONTEXT_TEMPLATE, &[("question", query)]),
    }
}

/// `{key}` 자리표시자를 한 번에 치환 (치환된 값은 다시 해석하지 않음)
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let matched = values.iter().find_map(|(key, value)| {
            let token_len = key.len() + 2;
            let is_token = tail.len() >= token_len
                && tail[1..].starts_with(key)
                && tail[1 + key.len()..].starts_with('}');
            is_token.then_some((token_len, *value))
        });

        match matched {
            Some((token_len, value)) => {
                out.push_str(value);
                rest = &tail[token_len..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::ChunkMetadata;

    fn chunk(content: &str) -> ScoredChunk {
        ScoredChunk {
            content: content.to_string(),
            metadata: ChunkMetadata::new("doc.txt"),
            relevance_score: 0.9,
        }
    }

    #[test]
    fn test_prompt_without_context() {
        let prompt = build_prompt("Why is the sky blue?", None);
        assert!(prompt.contains("based on your knowledge"));
        assert!(prompt.ends_with("USER QUESTION: Why is the sky blue?"));
        assert!(!prompt.contains("CONTEXT INFORMATION"));
    }

    #[test]
    fn test_prompt_with_context_joins_chunks() {
        let chunks = vec![chunk("first"), chunk("second")];
        let prompt = build_prompt("q?", Some(&chunks));
        assert!(prompt.contains("CONTEXT INFORMATION:\nfirst\n\nsecond\n\nUSER QUESTION: q?"));
    }

    #[test]
    fn test_prompt_empty_context_uses_context_template() {
        let prompt = build_prompt("q?", Some(&[]));
        assert!(prompt.contains("CONTEXT INFORMATION:\n\n\nUSER QUESTION: q?"));
    }

    #[test]
    fn test_render_does_not_reinterpret_values() {
        let chunks = vec![chunk("literal {question} and {x}")];
        let prompt = build_prompt("real?", Some(&chunks));
        assert!(prompt.contains("literal {question} and {x}"));
        assert!(prompt.ends_with("USER QUESTION: real?"));
    }
}
