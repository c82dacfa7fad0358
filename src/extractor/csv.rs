//! CSV 추출 모듈
//!
//! 첫 행을 헤더로 보고, 나머지 각 행을 `헤더: 값` 줄로 이루어진 문서로 변환합니다.
//! 큰따옴표로 감싼 필드(쉼표, 줄바꿈, `""` 이스케이프 포함)를 지원합니다.

/// CSV 텍스트를 레코드 목록으로 파싱
pub fn parse_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }

    records
}

/// 빈 줄은 건너뛰기
fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    if record.iter().all(|f| f.is_empty()) {
        return;
    }
    records.push(record);
}

/// CSV 텍스트를 행 단위 문서로 변환 (행 번호는 0부터)
pub fn rows_to_documents(text: &str) -> Vec<(usize, String)> {
    let mut records = parse_records(text).into_iter();

    let headers = match records.next() {
        Some(h) => h,
        None => return vec![],
    };

    records
        .enumerate()
        .map(|(row, values)| {
            if values.len() > headers.len() {
                tracing::debug!(
                    "CSV row {} has {} extra fields, ignoring them",
                    row,
                    values.len() - headers.len()
                );
            }

            let lines: Vec<String> = headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let value = values.get(i).map(|v| v.trim()).unwrap_or("");
                    format!("{}: {}", header.trim(), value)
                })
                .collect();

            (row, lines.join("\n"))
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let records = parse_records("a,b\n1,2\r\n3,4");
        assert_eq!(records, vec![vec!["a", "b"], vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_parse_quoted_fields() {
        let records = parse_records("name,desc\n\"Widget, large\",\"says \"\"hi\"\"\nbye\"\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1][0], "Widget, large");
        assert_eq!(records[1][1], "says \"hi\"\nbye");
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let records = parse_records("a\n\n1\n\n");
        assert_eq!(records, vec![vec!["a"], vec!["1"]]);
    }

    #[test]
    fn test_rows_to_documents() {
        let docs = rows_to_documents("product, price\nLamp , 20\nDesk,\n");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0], (0, "product: Lamp\nprice: 20".to_string()));
        assert_eq!(docs[1], (1, "product: Desk\nprice: ".to_string()));
    }

    #[test]
    fn test_rows_to_documents_header_only() {
        assert!(rows_to_documents("a,b\n").is_empty());
        assert!(rows_to_documents("").is_empty());
    }
}
