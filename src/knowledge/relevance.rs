//! 관련도 점수
//!
//! 벡터 거리를 (0, 1] 구간의 관련도 점수로 변환합니다.
//! `score = 1 / (1 + distance)` 이며 거리에 대해 단조 감소합니다.

use crate::config::DEFAULT_RELEVANCE_THRESHOLD;
use crate::error::{RagError, Result};

/// 거리 → 관련도 점수
///
/// 음수 또는 NaN 거리는 저장소 계약 위반이므로 에러를 반환합니다.
pub fn score(distance: f32) -> Result<f32> {
    if distance.is_nan() || distance < 0.0 {
        return Err(RagError::InvalidDistance(distance));
    }
    Ok(1.0 / (1.0 + distance))
}

/// 관련도 수용 정책
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevancePolicy {
    /// 이 값을 초과하는 점수만 관련 있음으로 판단
    pub threshold: f32,
}

impl Default for RelevancePolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_RELEVANCE_THRESHOLD,
        }
    }
}

impl RelevancePolicy {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// 점수가 임계값을 초과하는지
    pub fn is_relevant(&self, score: f32) -> bool {
        score > self.threshold
    }
}
