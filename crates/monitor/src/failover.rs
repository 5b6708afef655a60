//! 풀 플립(failover) 탐지기
//!
//! 마지막으로 관찰된 백엔드 풀 식별자를 추적하고, 값이 바뀌는 순간
//! [`FlipEvent`]를 방출합니다.

use poolwatch_core::types::FlipEvent;

/// 백엔드 풀 변경 탐지기
///
/// 상태 기계: `Unset` (초기) → `Tracking(pool)`.
/// 첫 관찰은 비교 대상이 없으므로 이벤트를 방출하지 않습니다.
///
/// 동일 풀 쌍의 반복 플립을 중복 제거하지 않습니다 — 그것은
/// `(from, to)` 키로 동작하는 쿨다운 게이트의 책임입니다.
#[derive(Debug, Default)]
pub struct FailoverDetector {
    /// 마지막으로 관찰된 풀 (초기에는 없음)
    current: Option<String>,
}

impl FailoverDetector {
    /// 새 탐지기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 레코드의 풀 식별자를 관찰합니다.
    ///
    /// 풀이 직전 관찰값과 다르면 `Some(FlipEvent)`를 반환하고
    /// 새 풀을 추적 대상으로 전환합니다.
    pub fn observe(&mut self, pool: &str) -> Option<FlipEvent> {
        match self.current.as_deref() {
            None => {
                self.current = Some(pool.to_owned());
                None
            }
            Some(current) if current == pool => None,
            Some(current) => {
                let event = FlipEvent {
                    from: current.to_owned(),
                    to: pool.to_owned(),
                };
                self.current = Some(pool.to_owned());
                Some(event)
            }
        }
    }

    /// 현재 추적 중인 풀을 반환합니다.
    pub fn current_pool(&self) -> Option<&str> {
        self.current.as_deref()
    }
}
