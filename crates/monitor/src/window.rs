//! 슬라이딩 에러 윈도우
//!
//! 최근 요청 결과(5xx 여부)를 고정 용량 링 버퍼로 유지하며
//! 현재 에러율을 상수 시간에 조회합니다.
//!
//! 레코드마다 갱신이 일어나므로 에러 카운트는 전체 스캔 없이
//! 증분으로만 유지합니다.

use std::collections::VecDeque;

/// 워밍업에 필요한 최소 샘플 수의 하한
///
/// 샘플이 몇 개뿐일 때의 에러율로 알림을 울리지 않기 위한 바닥값입니다
/// (기동 직후나 저트래픽 구간의 오탐 방지).
const MIN_WARM_SAMPLES: usize = 10;

/// 고정 용량 슬라이딩 에러 윈도우
///
/// 불변식: 길이는 항상 용량 이하이며, 가득 찼을 때는
/// 가장 오래된 항목이 FIFO로 축출됩니다.
#[derive(Debug)]
pub struct SlidingErrorWindow {
    /// 결과 버퍼 (true = 5xx)
    outcomes: VecDeque<bool>,
    /// 최대 용량
    capacity: usize,
    /// 현재 윈도우 내 에러 수 (증분 유지)
    error_count: usize,
    /// 워밍업 샘플 수 기준
    warm_floor: usize,
}

impl SlidingErrorWindow {
    /// 지정한 용량의 윈도우를 생성합니다.
    pub fn new(capacity: usize) -> Self {
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
            error_count: 0,
            warm_floor: MIN_WARM_SAMPLES.max(capacity / 10),
        }
    }

    /// 결과 하나를 관찰합니다. 가득 찼으면 가장 오래된 항목을 축출합니다. O(1).
    pub fn observe(&mut self, is_server_error: bool) {
        if self.outcomes.len() == self.capacity
            && let Some(evicted) = self.outcomes.pop_front()
            && evicted
        {
            self.error_count -= 1;
        }
        self.outcomes.push_back(is_server_error);
        if is_server_error {
            self.error_count += 1;
        }
    }

    /// 현재 샘플 수와 에러율을 반환합니다.
    ///
    /// 에러율은 `[0, 1]` 범위의 비율이며, 윈도우가 비어있으면 `0.0`입니다.
    pub fn rate(&self) -> (usize, f64) {
        let count = self.outcomes.len();
        if count == 0 {
            return (0, 0.0);
        }
        (count, self.error_count as f64 / count as f64)
    }

    /// 에러율 추정을 신뢰할 만큼 샘플이 쌓였는지 반환합니다.
    ///
    /// 기준: `count >= max(10, capacity / 10)`. 윈도우가 포화를 향해
    /// 커지기만 하므로 한 번 참이 되면 되돌아가지 않습니다.
    pub fn is_warm(&self) -> bool {
        self.outcomes.len() >= self.warm_floor
    }

    /// 윈도우 용량을 반환합니다.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
