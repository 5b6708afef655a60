//! 알림 쿨다운 게이트
//!
//! 알림 키별 마지막 발송 시각을 추적하여, 쿨다운 간격 안의
//! 동일 알림 반복을 억제합니다. 알림 폭주를 막는 단일 동기화 지점입니다.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

/// 알림 키별 쿨다운 게이트
///
/// 키 공간은 운영자가 통제하는 유한 집합입니다 — 관찰된 `(from, to)`
/// 풀 쌍마다 하나씩, 그리고 고정 `error_rate` 키 하나. 따라서 엔트리는
/// 축출 정책 없이 프로세스 수명 동안 유지됩니다.
///
/// 타임스탬프는 벽시계 기준이므로 시계 조정 시 동작이 흔들릴 수 있습니다.
/// 벽시계 단조성은 가정이지 이 설계가 보장하는 불변식이 아닙니다.
#[derive(Debug)]
pub struct AlertCooldownGate {
    /// 쿨다운 간격
    cooldown: Duration,
    /// 키별 마지막 발송 시각 (최초 발송 시 lazy 생성)
    last_fired: HashMap<String, SystemTime>,
}

impl AlertCooldownGate {
    /// 지정한 쿨다운 간격으로 게이트를 생성합니다.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: HashMap::new(),
        }
    }

    /// 키의 발송 허용 여부를 판정합니다.
    ///
    /// 키가 한 번도 발송되지 않았거나 `now - last > cooldown`일 때만
    /// `true`를 반환하며, 이때 `now`를 새 발송 시각으로 기록합니다.
    ///
    /// 경계는 엄격 부등호입니다: 정확히 쿨다운 경계 시각의 이벤트는
    /// 억제됩니다 ("재발송하려면 쿨다운을 초과해야 한다").
    /// 시계가 뒤로 간 경우(`duration_since` 실패)도 억제로 처리합니다.
    pub fn admit(&mut self, key: &str, now: SystemTime) -> bool {
        if let Some(last) = self.last_fired.get(key) {
            let exceeded = now
                .duration_since(*last)
                .map(|elapsed| elapsed > self.cooldown)
                .unwrap_or(false);
            if !exceeded {
                return false;
            }
        }
        self.last_fired.insert(key.to_owned(), now);
        true
    }

    /// 추적 중인 알림 키 수를 반환합니다.
    pub fn tracked_keys(&self) -> usize {
        self.last_fired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn first_fire_is_admitted() {
        let mut gate = AlertCooldownGate::new(Duration::from_secs(300));
        assert!(gate.admit("error_rate", at(1000)));
        assert_eq!(gate.tracked_keys(), 1);
    }

    #[test]
    fn repeat_within_cooldown_is_suppressed() {
        let mut gate = AlertCooldownGate::new(Duration::from_secs(300));
        assert!(gate.admit("error_rate", at(1000)));
        assert!(!gate.admit("error_rate", at(1100)));
    }

    #[test]
    fn boundary_is_strictly_exceeded() {
        let mut gate = AlertCooldownGate::new(Duration::from_secs(300));
        assert!(gate.admit("error_rate", at(1000)));
        // 정확히 경계 시각: 억제
        assert!(!gate.admit("error_rate", at(1300)));
        // 경계 + ε: 허용
        assert!(gate.admit(
            "error_rate",
            at(1300) + Duration::from_nanos(1)
        ));
    }

    #[test]
    fn suppression_does_not_reset_timer() {
        let mut gate = AlertCooldownGate::new(Duration::from_secs(300));
        assert!(gate.admit("error_rate", at(1000)));
        assert!(!gate.admit("error_rate", at(1299)));
        // 억제된 시도가 타이머를 갱신하지 않았으므로 1301에는 허용됩니다
        assert!(gate.admit("error_rate", at(1301)));
    }

    #[test]
    fn distinct_keys_are_independent() {
        let mut gate = AlertCooldownGate::new(Duration::from_secs(300));
        assert!(gate.admit("flip_a_to_b", at(1000)));
        // A→B 발송이 B→A를 억제하지 않습니다
        assert!(gate.admit("flip_b_to_a", at(1000)));
        assert!(!gate.admit("flip_a_to_b", at(1001)));
        assert_eq!(gate.tracked_keys(), 2);
    }

    #[test]
    fn clock_rollback_is_suppressed() {
        let mut gate = AlertCooldownGate::new(Duration::from_secs(300));
        assert!(gate.admit("error_rate", at(1000)));
        assert!(!gate.admit("error_rate", at(500)));
    }

    #[test]
    fn zero_cooldown_requires_any_elapsed_time() {
        let mut gate = AlertCooldownGate::new(Duration::ZERO);
        assert!(gate.admit("error_rate", at(1000)));
        // 경과 0 > 쿨다운 0 은 거짓이므로 같은 시각 재발송은 억제
        assert!(!gate.admit("error_rate", at(1000)));
        assert!(gate.admit("error_rate", at(1000) + Duration::from_nanos(1)));
    }
}
