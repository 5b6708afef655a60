//! 모니터 파이프라인 에러 타입

use poolwatch_core::error::{ConfigError, PoolwatchError};

/// 모니터 도메인 에러
///
/// 파싱 실패는 파이프라인에서 조용히 드롭되는 것이 계약이므로,
/// 이 에러가 상위로 전파되는 일은 설정/조립 단계에서만 발생합니다.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// 로그 라인 파싱 실패
    ///
    /// 동시 기록 중인 파일을 테일링할 때 잘린 라인은 정상적인 노이즈입니다.
    #[error("parse error: {reason}")]
    Parse {
        /// 실패 사유
        reason: String,
    },

    /// 파이프라인 조립 실패 (필수 구성 요소 누락 등)
    #[error("build error: {field}: {reason}")]
    Build {
        /// 누락/문제가 된 구성 요소
        field: String,
        /// 실패 사유
        reason: String,
    },
}

impl From<MonitorError> for PoolwatchError {
    fn from(err: MonitorError) -> Self {
        PoolwatchError::Config(ConfigError::InvalidValue {
            field: "monitor".to_owned(),
            reason: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = MonitorError::Parse {
            reason: "expected JSON object at top level".to_owned(),
        };
        assert!(err.to_string().contains("expected JSON object"));
    }

    #[test]
    fn converts_to_poolwatch_error() {
        let err = MonitorError::Build {
            field: "sink".to_owned(),
            reason: "sink is required".to_owned(),
        };
        let top: PoolwatchError = err.into();
        assert!(matches!(top, PoolwatchError::Config(_)));
    }
}
