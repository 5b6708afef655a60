//! 에러 타입 — 도메인별 에러 정의

/// Poolwatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum PoolwatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 로그 소스 에러
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// 알림 싱크 에러
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
///
/// 배포 설정 오류를 의미하므로 시작 시점에 치명적(fatal)으로 처리됩니다.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 로그 소스 에러
///
/// 소스 구현체는 일시적 장애(파일 없음, 로테이션)를 내부에서 재시도하므로,
/// 이 에러가 호출자에게 전파되는 경우는 복구 불가능한 상황뿐입니다.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// 소스 열기 실패
    #[error("failed to open source '{path}': {reason}")]
    Open { path: String, reason: String },

    /// 소스 읽기 실패
    #[error("failed to read from source '{path}': {reason}")]
    Read { path: String, reason: String },
}

/// 알림 싱크 에러
///
/// 싱크 전송 실패는 파이프라인을 중단시키지 않습니다.
/// 호출자는 로깅만 하고 다음 레코드를 계속 처리합니다.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// 전송 실패 (네트워크, 타임아웃 등)
    #[error("transport failure: {reason}")]
    Transport { reason: String },

    /// 비정상 응답 코드 (2xx 이외)
    #[error("unexpected response status: {status}")]
    Status { status: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "monitor.window_size".to_owned(),
            reason: "must be at least 1".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("monitor.window_size"));
        assert!(msg.contains("must be at least 1"));
    }

    #[test]
    fn source_error_display() {
        let err = SourceError::Open {
            path: "/var/log/nginx/access.log".to_owned(),
            reason: "permission denied".to_owned(),
        };
        assert!(err.to_string().contains("access.log"));
    }

    #[test]
    fn sink_error_status_display() {
        let err = SinkError::Status { status: 429 };
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn converts_to_poolwatch_error() {
        let err: PoolwatchError = ConfigError::ParseFailed {
            reason: "bad toml".to_owned(),
        }
        .into();
        assert!(matches!(err, PoolwatchError::Config(_)));
    }
}
