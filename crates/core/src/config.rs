//! 설정 관리 — poolwatch.toml 파싱 및 런타임 설정
//!
//! [`PoolwatchConfig`]는 데몬 전체의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, 데몬에서 적용)
//! 2. 환경변수 (`POOLWATCH_MONITOR_WINDOW_SIZE=500` 형식)
//! 3. 설정 파일 (`poolwatch.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! 환경변수의 숫자 값이 파싱되지 않으면 배포 설정 오류로 간주하여
//! 에러를 반환합니다 (무시하지 않음).
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), poolwatch_core::error::PoolwatchError> {
//! use poolwatch_core::config::PoolwatchConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = PoolwatchConfig::load("poolwatch.toml").await?;
//!
//! // 파일 없이 기본값 + 환경변수만 사용
//! let config = PoolwatchConfig::from_env()?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, PoolwatchError};

/// Poolwatch 통합 설정
///
/// `poolwatch.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolwatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 로그 소스 설정
    #[serde(default)]
    pub source: SourceConfig,
    /// 모니터 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// 알림 싱크 설정
    #[serde(default)]
    pub sink: SinkConfig,
}

impl PoolwatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PoolwatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, PoolwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PoolwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                PoolwatchError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, PoolwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            PoolwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 설정 파일 없이 기본값 + 환경변수만으로 설정을 구성합니다.
    pub fn from_env() -> Result<Self, PoolwatchError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `POOLWATCH_{SECTION}_{FIELD}`
    /// 예: `POOLWATCH_SOURCE_LOG_PATH=/var/log/nginx/access.log`
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // General
        override_string(&mut self.general.log_level, "POOLWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "POOLWATCH_GENERAL_LOG_FORMAT");

        // Source
        override_string(&mut self.source.log_path, "POOLWATCH_SOURCE_LOG_PATH");
        override_u64(
            &mut self.source.poll_interval_ms,
            "POOLWATCH_SOURCE_POLL_INTERVAL_MS",
        )?;
        override_u64(
            &mut self.source.missing_poll_interval_ms,
            "POOLWATCH_SOURCE_MISSING_POLL_INTERVAL_MS",
        )?;
        override_bool(
            &mut self.source.read_from_start,
            "POOLWATCH_SOURCE_READ_FROM_START",
        )?;
        override_usize(
            &mut self.source.max_line_length,
            "POOLWATCH_SOURCE_MAX_LINE_LENGTH",
        )?;

        // Monitor
        override_usize(&mut self.monitor.window_size, "POOLWATCH_MONITOR_WINDOW_SIZE")?;
        override_f64(
            &mut self.monitor.error_rate_threshold,
            "POOLWATCH_MONITOR_ERROR_RATE_THRESHOLD",
        )?;
        override_u64(
            &mut self.monitor.alert_cooldown_secs,
            "POOLWATCH_MONITOR_ALERT_COOLDOWN_SECS",
        )?;
        override_bool(
            &mut self.monitor.suppress_alerts,
            "POOLWATCH_MONITOR_SUPPRESS_ALERTS",
        )?;

        // Sink
        override_string(&mut self.sink.webhook_url, "POOLWATCH_SINK_WEBHOOK_URL");
        override_u64(&mut self.sink.timeout_secs, "POOLWATCH_SINK_TIMEOUT_SECS")?;

        Ok(())
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), PoolwatchError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.source.log_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "source.log_path".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.source.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "source.poll_interval_ms".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        if self.source.missing_poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "source.missing_poll_interval_ms".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        if self.source.max_line_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "source.max_line_length".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        if self.monitor.window_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.window_size".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        if !(0.0..=100.0).contains(&self.monitor.error_rate_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "monitor.error_rate_threshold".to_owned(),
                reason: "must be a percentage in 0-100".to_owned(),
            }
            .into());
        }

        if self.sink.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sink.timeout_secs".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 로그 소스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// 감시할 액세스 로그 경로
    pub log_path: String,
    /// 새 라인이 없을 때 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 파일이 아직 없을 때 존재 확인 주기 (밀리초)
    pub missing_poll_interval_ms: u64,
    /// 파일 처음부터 읽기 (기본: 끝에서 시작)
    pub read_from_start: bool,
    /// 최대 라인 길이 (바이트)
    pub max_line_length: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            log_path: "/var/log/nginx/access.log".to_owned(),
            poll_interval_ms: 100,
            missing_poll_interval_ms: 500,
            read_from_start: false,
            max_line_length: 64 * 1024, // 64KB
        }
    }
}

/// 모니터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// 슬라이딩 윈도우 크기
    pub window_size: usize,
    /// 에러율 알림 임계값 (퍼센트)
    pub error_rate_threshold: f64,
    /// 동일 알림 키의 최소 재발송 간격 (초)
    pub alert_cooldown_secs: u64,
    /// 알림 억제 모드 (유지보수 중 전체 알림 비활성화)
    pub suppress_alerts: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_size: 200,
            error_rate_threshold: 2.0,
            alert_cooldown_secs: 300,
            suppress_alerts: false,
        }
    }
}

/// 알림 싱크 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// 웹훅 엔드포인트 (비어있으면 알림을 로컬에만 출력)
    pub webhook_url: String,
    /// 전송 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            timeout_secs: 5,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---
// 숫자/불리언 파싱 실패는 배포 오류이므로 에러로 전파합니다.

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        debug!(key = env_key, "applying environment override");
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) -> Result<(), ConfigError> {
    if let Ok(val) = std::env::var(env_key) {
        debug!(key = env_key, "applying environment override");
        *target = parse_env(env_key, &val)?;
    }
    Ok(())
}

fn override_usize(target: &mut usize, env_key: &str) -> Result<(), ConfigError> {
    if let Ok(val) = std::env::var(env_key) {
        debug!(key = env_key, "applying environment override");
        *target = parse_env(env_key, &val)?;
    }
    Ok(())
}

fn override_u64(target: &mut u64, env_key: &str) -> Result<(), ConfigError> {
    if let Ok(val) = std::env::var(env_key) {
        debug!(key = env_key, "applying environment override");
        *target = parse_env(env_key, &val)?;
    }
    Ok(())
}

fn override_f64(target: &mut f64, env_key: &str) -> Result<(), ConfigError> {
    if let Ok(val) = std::env::var(env_key) {
        debug!(key = env_key, "applying environment override");
        *target = parse_env(env_key, &val)?;
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(env_key: &str, val: &str) -> Result<T, ConfigError> {
    val.parse::<T>().map_err(|_| ConfigError::InvalidValue {
        field: env_key.to_owned(),
        reason: format!("failed to parse env value '{}'", val),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = PoolwatchConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.monitor.window_size, 200);
        assert_eq!(config.monitor.error_rate_threshold, 2.0);
        assert_eq!(config.monitor.alert_cooldown_secs, 300);
        assert!(!config.monitor.suppress_alerts);
        assert!(config.sink.webhook_url.is_empty());
        assert_eq!(config.sink.timeout_secs, 5);
    }

    #[test]
    fn default_config_passes_validation() {
        let config = PoolwatchConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let config = PoolwatchConfig::parse("").unwrap();
        assert_eq!(config.monitor.window_size, 200);
    }

    #[test]
    fn parse_partial_toml() {
        let config = PoolwatchConfig::parse(
            "[monitor]\nwindow_size = 50\nerror_rate_threshold = 10.0\n",
        )
        .unwrap();
        assert_eq!(config.monitor.window_size, 50);
        assert_eq!(config.monitor.error_rate_threshold, 10.0);
        // 나머지 섹션은 기본값
        assert_eq!(config.source.poll_interval_ms, 100);
    }

    #[test]
    fn parse_invalid_toml_fails() {
        let result = PoolwatchConfig::parse("not [valid toml");
        assert!(matches!(
            result,
            Err(PoolwatchError::Config(ConfigError::ParseFailed { .. }))
        ));
    }

    #[test]
    fn validate_rejects_zero_window() {
        let mut config = PoolwatchConfig::default();
        config.monitor.window_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_threshold_out_of_range() {
        let mut config = PoolwatchConfig::default();
        config.monitor.error_rate_threshold = 150.0;
        assert!(config.validate().is_err());
        config.monitor.error_rate_threshold = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_log_format() {
        let mut config = PoolwatchConfig::default();
        config.general.log_format = "xml".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_log_path() {
        let mut config = PoolwatchConfig::default();
        config.source.log_path = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn env_override_applies() {
        // SAFETY: serial 테스트 안에서만 환경변수를 변경합니다
        unsafe {
            std::env::set_var("POOLWATCH_MONITOR_WINDOW_SIZE", "500");
        }
        let mut config = PoolwatchConfig::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.monitor.window_size, 500);
        unsafe {
            std::env::remove_var("POOLWATCH_MONITOR_WINDOW_SIZE");
        }
    }

    #[test]
    #[serial]
    fn env_override_bad_number_is_fatal() {
        unsafe {
            std::env::set_var("POOLWATCH_MONITOR_ALERT_COOLDOWN_SECS", "five minutes");
        }
        let mut config = PoolwatchConfig::default();
        let result = config.apply_env_overrides();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        unsafe {
            std::env::remove_var("POOLWATCH_MONITOR_ALERT_COOLDOWN_SECS");
        }
    }

    #[test]
    #[serial]
    fn env_override_suppress_flag() {
        unsafe {
            std::env::set_var("POOLWATCH_MONITOR_SUPPRESS_ALERTS", "true");
        }
        let mut config = PoolwatchConfig::default();
        config.apply_env_overrides().unwrap();
        assert!(config.monitor.suppress_alerts);
        unsafe {
            std::env::remove_var("POOLWATCH_MONITOR_SUPPRESS_ALERTS");
        }
    }

    #[tokio::test]
    async fn from_file_missing_reports_not_found() {
        let result = PoolwatchConfig::from_file("/nonexistent/poolwatch.toml").await;
        assert!(matches!(
            result,
            Err(PoolwatchError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn load_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poolwatch.toml");
        tokio::fs::write(
            &path,
            "[sink]\nwebhook_url = \"https://hooks.example.com/T000/B000\"\ntimeout_secs = 3\n",
        )
        .await
        .unwrap();

        let config = PoolwatchConfig::load(&path).await.unwrap();
        assert_eq!(config.sink.webhook_url, "https://hooks.example.com/T000/B000");
        assert_eq!(config.sink.timeout_secs, 3);
    }
}
