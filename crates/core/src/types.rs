//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 모든 워크스페이스 멤버가 공유하는 데이터 구조를 정의합니다.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 파싱된 액세스 로그 레코드
///
/// nginx JSON 액세스 로그 한 줄을 타입화한 결과입니다.
/// 필드 기본값 규칙은 [`AccessRecord::from_value`]에서 한 곳에 집중됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    /// 요청을 처리한 백엔드 풀 식별자 (비어있거나 누락 시 "unknown")
    pub pool: String,
    /// HTTP 상태 코드 (누락/파싱 불가 시 0)
    pub status: u16,
    /// 업스트림 상태 체인 원문 (알림 본문에만 사용)
    pub upstream_status: String,
    /// 업스트림 주소 원문 (알림 본문에만 사용)
    pub upstream_addr: String,
    /// 배포 릴리스 식별자 원문 (알림 본문에만 사용)
    pub release: String,
}

impl AccessRecord {
    /// JSON 객체에서 레코드를 생성합니다.
    ///
    /// 최상위 값이 객체가 아니면 `None`을 반환합니다.
    /// 필드 기본값 규칙:
    /// - `pool`: 누락, null, 빈 문자열 → `"unknown"`
    /// - `status`: 숫자 또는 숫자 문자열 허용, 그 외 → `0`
    /// - 나머지 문자열 필드: 누락/null → 빈 문자열
    ///
    /// 알 수 없는 추가 필드는 무시됩니다.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;

        let pool = match obj.get("pool").and_then(|v| v.as_str()) {
            Some(p) if !p.is_empty() => p.to_owned(),
            _ => "unknown".to_owned(),
        };

        // 상태 코드가 깨진 레코드도 풀 플립 감지에는 유효하므로 0으로 강제합니다
        let status = match obj.get("status") {
            Some(serde_json::Value::Number(n)) => {
                n.as_u64().and_then(|s| u16::try_from(s).ok()).unwrap_or(0)
            }
            Some(serde_json::Value::String(s)) => s.parse::<u16>().unwrap_or(0),
            _ => 0,
        };

        Some(Self {
            pool,
            status,
            upstream_status: string_field(obj, "upstream_status"),
            upstream_addr: string_field(obj, "upstream_addr"),
            release: string_field(obj, "release"),
        })
    }

    /// 5xx 서버 에러 여부를 반환합니다.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

fn string_field(obj: &serde_json::Map<String, serde_json::Value>, key: &str) -> String {
    obj.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_owned()
}

impl fmt::Display for AccessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool={} status={}", self.pool, self.status)
    }
}

/// 백엔드 풀 변경(failover) 이벤트
///
/// 연속된 두 레코드 사이에서 관찰된 풀 식별자의 변경을 나타냅니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlipEvent {
    /// 이전 풀
    pub from: String,
    /// 새 풀
    pub to: String,
}

impl FlipEvent {
    /// 쿨다운 게이트에서 사용할 알림 키를 반환합니다.
    ///
    /// `(from, to)` 순서쌍마다 별도 키를 사용하므로
    /// A→B 알림이 B→A 알림을 억제하지 않습니다.
    pub fn gate_key(&self) -> String {
        format!("flip_{}_to_{}", self.from, self.to)
    }
}

impl fmt::Display for FlipEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// 운영자에게 전달될 알림
///
/// 싱크 입장에서 알림 본문은 불투명한 일반 텍스트입니다.
#[derive(Debug, Clone)]
pub struct Alert {
    /// 알림 ID
    pub id: String,
    /// 짧은 제목
    pub title: String,
    /// 상세 설명 한 줄
    pub details: String,
    /// 생성 시각 (UTC)
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// 새 알림을 생성합니다.
    pub fn new(title: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            details: details.into(),
            created_at: Utc::now(),
        }
    }

    /// 싱크로 전송할 텍스트를 렌더링합니다.
    ///
    /// 형식: `[<ISO-8601 UTC>] *<제목>*` 다음 줄에 상세 설명.
    pub fn render(&self) -> String {
        format!(
            "[{}] *{}*\n{}",
            self.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.title,
            self.details,
        )
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", &self.id[..8.min(self.id.len())], self.title)
    }
}
