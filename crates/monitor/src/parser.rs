//! 액세스 로그 파서
//!
//! 원시 로그 라인 하나를 [`AccessRecord`]로 디코딩합니다.
//!
//! 테일링 중인 파일에는 동시 기록으로 인한 잘린 라인이 섞여 들어오므로,
//! 파싱 실패는 에러 상황이 아니라 예상되는 노이즈입니다. 호출자는 실패한
//! 라인을 알림도 재시도도 없이 드롭합니다.

use poolwatch_core::types::AccessRecord;

use crate::error::MonitorError;

/// JSON 액세스 로그 파서
///
/// 한 줄에 JSON 객체 하나인 로그 형식을 파싱합니다.
/// 잘못된 UTF-8 시퀀스는 치환 문자로 대체되어 파이프라인을 중단시키지 않습니다.
pub struct AccessLogParser {
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl AccessLogParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self {
            max_input_size: 1024 * 1024, // 1MB
        }
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// 원시 라인 하나를 파싱합니다.
    ///
    /// 실패 사유:
    /// - 입력 크기 초과
    /// - JSON 디코딩 실패
    /// - 최상위 값이 객체가 아님
    ///
    /// 필드 기본값 규칙은 [`AccessRecord::from_value`]에 집중되어 있습니다.
    /// 상태 코드가 깨진 레코드는 실패가 아니라 `status = 0`으로 반환됩니다.
    pub fn parse(&self, raw: &[u8]) -> Result<AccessRecord, MonitorError> {
        if raw.len() > self.max_input_size {
            return Err(MonitorError::Parse {
                reason: format!(
                    "input too large: {} bytes (max: {})",
                    raw.len(),
                    self.max_input_size
                ),
            });
        }

        // 잘린 멀티바이트 시퀀스를 허용하기 위해 lossy 디코딩을 사용합니다
        let text = String::from_utf8_lossy(raw);
        let value: serde_json::Value =
            serde_json::from_str(text.trim()).map_err(|e| MonitorError::Parse {
                reason: e.to_string(),
            })?;

        AccessRecord::from_value(&value).ok_or_else(|| MonitorError::Parse {
            reason: "expected JSON object at top level".to_owned(),
        })
    }
}

impl Default for AccessLogParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_record() {
        let parser = AccessLogParser::new();
        let record = parser
            .parse(br#"{"pool":"blue","status":200,"release":"v7"}"#)
            .unwrap();
        assert_eq!(record.pool, "blue");
        assert_eq!(record.status, 200);
        assert_eq!(record.release, "v7");
    }

    #[test]
    fn parse_trims_surrounding_whitespace() {
        let parser = AccessLogParser::new();
        let record = parser.parse(b"  {\"pool\":\"a\"}\r\n").unwrap();
        assert_eq!(record.pool, "a");
    }

    #[test]
    fn parse_non_json_fails() {
        let parser = AccessLogParser::new();
        assert!(parser.parse(b"not json at all").is_err());
    }

    #[test]
    fn parse_truncated_json_fails() {
        let parser = AccessLogParser::new();
        assert!(parser.parse(br#"{"pool":"blue","sta"#).is_err());
    }

    #[test]
    fn parse_array_top_level_fails() {
        let parser = AccessLogParser::new();
        let result = parser.parse(br#"["not","an","object"]"#);
        assert!(matches!(result, Err(MonitorError::Parse { .. })));
    }

    #[test]
    fn parse_invalid_utf8_is_tolerated() {
        let parser = AccessLogParser::new();
        // 유효한 JSON 구조 안의 깨진 바이트는 치환되어 파싱됩니다
        let mut raw = br#"{"pool":"blu"#.to_vec();
        raw.push(0xFF);
        raw.extend_from_slice(b"\"}");
        // 치환 문자가 끼어도 패닉 없이 Result가 나와야 합니다
        let _ = parser.parse(&raw);
    }

    #[test]
    fn parse_empty_line_fails() {
        let parser = AccessLogParser::new();
        assert!(parser.parse(b"").is_err());
        assert!(parser.parse(b"\n").is_err());
    }

    #[test]
    fn parse_too_large_input_fails() {
        let parser = AccessLogParser::new().with_max_input_size(8);
        let result = parser.parse(br#"{"pool":"this is too long"}"#);
        assert!(matches!(result, Err(MonitorError::Parse { .. })));
    }

    #[test]
    fn parse_bad_status_still_yields_record() {
        let parser = AccessLogParser::new();
        let record = parser
            .parse(br#"{"pool":"green","status":"n/a"}"#)
            .unwrap();
        assert_eq!(record.pool, "green");
        assert_eq!(record.status, 0);
    }
}
