//! 알림 싱크 구현체
//!
//! - [`WebhookSink`]: Slack 호환 웹훅으로 알림을 POST합니다.
//! - [`ConsoleSink`]: 웹훅이 설정되지 않았을 때 알림을 로컬 로그로만 출력합니다.

use std::time::Duration;

use async_trait::async_trait;

use poolwatch_core::error::SinkError;
use poolwatch_core::pipeline::AlertSink;

/// Slack 호환 웹훅 싱크
///
/// 메시지를 `{"text": "..."}` JSON 페이로드로 POST합니다.
/// 클라이언트 타임아웃이 전송 시간의 상한이므로, 싱크 호출이
/// 이후 로그 라인 수집을 타임아웃보다 오래 막지 않습니다.
pub struct WebhookSink {
    /// 웹훅 엔드포인트
    url: String,
    /// 재사용되는 HTTP 클라이언트 (타임아웃 내장)
    client: reqwest::Client,
}

impl WebhookSink {
    /// 새 웹훅 싱크를 생성합니다.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::Transport {
                reason: e.to_string(),
            })?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// 전송할 JSON 페이로드를 구성합니다.
    fn payload(message: &str) -> serde_json::Value {
        serde_json::json!({ "text": message })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, message: &str) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .json(&Self::payload(message))
            .send()
            .await
            .map_err(|e| SinkError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// 콘솔 싱크
///
/// 웹훅 엔드포인트가 설정되지 않은 배포에서 알림을 운영자 로그로만
/// 노출합니다. 전송은 항상 성공합니다.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    /// 새 콘솔 싱크를 생성합니다.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AlertSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn send(&self, message: &str) -> Result<(), SinkError> {
        tracing::info!(alert = %message, "no webhook configured, alert surfaced locally");
        Ok(())
    }
}
