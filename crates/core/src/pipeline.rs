//! 파이프라인 trait — 모듈 확장 포인트 정의

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{SinkError, SourceError};

/// 추가 전용(append-only) 라인 소스 trait
///
/// 파일, 소켓, 메시지 큐 등 새로운 로그 소스를 지원하려면 이 trait을 구현합니다.
///
/// # 계약
/// - 시퀀스는 lazy하고 무한하며 재시작되지 않습니다.
/// - 새 라인이 없으면 `next_line`은 완료되지 않고 대기합니다 (poll + sleep 허용).
/// - 정상 운영 중에는 end-of-stream을 반환하지 않습니다.
/// - 일시적 장애(소스 없음, 로테이션)는 구현체 내부에서 무한 재시도합니다.
#[async_trait]
pub trait LineSource: Send {
    /// 소스 식별자 (로깅에 사용)
    fn name(&self) -> &str;

    /// 다음 라인 하나를 반환합니다. 새 데이터가 있을 때까지 대기합니다.
    async fn next_line(&mut self) -> Result<Bytes, SourceError>;
}

/// 알림 싱크 trait
///
/// 새로운 알림 전달 수단을 지원하려면 이 trait을 구현합니다.
///
/// # 계약
/// - `send`는 짧은 타임아웃 안에 완료되어야 합니다 (무한 블로킹 금지).
/// - 전송 실패는 호출자가 로깅만 하고 계속 진행합니다. 재시도는 없습니다.
/// - 메시지 본문은 불투명한 일반 텍스트입니다.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// 싱크 식별자 (로깅에 사용)
    fn name(&self) -> &str;

    /// 렌더링된 알림 메시지 하나를 전송합니다.
    async fn send(&self, message: &str) -> Result<(), SinkError>;
}
