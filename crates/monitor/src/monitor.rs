//! 모니터 오케스트레이션 — 테일링/파싱/탐지/알림의 전체 흐름을 관리합니다.
//!
//! # 내부 아키텍처
//! ```text
//! LineSource -> AccessLogParser -> {FailoverDetector, SlidingErrorWindow}
//!            -> candidate alerts -> AlertCooldownGate -> AlertSink
//! ```
//!
//! 레코드는 도착 순서대로 하나씩 처리됩니다. 윈도우/탐지기/게이트는
//! 스레드 안전하지 않으며 [`Monitor`]가 단독 소유합니다.

use std::time::SystemTime;

use poolwatch_core::config::MonitorConfig;
use poolwatch_core::error::PoolwatchError;
use poolwatch_core::pipeline::{AlertSink, LineSource};
use poolwatch_core::types::Alert;

use crate::cooldown::AlertCooldownGate;
use crate::error::MonitorError;
use crate::failover::FailoverDetector;
use crate::parser::AccessLogParser;
use crate::window::SlidingErrorWindow;

/// 에러율 알림의 고정 쿨다운 키
const ERROR_RATE_KEY: &str = "error_rate";

/// 모니터 처리 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// 파싱에 성공해 파이프라인을 통과한 레코드 수
    pub processed: u64,
    /// 드롭된 파싱 실패 라인 수
    pub parse_errors: u64,
    /// 싱크로 전송된 알림 수
    pub alerts_sent: u64,
    /// 쿨다운 게이트에 억제된 알림 수
    pub alerts_suppressed: u64,
    /// 싱크 전송 실패 수 (해당 이벤트는 유실)
    pub send_failures: u64,
}

/// 로그 모니터 — 파이프라인 전체를 소유하고 구동합니다.
///
/// # 사용 예시
/// ```ignore
/// use poolwatch_monitor::{MonitorBuilder, FileLineSource, ConsoleSink};
///
/// let mut monitor = MonitorBuilder::new()
///     .config(config.monitor.clone())
///     .source(FileLineSource::new(config.source.clone()))
///     .sink(ConsoleSink::new())
///     .build()?;
/// monitor.run().await?;
/// ```
pub struct Monitor {
    /// 모니터 설정
    config: MonitorConfig,
    /// 라인 소스
    source: Box<dyn LineSource>,
    /// 알림 싱크
    sink: Box<dyn AlertSink>,
    /// 레코드 파서
    parser: AccessLogParser,
    /// 슬라이딩 에러 윈도우
    window: SlidingErrorWindow,
    /// 풀 플립 탐지기
    detector: FailoverDetector,
    /// 알림 쿨다운 게이트
    gate: AlertCooldownGate,
    /// 처리 통계
    stats: MonitorStats,
}

impl Monitor {
    /// 모니터 루프를 실행합니다.
    ///
    /// 라인 소스는 무한 시퀀스이므로 이 메서드는 외부에서 종료될 때까지
    /// (프로세스 시그널, 태스크 중단) 반환하지 않습니다. 소스가 복구
    /// 불가능한 에러를 반환한 경우에만 `Err`로 끝납니다.
    pub async fn run(&mut self) -> Result<(), PoolwatchError> {
        tracing::info!(
            source = self.source.name(),
            sink = self.sink.name(),
            window_size = self.window.capacity(),
            threshold_pct = self.config.error_rate_threshold,
            cooldown_secs = self.config.alert_cooldown_secs,
            suppress_alerts = self.config.suppress_alerts,
            "monitor started"
        );

        loop {
            let line = self.source.next_line().await?;
            self.process_line(&line).await;
        }
    }

    /// 원시 로그 라인 하나를 파이프라인에 통과시킵니다.
    ///
    /// 처리 순서는 고정입니다:
    /// (a) 억제 모드면 이 레코드의 모든 처리를 건너뜀 (전역 바이패스),
    /// (b) 파싱 — 실패 시 조용히 드롭,
    /// (c) 풀 플립 탐지 + 쿨다운 게이트,
    /// (d) 윈도우 갱신 + 에러율 판정 + 쿨다운 게이트.
    ///
    /// (c)와 (d)는 독립적이어서 한 레코드가 두 알림을 모두 유발할 수 있습니다.
    pub async fn process_line(&mut self, raw: &[u8]) {
        // (a) 전역 억제: 윈도우도 탐지기도 갱신하지 않습니다
        if self.config.suppress_alerts {
            return;
        }

        // (b) 잘린 라인은 동시 기록의 예상 노이즈이므로 에스컬레이션 없이 드롭
        let record = match self.parser.parse(raw) {
            Ok(record) => record,
            Err(e) => {
                self.stats.parse_errors += 1;
                tracing::trace!(error = %e, "dropped unparsable line");
                return;
            }
        };
        self.stats.processed += 1;

        // (c) 풀 플립 탐지
        if let Some(flip) = self.detector.observe(&record.pool) {
            tracing::info!(from = %flip.from, to = %flip.to, "pool flip observed");
            if self.gate.admit(&flip.gate_key(), SystemTime::now()) {
                let alert = Alert::new(
                    "Failover detected",
                    format!(
                        "{} | release={} | upstream_status={} | upstream={}",
                        flip, record.release, record.upstream_status, record.upstream_addr,
                    ),
                );
                self.dispatch(alert).await;
            } else {
                self.stats.alerts_suppressed += 1;
                tracing::debug!(key = %flip.gate_key(), "alert suppressed by cooldown");
            }
        }

        // (d) 에러율 판정
        self.window.observe(record.is_server_error());
        if self.window.is_warm() {
            let (count, rate) = self.window.rate();
            let rate_pct = rate * 100.0;
            if rate_pct >= self.config.error_rate_threshold {
                if self.gate.admit(ERROR_RATE_KEY, SystemTime::now()) {
                    let alert = Alert::new(
                        "Elevated 5xx error rate",
                        format!(
                            "{:.2}% 5xx over last {} requests (threshold {}%)",
                            rate_pct, count, self.config.error_rate_threshold,
                        ),
                    );
                    self.dispatch(alert).await;
                } else {
                    self.stats.alerts_suppressed += 1;
                    tracing::debug!(key = ERROR_RATE_KEY, "alert suppressed by cooldown");
                }
            }
        }
    }

    /// 게이트를 통과한 알림 하나를 싱크로 전송합니다.
    ///
    /// 전송 실패는 로깅만 하고 파이프라인을 계속합니다. 재시도는 없으며
    /// 해당 이벤트는 유실된 것으로 간주합니다 — 다음에 게이트를 통과하는
    /// 이벤트가 다시 전송을 시도합니다.
    async fn dispatch(&mut self, alert: Alert) {
        tracing::info!(alert_id = %alert.id, title = %alert.title, "dispatching alert");
        match self.sink.send(&alert.render()).await {
            Ok(()) => {
                self.stats.alerts_sent += 1;
            }
            Err(e) => {
                self.stats.send_failures += 1;
                tracing::error!(
                    error = %e,
                    sink = self.sink.name(),
                    alert_id = %alert.id,
                    "failed to deliver alert, event lost"
                );
            }
        }
    }

    /// 현재 처리 통계를 반환합니다.
    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// 현재 윈도우에 쌓인 샘플 수를 반환합니다.
    pub fn window_sample_count(&self) -> usize {
        self.window.rate().0
    }

    /// 탐지기가 추적 중인 풀을 반환합니다.
    pub fn current_pool(&self) -> Option<&str> {
        self.detector.current_pool()
    }
}

/// 모니터 빌더
///
/// 소스와 싱크를 주입받아 파이프라인을 조립합니다.
pub struct MonitorBuilder {
    config: MonitorConfig,
    source: Option<Box<dyn LineSource>>,
    sink: Option<Box<dyn AlertSink>>,
}

impl MonitorBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: MonitorConfig::default(),
            source: None,
            sink: None,
        }
    }

    /// 모니터 설정을 지정합니다.
    pub fn config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// 라인 소스를 지정합니다 (필수).
    pub fn source(mut self, source: impl LineSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// 알림 싱크를 지정합니다 (필수).
    pub fn sink(mut self, sink: impl AlertSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// 모니터를 조립합니다.
    pub fn build(self) -> Result<Monitor, MonitorError> {
        let source = self.source.ok_or_else(|| MonitorError::Build {
            field: "source".to_owned(),
            reason: "line source is required".to_owned(),
        })?;
        let sink = self.sink.ok_or_else(|| MonitorError::Build {
            field: "sink".to_owned(),
            reason: "alert sink is required".to_owned(),
        })?;

        let window = SlidingErrorWindow::new(self.config.window_size);
        let gate = AlertCooldownGate::new(std::time::Duration::from_secs(
            self.config.alert_cooldown_secs,
        ));

        Ok(Monitor {
            config: self.config,
            source,
            sink,
            parser: AccessLogParser::new(),
            window,
            detector: FailoverDetector::new(),
            gate,
            stats: MonitorStats::default(),
        })
    }
}

impl Default for MonitorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
