#![doc = include_str!("../README.md")]

pub mod cooldown;
pub mod error;
pub mod failover;
pub mod monitor;
pub mod notify;
pub mod parser;
pub mod tail;
pub mod window;

// --- 주요 타입 re-export ---

// 오케스트레이터
pub use monitor::{Monitor, MonitorBuilder, MonitorStats};

// 엔진 구성 요소
pub use cooldown::AlertCooldownGate;
pub use failover::FailoverDetector;
pub use parser::AccessLogParser;
pub use window::SlidingErrorWindow;

// 소스/싱크 구현체
pub use notify::{ConsoleSink, WebhookSink};
pub use tail::FileLineSource;

// 에러
pub use error::MonitorError;
