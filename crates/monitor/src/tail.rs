//! 파일 기반 라인 소스
//!
//! 액세스 로그 파일을 감시하며 새로운 라인이 추가되면 반환합니다.
//! `tail -f`와 유사한 동작을 비동기 폴링으로 구현합니다.
//!
//! # 로테이션 감지
//! - inode 변경 감지 (logrotate 등, Unix 전용)
//! - 파일 크기 축소 감지 (truncation)
//! - 사라진 파일 재등장 대기 및 새 파일 자동 열기
//!
//! 파일이 아직 없으면 존재할 때까지 무한 재시도합니다. 이 소스가
//! 프로세스를 중단시키는 경우는 권한 오류 같은 복구 불가능한 I/O
//! 에러뿐입니다.

use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

use poolwatch_core::config::SourceConfig;
use poolwatch_core::error::SourceError;
use poolwatch_core::pipeline::LineSource;

/// `tail -f` 방식 파일 라인 소스
///
/// 기본 동작은 파일 끝에서 시작해 새로 추가되는 라인만 반환합니다
/// (`read_from_start` 설정으로 변경 가능). 개행으로 끝나지 않은
/// 부분 라인은 이어서 기록될 때까지 보류합니다.
pub struct FileLineSource {
    /// 소스 설정
    config: SourceConfig,
    /// 감시할 파일 경로
    path: PathBuf,
    /// 소스 식별자 ("file:<경로>")
    name: String,
    /// 현재 열린 리더 (파일이 없으면 None)
    reader: Option<BufReader<File>>,
    /// 현재 파일의 inode (Unix 전용)
    inode: Option<u64>,
    /// 마지막 읽기 위치 (바이트 오프셋)
    offset: u64,
    /// 아직 개행을 만나지 못한 부분 라인
    pending: Vec<u8>,
    /// 다음 열기에서 파일 처음부터 읽을지 여부
    resume_from_start: bool,
}

impl FileLineSource {
    /// 새 파일 라인 소스를 생성합니다. 파일은 첫 `next_line` 호출에서 열립니다.
    pub fn new(config: SourceConfig) -> Self {
        let path = PathBuf::from(&config.log_path);
        let name = format!("file:{}", config.log_path);
        let resume_from_start = config.read_from_start;
        Self {
            config,
            path,
            name,
            reader: None,
            inode: None,
            offset: 0,
            pending: Vec::new(),
            resume_from_start,
        }
    }

    /// 파일이 열려있지 않으면 열 수 있을 때까지 대기하며 엽니다.
    async fn ensure_open(&mut self) -> Result<(), SourceError> {
        if self.reader.is_some() {
            return Ok(());
        }

        let mut waiting_logged = false;
        loop {
            match File::open(&self.path).await {
                Ok(mut file) => {
                    let metadata = file.metadata().await.map_err(|e| SourceError::Open {
                        path: self.path.display().to_string(),
                        reason: e.to_string(),
                    })?;
                    self.inode = inode_of(&metadata);
                    self.offset = if self.resume_from_start {
                        0
                    } else {
                        file.seek(SeekFrom::End(0)).await.map_err(|e| {
                            SourceError::Open {
                                path: self.path.display().to_string(),
                                reason: e.to_string(),
                            }
                        })?
                    };
                    self.reader = Some(BufReader::new(file));
                    tracing::info!(
                        path = %self.path.display(),
                        offset = self.offset,
                        "tailing log file"
                    );
                    return Ok(());
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    if !waiting_logged {
                        tracing::info!(
                            path = %self.path.display(),
                            "waiting for log file to appear"
                        );
                        waiting_logged = true;
                    }
                    tokio::time::sleep(Duration::from_millis(
                        self.config.missing_poll_interval_ms,
                    ))
                    .await;
                }
                Err(e) => {
                    return Err(SourceError::Open {
                        path: self.path.display().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    /// 파일 로테이션/트렁케이션 여부를 확인하고, 감지되면 다시 열도록
    /// 상태를 초기화합니다. 재열기가 필요하면 `true`를 반환합니다.
    async fn check_rotation(&mut self) -> Result<bool, SourceError> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "log file disappeared, reopening");
                self.reset_for_reopen();
                return Ok(true);
            }
            Err(e) => {
                return Err(SourceError::Read {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let inode_changed = match (self.inode, inode_of(&metadata)) {
            (Some(old), Some(new)) => old != new,
            _ => false,
        };
        let truncated = metadata.len() < self.offset;

        if inode_changed || truncated {
            tracing::info!(
                path = %self.path.display(),
                inode_changed,
                truncated,
                "log rotation detected, reopening from start"
            );
            self.reset_for_reopen();
            return Ok(true);
        }
        Ok(false)
    }

    /// 재열기를 위해 추적 상태를 초기화합니다. 로테이션된 파일은
    /// 처음부터 읽습니다.
    fn reset_for_reopen(&mut self) {
        self.reader = None;
        self.inode = None;
        self.offset = 0;
        self.pending.clear();
        self.resume_from_start = true;
    }
}

#[async_trait]
impl LineSource for FileLineSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_line(&mut self) -> Result<Bytes, SourceError> {
        loop {
            self.ensure_open().await?;
            let Some(reader) = self.reader.as_mut() else {
                continue;
            };

            let mut chunk = Vec::new();
            let n = reader
                .read_until(b'\n', &mut chunk)
                .await
                .map_err(|e| SourceError::Read {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                })?;

            if n == 0 {
                // EOF: 로테이션 확인 후 새 데이터 대기
                if self.check_rotation().await? {
                    continue;
                }
                tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
                continue;
            }
            self.offset += n as u64;

            if chunk.last() != Some(&b'\n') {
                // 개행 없이 끝남: 동시 기록 중인 부분 라인이므로 보류
                self.pending.extend_from_slice(&chunk);
                if self.pending.len() > self.config.max_line_length {
                    tracing::warn!(
                        len = self.pending.len(),
                        max = self.config.max_line_length,
                        "dropping oversized partial line"
                    );
                    self.pending.clear();
                }
                tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
                continue;
            }

            chunk.pop();
            if chunk.last() == Some(&b'\r') {
                chunk.pop();
            }

            let line = if self.pending.is_empty() {
                chunk
            } else {
                let mut line = std::mem::take(&mut self.pending);
                line.extend_from_slice(&chunk);
                line
            };

            if line.len() > self.config.max_line_length {
                tracing::warn!(
                    len = line.len(),
                    max = self.config.max_line_length,
                    "skipping oversized line"
                );
                continue;
            }

            return Ok(Bytes::from(line));
        }
    }
}

#[cfg(unix)]
fn inode_of(metadata: &std::fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(metadata.ino())
}

#[cfg(not(unix))]
fn inode_of(_metadata: &std::fs::Metadata) -> Option<u64> {
    None
}
