//! 요청 간격 조절.
//!
//! 한 요청의 시작부터 다음 요청의 시작까지 최소 간격을 보장합니다.
//! 남은 시간만큼만 대기하며, 대기 중 취소 신호를 받으면 즉시 반환합니다.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// 요청 간격 조절기
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last_attempt: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_attempt: None,
        }
    }

    /// 다음 요청까지 남은 대기 시간
    pub fn remaining(&self) -> Duration {
        match self.last_attempt {
            Some(last) => self.interval.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// 다음 요청 시점까지 대기 후 요청 시작을 기록.
    ///
    /// 취소되면 `false`를 반환하고 시작을 기록하지 않습니다.
    pub async fn wait(&mut self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }

        let remaining = self.remaining();
        if !remaining.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(remaining) => {}
            }
        }

        self.last_attempt = Some(Instant::now());
        true
    }
}
