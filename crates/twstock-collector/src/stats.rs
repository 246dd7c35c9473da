//! 수집 통계와 실행 보고서.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use twstock_core::{FetchWindow, Security};

/// 수집 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 총 시도 횟수
    pub total: usize,
    /// 성공 횟수 (오늘까지 도달)
    pub success: usize,
    /// 에러 횟수
    pub errors: usize,
    /// 새로 저장된 문서 수
    pub inserted: usize,
    /// 이미 존재해서 건너뛴 문서 수
    pub skipped: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 종목 보고서 하나를 통계에 반영
    pub fn record(&mut self, report: &SecuritySyncReport) {
        self.total += 1;
        match report.outcome {
            SyncOutcome::ReachedToday => self.success += 1,
            SyncOutcome::Aborted(_) => self.errors += 1,
            SyncOutcome::Cancelled => {}
        }
        self.inserted += report.inserted;
        self.skipped += report.skipped;
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            inserted = self.inserted,
            skipped = self.skipped,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}

/// 종목 동기화 종료 사유
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    /// 오늘이 속한 월까지 처리 완료
    ReachedToday,
    /// 오류로 중단 (이전 월까지의 저장분은 유지)
    Aborted(String),
    /// 취소 신호로 중단
    Cancelled,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReachedToday => write!(f, "reached today"),
            Self::Aborted(reason) => write!(f, "aborted: {}", reason),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// 종목별 동기화 보고서
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySyncReport {
    pub code: String,
    pub name: String,
    /// 계산된 재개 일자
    pub resume_date: Option<NaiveDate>,
    /// 마지막으로 조회에 성공한 윈도우
    pub last_window: Option<FetchWindow>,
    /// 조회에 성공한 윈도우 수
    pub windows_fetched: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub outcome: SyncOutcome,
}

impl SecuritySyncReport {
    /// 빈 보고서 생성 (종료 사유는 아직 정해지지 않아 `Cancelled`로 시작)
    pub fn new(security: &Security) -> Self {
        Self {
            code: security.code.clone(),
            name: security.name.clone(),
            resume_date: None,
            last_window: None,
            windows_fetched: 0,
            inserted: 0,
            skipped: 0,
            outcome: SyncOutcome::Cancelled,
        }
    }

    /// 종목 요약 로그 출력
    pub fn log_summary(&self) {
        let resume = self
            .resume_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let last_window = self
            .last_window
            .map(|w| w.to_string())
            .unwrap_or_else(|| "-".to_string());

        match &self.outcome {
            SyncOutcome::Aborted(_) => tracing::warn!(
                code = %self.code,
                name = %self.name,
                resume = %resume,
                last_window = %last_window,
                windows = self.windows_fetched,
                inserted = self.inserted,
                skipped = self.skipped,
                outcome = %self.outcome,
                "종목 동기화 중단"
            ),
            _ => tracing::info!(
                code = %self.code,
                name = %self.name,
                resume = %resume,
                last_window = %last_window,
                windows = self.windows_fetched,
                inserted = self.inserted,
                skipped = self.skipped,
                outcome = %self.outcome,
                "종목 동기화 종료"
            ),
        }
    }
}

/// 전체 실행 보고서
#[derive(Debug, Clone, Default)]
pub struct SyncRunReport {
    pub securities: Vec<SecuritySyncReport>,
    /// 종목 목록에 없어 건너뛴 코드
    pub unknown_codes: Vec<String>,
    /// 취소로 처리하지 못한 종목 수
    pub not_started: usize,
    pub stats: CollectionStats,
}

impl SyncRunReport {
    /// 종목 보고서 추가
    pub fn push(&mut self, report: SecuritySyncReport) {
        self.stats.record(&report);
        self.securities.push(report);
    }

    /// 취소 여부
    pub fn was_cancelled(&self) -> bool {
        self.not_started > 0
            || self
                .securities
                .iter()
                .any(|r| r.outcome == SyncOutcome::Cancelled)
    }

    pub fn report_for(&self, code: &str) -> Option<&SecuritySyncReport> {
        self.securities.iter().find(|r| r.code == code)
    }

    /// 실행 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        if !self.unknown_codes.is_empty() {
            tracing::warn!(codes = ?self.unknown_codes, "종목 목록에 없는 코드");
        }
        if self.not_started > 0 {
            tracing::warn!(not_started = self.not_started, "취소로 처리하지 못한 종목");
        }
        self.stats.log_summary(operation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twstock_core::SecurityKind;

    fn security() -> Security {
        Security {
            code: "2330".to_string(),
            name: "台積電".to_string(),
            kind: SecurityKind::Equity,
            market_segment: "上市".to_string(),
            listed_date: None,
        }
    }

    #[test]
    fn test_success_rate() {
        let mut stats = CollectionStats::new();
        assert_eq!(stats.success_rate(), 0.0);

        stats.total = 4;
        stats.success = 3;
        assert_eq!(stats.success_rate(), 75.0);
    }

    #[test]
    fn test_run_report_aggregates() {
        let mut run = SyncRunReport::default();

        let mut done = SecuritySyncReport::new(&security());
        done.outcome = SyncOutcome::ReachedToday;
        done.inserted = 20;
        run.push(done);

        let mut aborted = SecuritySyncReport::new(&security());
        aborted.outcome = SyncOutcome::Aborted("rejected".into());
        aborted.skipped = 3;
        run.push(aborted);

        assert_eq!(run.stats.total, 2);
        assert_eq!(run.stats.success, 1);
        assert_eq!(run.stats.errors, 1);
        assert_eq!(run.stats.inserted, 20);
        assert_eq!(run.stats.skipped, 3);
        assert!(!run.was_cancelled());
    }
}
