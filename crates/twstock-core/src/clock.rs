//! "오늘" 기준 시계.
//!
//! 동기화 종료 조건은 시계에 의존하므로 전역 상수 대신 주입합니다.

use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Taipei;

/// 오늘 날짜를 제공하는 시계.
pub trait Clock: Send + Sync {
    /// 데이터 소스 기준 오늘 날짜.
    fn today(&self) -> NaiveDate;
}

/// 시스템 시계 (타이베이 시간대 기준).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&Taipei).date_naive()
    }
}

/// 고정된 날짜를 반환하는 시계.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
