//! 월 단위 조회 윈도우.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 한 달치 시세를 요청하기 위한 윈도우 (항상 해당 월의 1일).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FetchWindow(NaiveDate);

impl FetchWindow {
    /// 날짜가 속한 월의 윈도우.
    pub fn containing(date: NaiveDate) -> Self {
        // 1일은 모든 월에 존재
        Self(date.with_day(1).unwrap_or(date))
    }

    /// 윈도우 시작일 (해당 월 1일).
    pub fn start(&self) -> NaiveDate {
        self.0
    }

    /// 윈도우 마지막 날.
    pub fn end(&self) -> NaiveDate {
        self.next().start().pred_opt().unwrap_or(self.0)
    }

    /// 다음 달 윈도우.
    pub fn next(&self) -> Self {
        Self(
            self.0
                .checked_add_months(Months::new(1))
                .unwrap_or(NaiveDate::MAX),
        )
    }

    /// 날짜가 이 윈도우에 속하는지 여부.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.0.year() && date.month() == self.0.month()
    }

    /// 소스 요청용 날짜 문자열 (YYYYMMDD).
    pub fn query_date(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }
}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}
