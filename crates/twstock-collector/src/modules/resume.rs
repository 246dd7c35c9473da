//! 재개 지점 계산 모듈.

use crate::{CollectorError, Result};
use chrono::NaiveDate;
use twstock_core::{FetchWindow, PriceRecord, Security};
use twstock_data::{PriceRepository, PriceSource};

/// 종목별 동기화 재개 지점.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeCursor {
    /// 처음으로 저장해야 할 날짜
    pub resume_date: NaiveDate,
    /// 첫 조회 윈도우 (`resume_date`가 속한 월)
    pub window: FetchWindow,
    /// 마지막 저장 레코드 (이월 대체의 초기 문맥)
    pub last_stored: Option<PriceRecord>,
}

impl ResumeCursor {
    fn new(resume_date: NaiveDate, last_stored: Option<PriceRecord>) -> Self {
        Self {
            resume_date,
            window: FetchWindow::containing(resume_date),
            last_stored,
        }
    }
}

/// 재개 지점 계산.
///
/// - 저장된 레코드가 있으면 마지막 일자 다음 날 (하한 이상)
/// - 없으면 `max(하한, 상장일)`. 상장일은 종목 목록 값을 우선 사용하고,
///   없으면 소스에서 조회합니다.
#[tracing::instrument(skip(repo, source, security), fields(code = %security.code))]
pub async fn resolve_resume(
    security: &Security,
    repo: &PriceRepository,
    source: &dyn PriceSource,
    floor: NaiveDate,
) -> Result<ResumeCursor> {
    if let Some(latest) = repo.latest_record(security).await? {
        let next_day = latest.timestamp.succ_opt().unwrap_or(latest.timestamp);
        let resume_date = next_day.max(floor);
        tracing::debug!(latest = %latest.timestamp, %resume_date, "저장된 레코드 이후부터 재개");
        return Ok(ResumeCursor::new(resume_date, Some(latest)));
    }

    let listed_date = match security.listed_date {
        Some(date) => date,
        None => source
            .fetch_listed_date(&security.code)
            .await
            .map_err(|e| CollectorError::EntityNotFound(format!("{}: {}", security.code, e)))?,
    };

    let resume_date = listed_date.max(floor);
    tracing::debug!(%listed_date, %resume_date, "신규 종목, 상장일/하한 기준 시작");
    Ok(ResumeCursor::new(resume_date, None))
}
