//! 저장 현황 조회 모듈.

use crate::Result;
use chrono::NaiveDate;
use twstock_core::Security;
use twstock_data::PriceRepository;

/// 종목별 저장 현황
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityStatus {
    pub code: String,
    pub name: String,
    /// 저장된 레코드 수
    pub count: u64,
    /// 마지막 저장 일자
    pub latest: Option<NaiveDate>,
}

impl SecurityStatus {
    pub fn log(&self) {
        let latest = self
            .latest
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        tracing::info!(
            code = %self.code,
            name = %self.name,
            count = self.count,
            latest = %latest,
            "저장 현황"
        );
    }
}

/// 종목별 저장 현황 조회
pub async fn collect_status(
    repo: &PriceRepository,
    securities: &[Security],
) -> Result<Vec<SecurityStatus>> {
    let mut statuses = Vec::with_capacity(securities.len());

    for security in securities {
        statuses.push(SecurityStatus {
            code: security.code.clone(),
            name: security.name.clone(),
            count: repo.count(security).await?,
            latest: repo.latest_timestamp(security).await?,
        });
    }

    Ok(statuses)
}
