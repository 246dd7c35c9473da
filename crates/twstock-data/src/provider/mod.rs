//! 데이터 Provider 모듈.
//!
//! 외부 데이터 소스와의 경계를 정의합니다.
//!
//! ## TWSE
//! - `TwseClient`: 대만증권거래소 크롤러
//! - ISIN 페이지의 종목 목록 및 상장일
//! - STOCK_DAY 월별 일별 시세 (JSON)

pub mod twse;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use twstock_core::FetchWindow;

pub use twse::{TwseClient, TwseConfig};

/// 데이터 소스 에러.
///
/// 전송 실패(`Transport`)와 소스가 요청 자체를 거부한 경우(`Rejected`)를 구분합니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// 종목 목록 페이지를 가져오거나 해석할 수 없음
    #[error("소스 접근 불가: {0}")]
    Unavailable(String),

    /// 상장일 조회 실패
    #[error("종목을 찾을 수 없음: {0}")]
    EntityNotFound(String),

    /// 소스가 요청을 거부함 (오늘 이후 날짜 등)
    #[error("요청 거부: {0}")]
    Rejected(String),

    /// HTTP 전송 실패
    #[error("전송 실패: {0}")]
    Transport(String),

    /// 응답 형식 오류
    #[error("응답 형식 오류: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Transport(err.to_string())
    }
}

/// 종목 목록 페이지의 한 행.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    /// 有價證券代號
    pub code: String,
    /// 有價證券名稱
    pub name: String,
    /// 市場別
    pub market_segment: String,
    /// 有價證券別
    pub kind: String,
    /// 公開發行/上市(櫃)/發行日 (원문 그대로, `yyyy/mm/dd`)
    pub listed_date: Option<String>,
    /// 產業別
    pub industry: Option<String>,
}

/// 월별 시세 원시 응답.
///
/// 소스가 준 `fields`(열 이름)와 `data`(행) 그대로이며 값은 대부분 문자열입니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPriceTable {
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub data: Vec<Vec<serde_json::Value>>,
}

impl RawPriceTable {
    /// 데이터 행이 없는지 여부.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// 시세 데이터 소스.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Provider 이름.
    fn name(&self) -> &str;

    /// 전체 종목 목록 조회 (필터링 전).
    async fn fetch_security_catalog(&self) -> Result<Vec<CatalogRow>, SourceError>;

    /// 종목 상장일 조회.
    async fn fetch_listed_date(&self, code: &str) -> Result<NaiveDate, SourceError>;

    /// 한 달치 일별 시세 조회.
    async fn fetch_month_prices(
        &self,
        code: &str,
        window: FetchWindow,
    ) -> Result<RawPriceTable, SourceError>;
}
