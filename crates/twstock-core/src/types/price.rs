//! 일별 시세 레코드.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::security::SecurityRef;

/// 시가/고가/저가/종가.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// 한 종목의 하루치 시세.
///
/// 저장 문서 형태는 시계열 컬렉션 규약을 따릅니다:
/// 종목 정보는 `metadata` 하위 문서에, 날짜는 `timestamp` 필드에 들어갑니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    #[serde(rename = "metadata")]
    pub entity_ref: SecurityRef,
    pub timestamp: NaiveDate,
    pub opening_price: f64,
    pub closing_price: f64,
    pub lowest_price: f64,
    pub highest_price: f64,
    pub trade_count: u64,
    pub traded_volume: u64,
    pub traded_value: u64,
}

impl PriceRecord {
    /// 거래 정보가 없는 날의 레코드 생성.
    ///
    /// 직전에 알려진 OHLC를 이어받고 거래 건수·거래량·거래대금은 0으로 둡니다.
    pub fn carried_forward(entity_ref: SecurityRef, timestamp: NaiveDate, prior: Ohlc) -> Self {
        Self {
            entity_ref,
            timestamp,
            opening_price: prior.open,
            closing_price: prior.close,
            lowest_price: prior.low,
            highest_price: prior.high,
            trade_count: 0,
            traded_volume: 0,
            traded_value: 0,
        }
    }

    /// OHLC 값.
    pub fn ohlc(&self) -> Ohlc {
        Ohlc {
            open: self.opening_price,
            high: self.highest_price,
            low: self.lowest_price,
            close: self.closing_price,
        }
    }
}
