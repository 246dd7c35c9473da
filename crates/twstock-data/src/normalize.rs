//! 원시 시세 행 정규화.
//!
//! 소스 행을 `PriceRecord`로 변환합니다. 숫자 필드가 비어 있거나 자리표시자(`--`)인
//! 행은 직전에 알려진 OHLC를 이어받고 거래 관련 값은 0으로 채웁니다 (이월 대체).
//! 이월할 값이 전혀 없으면 그 행은 버립니다.
//!
//! 같은 원시 윈도우와 같은 `PriorContext`가 주어지면 결과는 항상 같습니다.

use serde_json::Value;
use tracing::{debug, warn};
use twstock_core::{parse_roc_date, Ohlc, PriceRecord, SecurityRef};

use crate::provider::RawPriceTable;

/// 소스 열 이름과 열 이름이 없을 때 사용할 위치.
const COL_DATE: (&str, usize) = ("日期", 0);
const COL_VOLUME: (&str, usize) = ("成交股數", 1);
const COL_VALUE: (&str, usize) = ("成交金額", 2);
const COL_OPEN: (&str, usize) = ("開盤價", 3);
const COL_HIGH: (&str, usize) = ("最高價", 4);
const COL_LOW: (&str, usize) = ("最低價", 5);
const COL_CLOSE: (&str, usize) = ("收盤價", 6);
const COL_TRADES: (&str, usize) = ("成交筆數", 8);

/// 이월 대체에 사용하는 직전 값.
///
/// 윈도우 안에서는 직전 정상 행, 윈도우 첫 행에서는 저장소의 최신 레코드가 기준입니다.
/// 정규화가 끝나면 마지막으로 내보낸 레코드의 OHLC를 담고 있어 다음 윈도우로 넘길 수 있습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriorContext {
    last: Option<Ohlc>,
}

impl PriorContext {
    /// 이전 값이 없는 상태 (신규 종목).
    pub fn empty() -> Self {
        Self::default()
    }

    /// 저장된 최신 레코드에서 시작.
    pub fn from_record(record: Option<&PriceRecord>) -> Self {
        Self {
            last: record.map(PriceRecord::ohlc),
        }
    }
}

/// 열 위치 해석 결과.
struct Columns {
    date: usize,
    volume: usize,
    value: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    trades: usize,
}

impl Columns {
    fn resolve(fields: &[String]) -> Self {
        let find = |(name, fallback): (&str, usize)| {
            fields
                .iter()
                .position(|f| f.trim() == name)
                .unwrap_or(fallback)
        };

        Self {
            date: find(COL_DATE),
            volume: find(COL_VOLUME),
            value: find(COL_VALUE),
            open: find(COL_OPEN),
            high: find(COL_HIGH),
            low: find(COL_LOW),
            close: find(COL_CLOSE),
            trades: find(COL_TRADES),
        }
    }
}

/// 원시 행을 시세 레코드로 변환.
///
/// `context`는 호출 후 마지막으로 내보낸 레코드의 OHLC로 갱신됩니다.
pub fn normalize(
    entity_ref: &SecurityRef,
    table: &RawPriceTable,
    context: &mut PriorContext,
) -> Vec<PriceRecord> {
    let columns = Columns::resolve(&table.fields);
    let mut records = Vec::with_capacity(table.data.len());

    for row in &table.data {
        let date_text = row.get(columns.date).map(cell_string).unwrap_or_default();
        let timestamp = match parse_roc_date(&date_text) {
            Ok(date) => date,
            Err(e) => {
                warn!(code = %entity_ref.code, date = %date_text, error = %e, "날짜를 해석할 수 없는 행 제외");
                continue;
            }
        };

        match parse_numeric(row, &columns) {
            Some((ohlc, trade_count, traded_volume, traded_value)) => {
                context.last = Some(ohlc);
                records.push(PriceRecord {
                    entity_ref: entity_ref.clone(),
                    timestamp,
                    opening_price: ohlc.open,
                    closing_price: ohlc.close,
                    lowest_price: ohlc.low,
                    highest_price: ohlc.high,
                    trade_count,
                    traded_volume,
                    traded_value,
                });
            }
            None => match context.last {
                Some(prior) => {
                    debug!(code = %entity_ref.code, %timestamp, "숫자 필드 누락, 직전 OHLC 이월");
                    records.push(PriceRecord::carried_forward(
                        entity_ref.clone(),
                        timestamp,
                        prior,
                    ));
                }
                None => {
                    warn!(code = %entity_ref.code, %timestamp, "이월할 값 없음, 행 제외");
                }
            },
        }
    }

    records
}

fn parse_numeric(row: &[Value], columns: &Columns) -> Option<(Ohlc, u64, u64, u64)> {
    let price = |idx: usize| row.get(idx).and_then(parse_f64);
    let count = |idx: usize| row.get(idx).and_then(parse_u64);

    let ohlc = Ohlc {
        open: price(columns.open)?,
        high: price(columns.high)?,
        low: price(columns.low)?,
        close: price(columns.close)?,
    };

    Some((
        ohlc,
        count(columns.trades)?,
        count(columns.volume)?,
        count(columns.value)?,
    ))
}

fn cell_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 쉼표를 제거한 숫자 문자열. 비어 있으면 `None`.
fn cleaned_number(value: &Value) -> Option<String> {
    let cleaned: String = cell_string(value)
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn parse_f64(value: &Value) -> Option<f64> {
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    cleaned_number(value)?
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

fn parse_u64(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    cleaned_number(value)?.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn fields() -> Vec<String> {
        [
            "日期", "成交股數", "成交金額", "開盤價", "最高價", "最低價", "收盤價", "漲跌價差",
            "成交筆數",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn entity() -> SecurityRef {
        SecurityRef {
            code: "2330".to_string(),
            name: "台積電".to_string(),
        }
    }

    fn clean_row(day: u32, base: f64) -> Vec<Value> {
        vec![
            json!(format!("112/03/{:02}", day)),
            json!("1,234,000"),
            json!("567,890,000"),
            json!(format!("{:.2}", base)),
            json!(format!("{:.2}", base + 2.0)),
            json!(format!("{:.2}", base - 1.0)),
            json!(format!("{:.2}", base + 1.0)),
            json!("+1.00"),
            json!("1,500"),
        ]
    }

    fn malformed_row(day: u32) -> Vec<Value> {
        vec![
            json!(format!("112/03/{:02}", day)),
            json!("0"),
            json!("0"),
            json!("--"),
            json!("--"),
            json!("--"),
            json!("--"),
            json!("X0.00"),
            json!("0"),
        ]
    }

    #[test]
    fn test_clean_row() {
        let table = RawPriceTable {
            fields: fields(),
            data: vec![clean_row(1, 500.0)],
        };
        let mut context = PriorContext::empty();
        let records = normalize(&entity(), &table, &mut context);

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.timestamp, NaiveDate::from_ymd_opt(2023, 3, 1).unwrap());
        assert_eq!(r.opening_price, 500.0);
        assert_eq!(r.highest_price, 502.0);
        assert_eq!(r.lowest_price, 499.0);
        assert_eq!(r.closing_price, 501.0);
        assert_eq!(r.traded_volume, 1_234_000);
        assert_eq!(r.traded_value, 567_890_000);
        assert_eq!(r.trade_count, 1_500);
        assert_eq!(context.last, Some(r.ohlc()));
    }

    #[test]
    fn test_malformed_row_carries_forward_previous_row() {
        // 20행 중 3번째 행만 숫자 필드가 비어 있음
        let data: Vec<Vec<Value>> = (1..=20)
            .map(|day| {
                if day == 3 {
                    malformed_row(day)
                } else {
                    clean_row(day, 100.0 + day as f64)
                }
            })
            .collect();
        let table = RawPriceTable {
            fields: fields(),
            data,
        };

        let records = normalize(&entity(), &table, &mut PriorContext::empty());

        assert_eq!(records.len(), 20);
        assert_eq!(records[2].ohlc(), records[1].ohlc());
        assert_eq!(records[2].trade_count, 0);
        assert_eq!(records[2].traded_volume, 0);
        assert_eq!(records[2].traded_value, 0);
        assert_eq!(
            records[2].timestamp,
            NaiveDate::from_ymd_opt(2023, 3, 3).unwrap()
        );
    }

    #[test]
    fn test_first_row_uses_stored_record() {
        let stored = PriceRecord {
            entity_ref: entity(),
            timestamp: NaiveDate::from_ymd_opt(2023, 2, 28).unwrap(),
            opening_price: 10.0,
            closing_price: 11.0,
            lowest_price: 9.0,
            highest_price: 12.0,
            trade_count: 5,
            traded_volume: 50,
            traded_value: 500,
        };
        let table = RawPriceTable {
            fields: fields(),
            data: vec![malformed_row(1)],
        };

        let mut context = PriorContext::from_record(Some(&stored));
        let records = normalize(&entity(), &table, &mut context);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ohlc(), stored.ohlc());
        assert_eq!(records[0].traded_volume, 0);
    }

    #[test]
    fn test_malformed_row_without_context_is_dropped() {
        let table = RawPriceTable {
            fields: fields(),
            data: vec![malformed_row(1), clean_row(2, 50.0)],
        };

        let records = normalize(&entity(), &table, &mut PriorContext::empty());

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].timestamp,
            NaiveDate::from_ymd_opt(2023, 3, 2).unwrap()
        );
    }

    #[test]
    fn test_unparseable_date_is_dropped() {
        let mut bad = clean_row(1, 10.0);
        bad[0] = json!("합계");
        let table = RawPriceTable {
            fields: fields(),
            data: vec![bad],
        };

        assert!(normalize(&entity(), &table, &mut PriorContext::empty()).is_empty());
    }

    #[test]
    fn test_positional_fallback_and_numeric_cells() {
        let table = RawPriceTable {
            fields: Vec::new(),
            data: vec![vec![
                json!("112/03/01"),
                json!(1000),
                json!(20000),
                json!(20.0),
                json!(21.5),
                json!(19.5),
                json!(21),
                json!("+1"),
                json!(12),
            ]],
        };

        let records = normalize(&entity(), &table, &mut PriorContext::empty());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].closing_price, 21.0);
        assert_eq!(records[0].trade_count, 12);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let table = RawPriceTable {
            fields: fields(),
            data: vec![malformed_row(1), clean_row(2, 30.0), malformed_row(3)],
        };
        let mut first_context = PriorContext::from_record(None);
        let mut second_context = PriorContext::from_record(None);

        let first = normalize(&entity(), &table, &mut first_context);
        let second = normalize(&entity(), &table, &mut second_context);

        assert_eq!(first, second);
        assert_eq!(first_context, second_context);
    }
}
