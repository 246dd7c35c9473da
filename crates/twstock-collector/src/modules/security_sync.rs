//! 종목 목록 동기화 모듈.

use crate::config::SyncConfig;
use crate::{CollectorError, Result};
use std::collections::HashSet;
use std::time::Instant;
use twstock_core::{parse_slash_date, Security, SecurityKind};
use twstock_data::{CatalogRow, PriceRepository, PriceSource, UpsertOutcome};

/// 추적 대상 시장 구분 (上市).
pub const PRIMARY_MARKET_SEGMENTS: &[&str] = &["上市"];

/// 원시 목록 행을 추적 대상 종목으로 필터링.
///
/// 소스 순서를 유지합니다. 조건:
/// - 코드 앞뒤 글자가 영문자가 아님
/// - 시장 구분이 `PRIMARY_MARKET_SEGMENTS`에 포함
/// - 종목 구분이 ETF 또는 보통주
pub fn filter_catalog(rows: Vec<CatalogRow>) -> Vec<Security> {
    rows.into_iter()
        .map(|row| Security {
            listed_date: row
                .listed_date
                .as_deref()
                .and_then(|d| parse_slash_date(d).ok()),
            kind: SecurityKind::parse(&row.kind),
            code: row.code,
            name: row.name,
            market_segment: row.market_segment,
        })
        .filter(|s| {
            s.has_plain_code()
                && PRIMARY_MARKET_SEGMENTS.contains(&s.market_segment.as_str())
                && s.kind.is_tracked()
        })
        .collect()
}

/// 종목 목록 조회 및 필터링.
///
/// 목록을 가져오지 못하면 실행 전체를 중단해야 하므로 항상 `SourceUnavailable`을 반환합니다.
pub async fn fetch_registry(source: &dyn PriceSource) -> Result<Vec<Security>> {
    let rows = source
        .fetch_security_catalog()
        .await
        .map_err(|e| CollectorError::SourceUnavailable(e.to_string()))?;

    let total = rows.len();
    let securities = filter_catalog(rows);
    tracing::info!(
        source = source.name(),
        total = total,
        tracked = securities.len(),
        "종목 목록 필터링 완료"
    );

    Ok(securities)
}

/// 종목 목록 동기화 (조회 → 필터 → `securities` 컬렉션 저장).
pub async fn sync_securities(
    source: &dyn PriceSource,
    repo: &PriceRepository,
    config: &SyncConfig,
) -> Result<(Vec<Security>, UpsertOutcome)> {
    let start = Instant::now();
    let securities = fetch_registry(source).await?;

    let outcome = if config.save_registry {
        repo.save_registry(&securities).await?
    } else {
        UpsertOutcome::default()
    };

    tracing::info!(
        count = securities.len(),
        inserted = outcome.inserted,
        skipped = outcome.skipped,
        elapsed = format!("{:.1}s", start.elapsed().as_secs_f64()),
        "종목 목록 동기화 완료"
    );

    Ok((securities, outcome))
}

/// 쉼표로 구분된 코드 목록 파싱 (예: "2330,0050").
pub fn parse_codes(s: &str) -> Vec<String> {
    s.split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// 요청 코드를 종목 목록에서 찾기.
///
/// 종목 목록 순서를 유지하고, 목록에 없는 코드는 두 번째 값으로 반환합니다.
pub fn select_securities(registry: &[Security], codes: &[String]) -> (Vec<Security>, Vec<String>) {
    let wanted: HashSet<&str> = codes.iter().map(String::as_str).collect();
    let selected: Vec<Security> = registry
        .iter()
        .filter(|s| wanted.contains(s.code.as_str()))
        .cloned()
        .collect();

    let found: HashSet<&str> = selected.iter().map(|s| s.code.as_str()).collect();
    let unknown = codes
        .iter()
        .filter(|c| !found.contains(c.as_str()))
        .cloned()
        .collect();

    (selected, unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, segment: &str, kind: &str) -> CatalogRow {
        CatalogRow {
            code: code.to_string(),
            name: format!("name-{}", code),
            market_segment: segment.to_string(),
            kind: kind.to_string(),
            listed_date: Some("2003/06/30".to_string()),
            industry: None,
        }
    }

    #[test]
    fn test_filter_catalog() {
        let rows = vec![
            row("2330", "上市", "股票"),
            row("0050", "上市", "ETF"),
            row("03001P", "上市", "股票"),
            row("6488", "上櫃", "股票"),
            row("01001T", "上市", "受益證券-不動產投資信託"),
            row("A1234", "上市", "股票"),
        ];

        let securities = filter_catalog(rows);
        let codes: Vec<&str> = securities.iter().map(|s| s.code.as_str()).collect();

        assert_eq!(codes, vec!["2330", "0050"]);
        assert_eq!(securities[1].kind, SecurityKind::Etf);
        assert_eq!(
            securities[0].listed_date.map(|d| d.to_string()).as_deref(),
            Some("2003-06-30")
        );
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!(parse_codes("2330, 0050,,"), vec!["2330", "0050"]);
        assert!(parse_codes("").is_empty());
    }

    #[test]
    fn test_select_securities_reports_unknown() {
        let registry = filter_catalog(vec![row("2330", "上市", "股票"), row("0050", "上市", "ETF")]);
        let codes = parse_codes("0050,9999,2330");

        let (selected, unknown) = select_securities(&registry, &codes);
        let selected_codes: Vec<&str> = selected.iter().map(|s| s.code.as_str()).collect();

        assert_eq!(selected_codes, vec!["2330", "0050"]);
        assert_eq!(unknown, vec!["9999"]);
    }
}
