//! 대만증권거래소(TWSE) 크롤러.
//!
//! ## 데이터 소스
//! - `isin.twse.com.tw/isin/single_main.jsp`: 종목 목록 (HTML 테이블), `owncode` 지정 시 단일 종목 정보
//! - `www.twse.com.tw/exchangeReport/STOCK_DAY`: 종목별 월간 일별 시세 (JSON)
//!
//! ## 사용 예시
//! ```rust,ignore
//! let client = TwseClient::new(TwseConfig::default())?;
//! let listed = client.fetch_listed_date("2330").await?;
//! let table = client.fetch_month_prices("2330", FetchWindow::containing(listed)).await?;
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument};
use twstock_core::{parse_slash_date, FetchWindow};

use super::{CatalogRow, PriceSource, RawPriceTable, SourceError};

/// ISIN 종목 목록 페이지 기본 URL.
pub const DEFAULT_ISIN_URL: &str = "https://isin.twse.com.tw/isin/single_main.jsp";

/// 월별 일별 시세 API 기본 URL.
pub const DEFAULT_PRICE_URL: &str = "https://www.twse.com.tw/exchangeReport/STOCK_DAY";

/// 기본 User-Agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.114 Mobile Safari/537.36";

/// 정상 응답 `stat` 값.
const STAT_OK: &str = "OK";

/// 해당 월에 데이터가 없을 때의 `stat` 문구 (거래정지 등).
const STAT_NO_DATA: &str = "沒有符合條件的資料";

/// TWSE 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct TwseConfig {
    /// ISIN 페이지 URL
    pub isin_url: String,
    /// STOCK_DAY API URL
    pub price_url: String,
    /// 요청 User-Agent
    pub user_agent: String,
    /// HTTP 타임아웃
    pub timeout: Duration,
}

impl Default for TwseConfig {
    fn default() -> Self {
        Self {
            isin_url: DEFAULT_ISIN_URL.to_string(),
            price_url: DEFAULT_PRICE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// STOCK_DAY 응답 구조.
#[derive(Debug, Deserialize)]
struct StockDayResponse {
    stat: String,
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    data: Vec<Vec<serde_json::Value>>,
}

/// TWSE 크롤러.
pub struct TwseClient {
    client: Client,
    config: TwseConfig,
}

impl TwseClient {
    /// 설정으로 클라이언트 생성.
    pub fn new(config: TwseConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| SourceError::Transport(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, SourceError> {
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::Transport("Rate limit 초과".to_string()));
        }
        if !status.is_success() {
            return Err(SourceError::Transport(format!("HTTP 오류: {}", status)));
        }

        debug!(url = %response.url(), "응답 수신");
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PriceSource for TwseClient {
    fn name(&self) -> &str {
        "TWSE"
    }

    #[instrument(skip(self))]
    async fn fetch_security_catalog(&self) -> Result<Vec<CatalogRow>, SourceError> {
        info!("TWSE 종목 목록 조회 중..");
        let html = self
            .get_text(&self.config.isin_url, &[])
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        let rows = parse_catalog_html(&html)?;
        info!(count = rows.len(), "TWSE 종목 목록 조회 완료");
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn fetch_listed_date(&self, code: &str) -> Result<NaiveDate, SourceError> {
        let html = self
            .get_text(&self.config.isin_url, &[("owncode", code), ("stockname", "")])
            .await?;

        find_listed_date(&html).ok_or_else(|| SourceError::EntityNotFound(code.to_string()))
    }

    #[instrument(skip(self, window), fields(window = %window))]
    async fn fetch_month_prices(
        &self,
        code: &str,
        window: FetchWindow,
    ) -> Result<RawPriceTable, SourceError> {
        debug!(code, window = %window, "월별 시세 조회");
        let date = window.query_date();
        let text = self
            .get_text(
                &self.config.price_url,
                &[("response", "json"), ("date", &date), ("stockNo", code)],
            )
            .await?;

        parse_stock_day(&text)
    }
}

/// ISIN 목록 페이지(HTML)를 행 목록으로 변환.
///
/// `table.h4`의 첫 행을 열 이름으로 사용하고, 열 수가 맞지 않는 구분 행은 건너뜁니다.
pub fn parse_catalog_html(html: &str) -> Result<Vec<CatalogRow>, SourceError> {
    let document = Html::parse_document(html);
    let table_selector = selector("table.h4")?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("td")?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| SourceError::Unavailable("종목 목록 테이블 없음".to_string()))?;

    let mut rows = table.select(&row_selector);
    let header: Vec<String> = rows
        .next()
        .map(|tr| tr.select(&cell_selector).map(cell_text).collect())
        .unwrap_or_default();

    if header.is_empty() {
        return Err(SourceError::Unavailable("종목 목록 헤더 없음".to_string()));
    }

    let mut catalog = Vec::new();
    for tr in rows {
        let cells: Vec<String> = tr.select(&cell_selector).map(cell_text).collect();
        if cells.len() != header.len() {
            continue;
        }

        let columns: HashMap<&str, String> = header
            .iter()
            .map(String::as_str)
            .zip(cells.into_iter())
            .collect();

        let column = |name: &str| columns.get(name).cloned().unwrap_or_default();
        let optional = |name: &str| columns.get(name).filter(|v| !v.is_empty()).cloned();

        catalog.push(CatalogRow {
            code: column("有價證券代號"),
            name: column("有價證券名稱"),
            market_segment: column("市場別"),
            kind: column("有價證券別"),
            listed_date: optional("公開發行/上市(櫃)/發行日"),
            industry: optional("產業別"),
        });
    }

    Ok(catalog)
}

/// 단일 종목 페이지에서 첫 번째 `yyyy/mm/dd` 셀을 상장일로 추출.
pub fn find_listed_date(html: &str) -> Option<NaiveDate> {
    let document = Html::parse_document(html);
    let cell_selector = Selector::parse("td").ok()?;

    document
        .select(&cell_selector)
        .map(cell_text)
        .filter(|text| {
            let parts: Vec<&str> = text.split('/').collect();
            parts.len() == 3
                && parts
                    .iter()
                    .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
        })
        .find_map(|text| parse_slash_date(&text).ok())
}

/// STOCK_DAY 응답(JSON) 해석.
pub fn parse_stock_day(text: &str) -> Result<RawPriceTable, SourceError> {
    let response: StockDayResponse = serde_json::from_str(text).map_err(|e| {
        SourceError::Malformed(format!(
            "JSON 파싱 실패: {} - {}",
            e,
            text.chars().take(200).collect::<String>()
        ))
    })?;

    if response.stat == STAT_OK {
        return Ok(RawPriceTable {
            fields: response.fields,
            data: response.data,
        });
    }

    if response.stat.contains(STAT_NO_DATA) {
        debug!(stat = %response.stat, "해당 월 데이터 없음");
        return Ok(RawPriceTable::default());
    }

    Err(SourceError::Rejected(response.stat))
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Malformed(format!("셀렉터 오류 {}: {}", css, e)))
}

fn cell_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
