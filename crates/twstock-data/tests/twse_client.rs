//! TWSE 클라이언트 HTTP 연동 테스트 (mockito 서버 사용).

use chrono::NaiveDate;
use mockito::Matcher;
use std::time::Duration;
use twstock_core::FetchWindow;
use twstock_data::{PriceSource, SourceError, TwseClient, TwseConfig};

const ISIN_PATH: &str = "/isin/single_main.jsp";
const STOCK_DAY_PATH: &str = "/exchangeReport/STOCK_DAY";

fn client_for(server: &mockito::Server) -> TwseClient {
    let config = TwseConfig {
        isin_url: format!("{}{}", server.url(), ISIN_PATH),
        price_url: format!("{}{}", server.url(), STOCK_DAY_PATH),
        timeout: Duration::from_secs(5),
        ..TwseConfig::default()
    };
    TwseClient::new(config).unwrap()
}

fn march_2023() -> FetchWindow {
    FetchWindow::containing(NaiveDate::from_ymd_opt(2023, 3, 15).unwrap())
}

#[tokio::test]
async fn test_fetch_month_prices_sends_query() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", STOCK_DAY_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("response".into(), "json".into()),
            Matcher::UrlEncoded("date".into(), "20230301".into()),
            Matcher::UrlEncoded("stockNo".into(), "2330".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"stat":"OK","fields":["日期","成交股數","成交金額","開盤價","最高價","最低價","收盤價","漲跌價差","成交筆數"],
               "data":[["112/03/01","25,000,000","12,500,000,000","500.00","505.00","498.00","503.00","+3.00","20,000"]]}"#,
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let table = client.fetch_month_prices("2330", march_2023()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(table.data.len(), 1);
    assert_eq!(table.fields[0], "日期");
}

#[tokio::test]
async fn test_fetch_month_prices_no_data_is_empty() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", STOCK_DAY_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"stat":"很抱歉，沒有符合條件的資料!"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let table = client.fetch_month_prices("2330", march_2023()).await.unwrap();
    assert!(table.is_empty());
}

#[tokio::test]
async fn test_fetch_month_prices_http_error_is_transport() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", STOCK_DAY_PATH)
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client.fetch_month_prices("2330", march_2023()).await;
    assert!(matches!(result, Err(SourceError::Transport(_))));
}

#[tokio::test]
async fn test_fetch_month_prices_html_body_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", STOCK_DAY_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html><body>請稍後再試</body></html>")
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client.fetch_month_prices("2330", march_2023()).await;
    assert!(matches!(result, Err(SourceError::Malformed(_))));
}

#[tokio::test]
async fn test_fetch_security_catalog() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", ISIN_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"<table class="h4">
                 <tr><td>有價證券代號</td><td>有價證券名稱</td><td>市場別</td><td>有價證券別</td></tr>
                 <tr><td>2330</td><td>台積電</td><td>上市</td><td>股票</td></tr>
               </table>"#,
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let rows = client.fetch_security_catalog().await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].code, "2330");
    assert_eq!(rows[0].kind, "股票");
}

#[tokio::test]
async fn test_fetch_security_catalog_outage_is_unavailable() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", ISIN_PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client.fetch_security_catalog().await;
    assert!(matches!(result, Err(SourceError::Unavailable(_))));
}

#[tokio::test]
async fn test_fetch_listed_date() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", ISIN_PATH)
        .match_query(Matcher::UrlEncoded("owncode".into(), "0050".into()))
        .with_status(200)
        .with_body("<table><tr><td>0050</td><td>元大台灣50</td><td>2003/06/30</td></tr></table>")
        .create_async()
        .await;

    let client = client_for(&server);
    let listed = client.fetch_listed_date("0050").await.unwrap();
    assert_eq!(listed, NaiveDate::from_ymd_opt(2003, 6, 30).unwrap());
}

#[tokio::test]
async fn test_fetch_listed_date_unknown_code() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", ISIN_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<table><tr><td>查無資料</td></tr></table>")
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client.fetch_listed_date("9999").await;
    assert!(matches!(result, Err(SourceError::EntityNotFound(_))));
}

/// 실제 TWSE 서버 호출 (네트워크 필요).
#[tokio::test]
#[ignore]
async fn test_live_month_prices() {
    let client = TwseClient::new(TwseConfig::default()).unwrap();
    let table = client.fetch_month_prices("2330", march_2023()).await.unwrap();
    assert!(!table.is_empty());
}
