//! 환경변수 기반 설정 모듈.

use crate::error::CollectorError;
use crate::Result;
use chrono::NaiveDate;
use std::time::Duration;
use twstock_data::TwseConfig;

/// 기본 추적 하한 (2010-01-01)
pub const DEFAULT_TRACEABLE_FLOOR: &str = "2010-01-01";

/// 기본 데몬 실행 주기 (하루)
pub const DEFAULT_DAEMON_INTERVAL_MINUTES: u64 = 1440;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// 연결 풀 최대 연결 수
    pub database_max_connections: u32,
    /// 시세 동기화 설정
    pub sync: SyncConfig,
    /// TWSE 소스 설정
    pub twse: TwseConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 시세 동기화 설정
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// 추적 하한 (이보다 이른 날짜는 조회하지 않음)
    pub traceable_floor: NaiveDate,
    /// 조회 요청 간 최소 간격 (밀리초)
    pub request_interval_ms: u64,
    /// 종목 목록을 `securities` 컬렉션에 저장할지 여부
    pub save_registry: bool,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })?;

        let traceable_floor = match std::env::var("SYNC_TRACEABLE_FLOOR") {
            Ok(value) => parse_floor(&value)?,
            Err(_) => SyncConfig::default().traceable_floor,
        };

        let interval_minutes = match std::env::var("DAEMON_INTERVAL_MINUTES") {
            Ok(value) => parse_daemon_interval(&value)?,
            Err(_) => DEFAULT_DAEMON_INTERVAL_MINUTES,
        };

        let defaults = TwseConfig::default();
        let twse = TwseConfig {
            isin_url: std::env::var("TWSE_ISIN_URL").unwrap_or(defaults.isin_url),
            price_url: std::env::var("TWSE_PRICE_URL").unwrap_or(defaults.price_url),
            user_agent: std::env::var("TWSE_USER_AGENT").unwrap_or(defaults.user_agent),
            timeout: Duration::from_secs(env_var_parse(
                "TWSE_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )),
        };

        Ok(Self {
            database_url,
            database_max_connections: env_var_parse("DATABASE_MAX_CONNECTIONS", 5),
            sync: SyncConfig {
                traceable_floor,
                request_interval_ms: env_var_parse("SYNC_REQUEST_INTERVAL_MS", 5000),
                save_registry: env_var_bool("SYNC_SAVE_REGISTRY", true),
            },
            twse,
            daemon: DaemonConfig {
                interval_minutes,
            },
        })
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            traceable_floor: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default(),
            request_interval_ms: 5000,
            save_registry: true,
        }
    }
}

impl SyncConfig {
    /// 요청 간 최소 간격을 Duration으로 반환
    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }
}

impl DaemonConfig {
    /// 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}

/// `YYYY-MM-DD` 형식의 추적 하한 파싱
pub fn parse_floor(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        CollectorError::Config(format!("잘못된 추적 하한 '{}': {}", value, e))
    })
}

/// 데몬 실행 주기 파싱 (분 단위, 1 이상)
pub fn parse_daemon_interval(value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(CollectorError::Config(
            "DAEMON_INTERVAL_MINUTES는 0보다 커야 합니다".to_string(),
        )),
        Ok(minutes) => Ok(minutes),
        Err(e) => Err(CollectorError::Config(format!(
            "잘못된 데몬 실행 주기 '{}': {}",
            value, e
        ))),
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱
fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.traceable_floor.to_string(), DEFAULT_TRACEABLE_FLOOR);
        assert_eq!(config.request_interval(), Duration::from_secs(5));
        assert!(config.save_registry);
    }

    #[test]
    fn test_parse_floor() {
        assert_eq!(
            parse_floor("2015-06-01").unwrap(),
            NaiveDate::from_ymd_opt(2015, 6, 1).unwrap()
        );
        assert!(matches!(
            parse_floor("2015/06/01"),
            Err(CollectorError::Config(_))
        ));
    }

    #[test]
    fn test_daemon_interval() {
        let daemon = DaemonConfig { interval_minutes: 1440 };
        assert_eq!(daemon.interval(), Duration::from_secs(86_400));

        let huge = DaemonConfig { interval_minutes: u64::MAX };
        assert_eq!(huge.interval(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_parse_daemon_interval_rejects_zero() {
        assert_eq!(parse_daemon_interval("30").unwrap(), 30);
        assert_eq!(parse_daemon_interval(" 1440 ").unwrap(), 1440);
        assert!(matches!(
            parse_daemon_interval("0"),
            Err(CollectorError::Config(_))
        ));
        assert!(matches!(
            parse_daemon_interval("daily"),
            Err(CollectorError::Config(_))
        ));
    }
}
