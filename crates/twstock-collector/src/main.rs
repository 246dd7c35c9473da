//! Standalone TWSE price collector CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use twstock_collector::config::parse_floor;
use twstock_collector::modules::{self, PriceSyncer};
use twstock_collector::CollectorConfig;
use twstock_core::{init_logging, Clock, LogConfig, LogFormat, SystemClock};
use twstock_data::{PgDocumentStore, PriceRepository, PriceSource, TwseClient};

#[derive(Parser)]
#[command(name = "twstock-collector")]
#[command(about = "TWSE Daily Price Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long)]
    log_format: Option<String>,

    /// 로그 파일 경로 (콘솔 출력과 함께 기록)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// 추적 하한 (YYYY-MM-DD, 기본: SYNC_TRACEABLE_FLOOR)
    #[arg(long)]
    floor: Option<String>,

    /// 요청 간 최소 간격 (밀리초, 기본: SYNC_REQUEST_INTERVAL_MS)
    #[arg(long)]
    interval_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// 종목 목록 동기화 (조회, 필터링, 저장)
    SyncSecurities,

    /// 시세 동기화
    SyncPrices {
        /// 특정 종목만 동기화 (쉼표로 구분, 예: "2330,0050")
        #[arg(long)]
        codes: Option<String>,
    },

    /// 종목별 저장 현황 조회
    Status {
        /// 특정 종목만 조회 (쉼표로 구분)
        #[arg(long)]
        codes: Option<String>,
    },

    /// 데몬 모드: 주기적으로 시세 동기화 실행
    Daemon {
        /// 특정 종목만 동기화 (쉼표로 구분)
        #[arg(long)]
        codes: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // 로깅 초기화
    let mut log_config = LogConfig::from_env();
    if std::env::var("RUST_LOG").is_err() {
        log_config.level = format!("twstock_collector={0},twstock_data={0}", cli.log_level);
    }
    if let Some(format) = &cli.log_format {
        let format: LogFormat = format.parse().map_err(anyhow::Error::msg)?;
        log_config = log_config.with_format(format);
    }
    if cli.log_file.is_some() {
        log_config = log_config.with_log_file(cli.log_file.clone());
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    tracing::info!("TWSE Price Collector 시작");

    // 설정 로드
    let mut config = CollectorConfig::from_env()?;
    if let Some(floor) = &cli.floor {
        config.sync.traceable_floor = parse_floor(floor)?;
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.sync.request_interval_ms = interval_ms;
    }
    tracing::debug!(
        floor = %config.sync.traceable_floor,
        interval_ms = config.sync.request_interval_ms,
        "설정 로드 완료"
    );

    // 저장소 연결 (실행 종료 시 반드시 close)
    let store = PgDocumentStore::connect(&config.database_url, config.database_max_connections)
        .await
        .context("저장소 연결 실패")?;

    let result = run(cli.command, &config, &store).await;

    store.close().await;
    tracing::info!("TWSE Price Collector 종료");

    result
}

async fn run(
    command: Commands,
    config: &CollectorConfig,
    store: &PgDocumentStore,
) -> anyhow::Result<()> {
    let repo = PriceRepository::new(Arc::new(store.clone()));
    let source: Arc<dyn PriceSource> = Arc::new(TwseClient::new(config.twse.clone())?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Ctrl-C → 윈도우 사이에서 정리 후 종료
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("종료 신호 수신, 현재 윈도우 처리 후 종료합니다");
            signal_token.cancel();
        }
    });

    let syncer = PriceSyncer::new(
        source.clone(),
        repo.clone(),
        clock,
        config.sync.clone(),
        cancel.clone(),
    );

    match command {
        Commands::SyncSecurities => {
            let (securities, outcome) =
                modules::sync_securities(source.as_ref(), &repo, &config.sync).await?;
            tracing::info!(
                count = securities.len(),
                inserted = outcome.inserted,
                skipped = outcome.skipped,
                "종목 목록 동기화 결과"
            );
        }
        Commands::SyncPrices { codes } => {
            let codes = codes.as_deref().map(modules::parse_codes);
            let report = modules::sync_prices(&syncer, codes.as_deref()).await?;
            report.log_summary("시세 동기화");
        }
        Commands::Status { codes } => {
            let registry = modules::fetch_registry(source.as_ref()).await?;
            let securities = match codes.as_deref().map(modules::parse_codes) {
                Some(codes) => {
                    let (selected, unknown) = modules::select_securities(&registry, &codes);
                    if !unknown.is_empty() {
                        tracing::warn!(codes = ?unknown, "종목 목록에 없는 코드");
                    }
                    selected
                }
                None => registry,
            };

            for status in modules::collect_status(&repo, &securities).await? {
                status.log();
            }
        }
        Commands::Daemon { codes } => {
            tracing::info!(
                "=== 데몬 모드 시작 (주기: {}분) ===",
                config.daemon.interval_minutes
            );
            let codes = codes.as_deref().map(modules::parse_codes);

            let mut interval = tokio::time::interval(config.daemon.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("데몬 종료 중...");
                        break;
                    }
                    _ = interval.tick() => {
                        tracing::info!("=== 시세 동기화 실행 시작 ===");

                        match modules::sync_prices(&syncer, codes.as_deref()).await {
                            Ok(report) => report.log_summary("시세 동기화"),
                            Err(e) => tracing::error!("시세 동기화 실패: {}", e),
                        }

                        if cancel.is_cancelled() {
                            break;
                        }
                        tracing::info!(
                            "=== 동기화 완료, 다음 실행: {}분 후 ===",
                            config.daemon.interval_minutes
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
