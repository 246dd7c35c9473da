//! 시세 동기화 모듈.
//!
//! 종목마다 재개 지점부터 오늘이 속한 월까지 월 단위로 진행합니다.
//! 윈도우 하나의 조회 → 정규화 → 저장이 끝나야 다음 윈도우로 넘어갑니다.

use crate::config::SyncConfig;
use crate::modules::pacing::Pacer;
use crate::modules::resume::resolve_resume;
use crate::modules::security_sync::{select_securities, sync_securities};
use crate::stats::{SecuritySyncReport, SyncOutcome, SyncRunReport};
use crate::{CollectorError, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use twstock_core::{Clock, FetchWindow, PriceRecord, Security};
use twstock_data::{normalize, PriceRepository, PriceSource, PriorContext, RawPriceTable};

/// 종목 하나의 동기화 상태.
#[derive(Debug)]
enum SyncState {
    Resolving,
    Fetching(FetchWindow),
    Normalizing(FetchWindow, RawPriceTable),
    Persisting(FetchWindow, Vec<PriceRecord>),
    Advancing(FetchWindow),
    Done,
    Aborted(CollectorError),
    Cancelled,
}

/// 시세 동기화기.
pub struct PriceSyncer {
    source: Arc<dyn PriceSource>,
    repo: PriceRepository,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
    cancel: CancellationToken,
}

impl PriceSyncer {
    pub fn new(
        source: Arc<dyn PriceSource>,
        repo: PriceRepository,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            repo,
            clock,
            config,
            cancel,
        }
    }

    /// 종목 목록 전체 동기화.
    ///
    /// 종목별 오류는 기록만 하고 다음 종목으로 넘어갑니다.
    /// 취소되면 남은 종목은 시작하지 않습니다.
    pub async fn run(&self, securities: &[Security]) -> SyncRunReport {
        let start = Instant::now();
        let mut report = SyncRunReport::default();
        let mut pacer = Pacer::new(self.config.request_interval());

        for (idx, security) in securities.iter().enumerate() {
            if self.cancel.is_cancelled() {
                report.not_started = securities.len() - idx;
                tracing::info!(remaining = report.not_started, "취소 신호 수신, 동기화 중단");
                break;
            }

            tracing::debug!(
                code = %security.code,
                progress = format!("{}/{}", idx + 1, securities.len()),
                "종목 동기화 시작"
            );

            let security_report = self.sync_security(security, &mut pacer).await;
            security_report.log_summary();
            report.push(security_report);
        }

        report.stats.elapsed = start.elapsed();
        report
    }

    /// 종목 하나 동기화.
    #[tracing::instrument(skip(self, security, pacer), fields(code = %security.code))]
    pub async fn sync_security(&self, security: &Security, pacer: &mut Pacer) -> SecuritySyncReport {
        let mut report = SecuritySyncReport::new(security);
        let entity_ref = security.reference();
        let today = self.clock.today();
        let mut context = PriorContext::empty();
        let mut resume_date = NaiveDate::MIN;
        let mut state = SyncState::Resolving;

        loop {
            state = match state {
                SyncState::Resolving => {
                    match resolve_resume(
                        security,
                        &self.repo,
                        self.source.as_ref(),
                        self.config.traceable_floor,
                    )
                    .await
                    {
                        Ok(cursor) => {
                            report.resume_date = Some(cursor.resume_date);
                            resume_date = cursor.resume_date;
                            context = PriorContext::from_record(cursor.last_stored.as_ref());

                            if cursor.resume_date > today || cursor.window.start() > today {
                                tracing::debug!(%resume_date, "이미 최신 상태");
                                SyncState::Done
                            } else {
                                SyncState::Fetching(cursor.window)
                            }
                        }
                        Err(e) => SyncState::Aborted(e),
                    }
                }

                SyncState::Fetching(window) => {
                    if !pacer.wait(&self.cancel).await {
                        SyncState::Cancelled
                    } else {
                        match self.source.fetch_month_prices(&security.code, window).await {
                            Ok(table) => {
                                report.windows_fetched += 1;
                                report.last_window = Some(window);
                                SyncState::Normalizing(window, table)
                            }
                            Err(e) => {
                                tracing::warn!(window = %window, error = %e, "윈도우 조회 실패");
                                SyncState::Aborted(e.into())
                            }
                        }
                    }
                }

                SyncState::Normalizing(window, table) => {
                    let records: Vec<PriceRecord> = normalize(&entity_ref, &table, &mut context)
                        .into_iter()
                        .filter(|r| r.timestamp >= resume_date)
                        .collect();
                    tracing::debug!(
                        window = %window,
                        rows = table.data.len(),
                        records = records.len(),
                        "정규화 완료"
                    );
                    SyncState::Persisting(window, records)
                }

                SyncState::Persisting(window, records) => {
                    match self.repo.upsert(security, &records).await {
                        Ok(outcome) => {
                            report.inserted += outcome.inserted;
                            report.skipped += outcome.skipped;
                            SyncState::Advancing(window)
                        }
                        Err(e) => SyncState::Aborted(e.into()),
                    }
                }

                SyncState::Advancing(window) => {
                    let next = window.next();
                    if next.start() <= today {
                        SyncState::Fetching(next)
                    } else {
                        SyncState::Done
                    }
                }

                SyncState::Done => {
                    report.outcome = SyncOutcome::ReachedToday;
                    break;
                }

                SyncState::Aborted(e) => {
                    report.outcome = SyncOutcome::Aborted(e.to_string());
                    break;
                }

                SyncState::Cancelled => {
                    report.outcome = SyncOutcome::Cancelled;
                    break;
                }
            };
        }

        report
    }
}

/// 전체 시세 동기화 (종목 목록 → 선택 → 종목별 동기화).
///
/// 종목 목록을 가져오지 못하면 실행 전체가 실패합니다.
pub async fn sync_prices(syncer: &PriceSyncer, codes: Option<&[String]>) -> Result<SyncRunReport> {
    let (registry, _) = sync_securities(
        syncer.source.as_ref(),
        &syncer.repo,
        &syncer.config,
    )
    .await?;

    let (targets, unknown_codes) = match codes {
        Some(codes) => {
            let (selected, unknown) = select_securities(&registry, codes);
            tracing::info!(count = selected.len(), "선택 종목 동기화");
            (selected, unknown)
        }
        None => (registry, Vec::new()),
    };

    if targets.is_empty() {
        tracing::warn!("동기화할 종목이 없습니다");
    }

    let mut report = syncer.run(&targets).await;
    report.unknown_codes = unknown_codes;
    Ok(report)
}
