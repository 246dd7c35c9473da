//! Standalone TWSE daily price collector.
//!
//! 이 crate는 TWSE 일별 시세를 저장소와 동기화하는 바이너리를 제공합니다:
//! - 종목 목록 동기화 (ISIN 목록 조회, 필터링, 저장)
//! - 재개 지점 계산 (마지막 저장일 / 상장일 / 추적 하한)
//! - 월 단위 시세 수집 (조회 → 정규화 → 멱등 저장)

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::{CollectionStats, SecuritySyncReport, SyncOutcome, SyncRunReport};
