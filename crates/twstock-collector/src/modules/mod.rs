//! 데이터 수집 모듈.

pub mod pacing;
pub mod price_sync;
pub mod resume;
pub mod security_sync;
pub mod status;

pub use pacing::Pacer;
pub use price_sync::{sync_prices, PriceSyncer};
pub use resume::{resolve_resume, ResumeCursor};
pub use security_sync::{
    fetch_registry, filter_catalog, parse_codes, select_securities, sync_securities,
    PRIMARY_MARKET_SEGMENTS,
};
pub use status::{collect_status, SecurityStatus};
