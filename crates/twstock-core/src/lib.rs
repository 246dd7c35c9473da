//! # TwStock Core
//!
//! 대만 증권거래소(TWSE) 일별 시세 동기화기의 핵심 도메인 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 종목(Security) 및 종목 구분
//! - 일별 시세 레코드(PriceRecord)
//! - 월 단위 조회 윈도우(FetchWindow)
//! - 민국력(ROC) ↔ 서기 변환
//! - 주입 가능한 시계(Clock)
//! - 로깅 인프라

pub mod calendar;
pub mod clock;
pub mod error;
pub mod logging;
pub mod types;

pub use calendar::{parse_roc_date, parse_slash_date, ROC_YEAR_OFFSET};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, Result};
pub use logging::*;
pub use types::*;
