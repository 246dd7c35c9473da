//! 핵심 도메인 에러 타입.

use thiserror::Error;

/// 도메인 타입 변환 중 발생하는 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// 날짜 문자열 형식 오류
    #[error("날짜 형식 오류: {0}")]
    InvalidDate(String),

    /// 존재하지 않는 달력 날짜 (예: 2월 30일)
    #[error("유효하지 않은 날짜: {year}-{month}-{day}")]
    OutOfRange { year: i32, month: u32, day: u32 },
}

pub type Result<T> = std::result::Result<T, CoreError>;
