//! 에러 타입 정의.

use thiserror::Error;
use twstock_data::{DataError, SourceError};

/// Collector 에러 타입
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollectorError {
    /// 종목 목록 조회 실패 (실행 전체 중단)
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// 상장일 조회 실패 (해당 종목만 중단)
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// 소스가 요청을 거부 (미래 날짜, 잘못된 응답 등)
    #[error("Source rejected request: {0}")]
    SourceRejected(String),

    /// 저장소 접근 실패
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<SourceError> for CollectorError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Unavailable(msg) => Self::SourceUnavailable(msg),
            SourceError::EntityNotFound(code) => Self::EntityNotFound(code),
            SourceError::Rejected(msg) => Self::SourceRejected(msg),
            SourceError::Transport(msg) => Self::SourceRejected(format!("transport: {}", msg)),
            SourceError::Malformed(msg) => Self::SourceRejected(format!("malformed: {}", msg)),
        }
    }
}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_mapping() {
        assert_eq!(
            CollectorError::from(SourceError::Unavailable("down".into())),
            CollectorError::SourceUnavailable("down".into())
        );
        assert!(matches!(
            CollectorError::from(SourceError::Transport("timeout".into())),
            CollectorError::SourceRejected(_)
        ));
        assert!(matches!(
            CollectorError::from(DataError::PoolExhausted),
            CollectorError::StorageUnavailable(_)
        ));
    }
}
