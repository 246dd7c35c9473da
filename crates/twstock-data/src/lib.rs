//! 데이터 소스 연동 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - TWSE 종목 목록/상장일/월별 시세 조회 (`PriceSource`, `TwseClient`)
//! - 원시 시세 행 정규화 (이월 대체 포함)
//! - 문서 저장소 추상화 (PostgreSQL, 메모리)
//! - 존재 확인 후 삽입 방식의 멱등 시세 저장소

pub mod error;
pub mod normalize;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result};
pub use normalize::{normalize, PriorContext};
pub use provider::{CatalogRow, PriceSource, RawPriceTable, SourceError, TwseClient, TwseConfig};
pub use storage::memory::MemoryDocumentStore;
pub use storage::postgres::PgDocumentStore;
pub use storage::price::{PriceRepository, UpsertOutcome, REGISTRY_COLLECTION};
pub use storage::{CollectionKind, Document, DocumentStore, FieldFilter};
