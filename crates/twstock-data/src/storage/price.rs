//! 시세 저장소.
//!
//! 종목별 시계열 컬렉션(컬렉션 이름 = 종목명)에 일별 시세를 저장합니다.
//! 삽입 전에 동일 문서가 있는지 확인하므로 같은 레코드를 여러 번 저장해도
//! 문서는 하나만 남습니다.

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use twstock_core::{PriceRecord, Security};

use super::{CollectionKind, Document, DocumentStore, FieldFilter, META_FIELD, TIME_FIELD};
use crate::error::{DataError, Result};

/// 종목 목록을 저장하는 일반 컬렉션.
pub const REGISTRY_COLLECTION: &str = "securities";

/// 저장 결과.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// 새로 삽입된 문서 수
    pub inserted: usize,
    /// 이미 존재해서 건너뛴 문서 수
    pub skipped: usize,
}

/// 시세 저장소.
#[derive(Clone)]
pub struct PriceRepository {
    store: Arc<dyn DocumentStore>,
}

impl PriceRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// 시세 레코드 저장 (존재 확인 후 삽입).
    #[instrument(skip(self, security, records), fields(code = %security.code, count = records.len()))]
    pub async fn upsert(&self, security: &Security, records: &[PriceRecord]) -> Result<UpsertOutcome> {
        let collection = security.collection_name();
        let kind = self
            .store
            .ensure_collection(collection, CollectionKind::TimeSeries)
            .await?;

        let mut outcome = UpsertOutcome::default();
        for record in records {
            let document = to_document(record)?;
            if self.insert_if_absent(collection, kind, document).await? {
                outcome.inserted += 1;
            } else {
                outcome.skipped += 1;
            }
        }

        debug!(
            inserted = outcome.inserted,
            skipped = outcome.skipped,
            "시세 저장 완료"
        );
        Ok(outcome)
    }

    /// 종목 목록 저장 (존재 확인 후 삽입).
    #[instrument(skip(self, securities), fields(count = securities.len()))]
    pub async fn save_registry(&self, securities: &[Security]) -> Result<UpsertOutcome> {
        let kind = self
            .store
            .ensure_collection(REGISTRY_COLLECTION, CollectionKind::General)
            .await?;

        let mut outcome = UpsertOutcome::default();
        for security in securities {
            let document = to_document(security)?;
            if self.insert_if_absent(REGISTRY_COLLECTION, kind, document).await? {
                outcome.inserted += 1;
            } else {
                outcome.skipped += 1;
            }
        }
        Ok(outcome)
    }

    /// 가장 최근 저장 일자.
    pub async fn latest_timestamp(&self, security: &Security) -> Result<Option<NaiveDate>> {
        Ok(self.latest_record(security).await?.map(|r| r.timestamp))
    }

    /// 가장 최근 저장 레코드.
    pub async fn latest_record(&self, security: &Security) -> Result<Option<PriceRecord>> {
        self.store
            .find_latest(security.collection_name(), TIME_FIELD)
            .await?
            .map(from_document)
            .transpose()
    }

    /// 특정 일자 레코드 조회.
    pub async fn get_record(&self, security: &Security, date: NaiveDate) -> Result<Option<PriceRecord>> {
        let filter = FieldFilter::new()
            .with_field(format!("{}.code", META_FIELD), security.code.as_str())
            .with_field(format!("{}.name", META_FIELD), security.name.as_str())
            .with_field(TIME_FIELD, date.to_string());

        self.store
            .find_one(security.collection_name(), &filter)
            .await?
            .map(from_document)
            .transpose()
    }

    /// 종목의 저장 레코드 수.
    pub async fn count(&self, security: &Security) -> Result<u64> {
        self.store.count(security.collection_name()).await
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        kind: CollectionKind,
        document: Document,
    ) -> Result<bool> {
        let filter = FieldFilter::identity_of(&document, kind);
        if self.store.find_one(collection, &filter).await?.is_some() {
            return Ok(false);
        }
        self.store.insert_one(collection, document).await?;
        Ok(true)
    }
}

fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(DataError::InvalidData(format!(
            "문서는 객체여야 합니다: {}",
            other
        ))),
    }
}

fn from_document<T: DeserializeOwned>(document: Document) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::Object(document))?)
}
