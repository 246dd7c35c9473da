//! 메모리 기반 문서 저장소.
//!
//! 테스트와 드라이런 용도입니다. 프로세스가 끝나면 데이터는 사라집니다.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{compare_values, lookup, CollectionKind, Document, DocumentStore, FieldFilter};
use crate::error::Result;

#[derive(Debug)]
struct Collection {
    kind: CollectionKind,
    documents: Vec<Document>,
}

/// 메모리 문서 저장소.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 컬렉션 종류 조회.
    pub async fn collection_kind(&self, name: &str) -> Option<CollectionKind> {
        self.collections.read().await.get(name).map(|c| c.kind)
    }

    /// 컬렉션 문서 전체 (삽입 순서).
    pub async fn documents(&self, name: &str) -> Vec<Document> {
        self.collections
            .read()
            .await
            .get(name)
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn ensure_collection(&self, name: &str, kind: CollectionKind) -> Result<CollectionKind> {
        let mut collections = self.collections.write().await;
        let entry = collections.entry(name.to_string()).or_insert_with(|| Collection {
            kind,
            documents: Vec::new(),
        });
        Ok(entry.kind)
    }

    async fn find_one(&self, collection: &str, filter: &FieldFilter) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.documents.iter().find(|d| filter.matches(d)).cloned()))
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_insert_with(|| Collection {
                kind: CollectionKind::General,
                documents: Vec::new(),
            })
            .documents
            .push(document);
        Ok(())
    }

    async fn find_latest(&self, collection: &str, sort_field: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        let Some(c) = collections.get(collection) else {
            return Ok(None);
        };

        let latest = c
            .documents
            .iter()
            .filter_map(|d| lookup(d, sort_field).map(|v| (v, d)))
            .max_by(|(a, _), (b, _)| compare_values(a, b))
            .map(|(_, d)| d.clone());

        Ok(latest)
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| c.documents.len() as u64)
            .unwrap_or(0))
    }
}
