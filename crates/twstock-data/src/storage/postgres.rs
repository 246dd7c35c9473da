//! PostgreSQL 문서 저장소.
//!
//! 모든 컬렉션의 문서를 하나의 JSONB 테이블에 저장하고, 컬렉션 종류는 별도 테이블에
//! 기록합니다. 필드 조건은 `body #> path` 비교로 변환됩니다.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, Postgres};
use sqlx::QueryBuilder;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::{CollectionKind, Document, DocumentStore, FieldFilter};
use crate::error::{DataError, Result};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS document_collections (
        name TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id BIGSERIAL PRIMARY KEY,
        collection TEXT NOT NULL,
        body JSONB NOT NULL,
        inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_documents_collection_timestamp
        ON documents (collection, (body #> '{timestamp}'))
    "#,
];

/// PostgreSQL JSONB 문서 저장소.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// 연결 풀을 생성하고 스키마를 준비합니다.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        info!("데이터베이스 연결 중...");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(url)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        let store = Self { pool };
        store.ensure_schema().await?;

        info!("데이터베이스 연결 완료");
        Ok(store)
    }

    /// 테이블과 인덱스 생성 (이미 있으면 무시).
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("문서 저장소 스키마 확인 완료");
        Ok(())
    }

    /// 연결 풀 종료.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn path_segments(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

/// SQL에 직접 넣는 경로 리터럴 (`'{a,b}'`).
///
/// 인덱스 식과 같은 형태여야 플래너가 인덱스를 사용합니다.
/// 식별자 문자(영숫자, `_`)만 허용합니다.
fn path_literal(path: &str) -> Result<String> {
    let segments = path_segments(path);
    let valid = segments.iter().all(|s| {
        !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    if !valid {
        return Err(DataError::InvalidData(format!("잘못된 필드 경로: {}", path)));
    }
    Ok(format!("'{{{}}}'", segments.join(",")))
}

fn parse_body(body: &str) -> Result<Document> {
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    #[instrument(skip(self))]
    async fn ensure_collection(&self, name: &str, kind: CollectionKind) -> Result<CollectionKind> {
        sqlx::query(
            "INSERT INTO document_collections (name, kind) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;

        let stored: String =
            sqlx::query_scalar("SELECT kind FROM document_collections WHERE name = $1")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;

        CollectionKind::parse(&stored)
            .ok_or_else(|| DataError::InvalidData(format!("알 수 없는 컬렉션 종류: {}", stored)))
    }

    async fn find_one(&self, collection: &str, filter: &FieldFilter) -> Result<Option<Document>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT body::text FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());

        for (path, value) in filter.conditions() {
            let segments = path_segments(path);
            if value.is_null() {
                qb.push(" AND (body #> ");
                qb.push_bind(segments.clone());
                qb.push("::text[] IS NULL OR body #> ");
                qb.push_bind(segments);
                qb.push("::text[] = 'null'::jsonb)");
            } else {
                qb.push(" AND body #> ");
                qb.push_bind(segments);
                qb.push("::text[] = ");
                qb.push_bind(value.to_string());
                qb.push("::jsonb");
            }
        }
        qb.push(" LIMIT 1");

        let row: Option<(String,)> = qb.build_query_as().fetch_optional(&self.pool).await?;
        row.map(|(body,)| parse_body(&body)).transpose()
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<()> {
        let body = serde_json::to_string(&document)?;
        sqlx::query("INSERT INTO documents (collection, body) VALUES ($1, $2::jsonb)")
            .bind(collection)
            .bind(body)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_latest(&self, collection: &str, sort_field: &str) -> Result<Option<Document>> {
        let path = path_literal(sort_field)?;
        let sql = format!(
            "SELECT body::text FROM documents \
             WHERE collection = $1 AND body #> {path} IS NOT NULL \
             ORDER BY body #> {path} DESC \
             LIMIT 1",
            path = path
        );

        let body: Option<String> = sqlx::query_scalar(&sql)
            .bind(collection)
            .fetch_optional(&self.pool)
            .await?;

        body.map(|b| parse_body(&b)).transpose()
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = $1")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
