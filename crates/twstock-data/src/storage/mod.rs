//! 문서 저장소.
//!
//! 컬렉션 단위로 JSON 문서를 저장하는 단순한 문서 저장소 추상화입니다.
//! - `PgDocumentStore`: PostgreSQL JSONB 기반
//! - `MemoryDocumentStore`: 프로세스 메모리 기반 (테스트, 드라이런)
//!
//! 시계열 컬렉션의 문서는 `timestamp` 필드와 `metadata` 하위 문서를 가집니다.

pub mod memory;
pub mod postgres;
pub mod price;

use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use crate::error::Result;

/// 저장 문서.
pub type Document = serde_json::Map<String, Value>;

/// 시계열 컬렉션의 시간 필드.
pub const TIME_FIELD: &str = "timestamp";

/// 시계열 컬렉션의 메타데이터 필드.
pub const META_FIELD: &str = "metadata";

/// 컬렉션 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// 스키마 없는 일반 컬렉션
    General,
    /// 시계열 컬렉션 (`timestamp` + `metadata`)
    TimeSeries,
}

impl CollectionKind {
    /// 저장용 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::TimeSeries => "timeseries",
        }
    }

    /// 저장된 문자열에서 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "general" => Some(Self::General),
            "timeseries" => Some(Self::TimeSeries),
            _ => None,
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 필드별 일치 조건 (점 표기 경로 → 값).
///
/// 하위 문서 전체를 한 번에 비교하지 않고 필드 하나하나를 따로 비교합니다.
/// 하위 문서 비교는 키 순서에 민감할 수 있고, 메타데이터의 키 순서는 레코드 생성
/// 방식에 따라 달라질 수 있기 때문입니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldFilter {
    conditions: Vec<(String, Value)>,
}

impl FieldFilter {
    /// 빈 조건 (모든 문서와 일치).
    pub fn new() -> Self {
        Self::default()
    }

    /// 조건 추가.
    pub fn with_field(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((path.into(), value.into()));
        self
    }

    /// 조건 목록.
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// 문서의 식별 조건 생성.
    ///
    /// - 시계열: `metadata.*` 각 필드 + `timestamp`
    /// - 일반: 최상위 필드 전체
    pub fn identity_of(document: &Document, kind: CollectionKind) -> Self {
        let mut filter = Self::new();

        match kind {
            CollectionKind::TimeSeries => {
                if let Some(Value::Object(meta)) = document.get(META_FIELD) {
                    for (key, value) in meta {
                        filter = filter.with_field(format!("{}.{}", META_FIELD, key), value.clone());
                    }
                }
                if let Some(ts) = document.get(TIME_FIELD) {
                    filter = filter.with_field(TIME_FIELD, ts.clone());
                }
            }
            CollectionKind::General => {
                for (key, value) in document {
                    filter = filter.with_field(key.clone(), value.clone());
                }
            }
        }

        filter
    }

    /// 문서가 모든 조건을 만족하는지 확인.
    ///
    /// `null` 조건은 필드가 없거나 `null`인 경우와 일치합니다.
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(path, expected)| match lookup(document, path) {
                Some(actual) => actual == expected,
                None => expected.is_null(),
            })
    }
}

/// 점 표기 경로로 필드 조회.
pub fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// 정렬용 값 비교 (숫자, 문자열, 그 외 순).
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// 문서 저장소.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 컬렉션이 없으면 생성하고, 실제 컬렉션 종류를 반환.
    async fn ensure_collection(&self, name: &str, kind: CollectionKind) -> Result<CollectionKind>;

    /// 조건과 일치하는 문서 하나 조회.
    async fn find_one(&self, collection: &str, filter: &FieldFilter) -> Result<Option<Document>>;

    /// 문서 하나 삽입.
    async fn insert_one(&self, collection: &str, document: Document) -> Result<()>;

    /// `sort_field` 내림차순 첫 문서 조회.
    async fn find_latest(&self, collection: &str, sort_field: &str) -> Result<Option<Document>>;

    /// 컬렉션 문서 수.
    async fn count(&self, collection: &str) -> Result<u64>;
}
