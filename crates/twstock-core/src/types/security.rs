//! 종목(Security) 정의.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 종목 구분 (有價證券別).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SecurityKind {
    /// 상장지수펀드
    Etf,
    /// 보통주 (股票)
    Equity,
    /// 그 외 (권리증서, 워런트, 수익증권 등)
    Other(String),
}

impl SecurityKind {
    /// 소스 표기에서 종목 구분 파싱.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "ETF" => Self::Etf,
            "股票" | "equity" => Self::Equity,
            other => Self::Other(other.to_string()),
        }
    }

    /// 동기화 대상 구분인지 여부.
    pub fn is_tracked(&self) -> bool {
        matches!(self, Self::Etf | Self::Equity)
    }
}

impl fmt::Display for SecurityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Etf => write!(f, "ETF"),
            Self::Equity => write!(f, "equity"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<String> for SecurityKind {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<SecurityKind> for String {
    fn from(kind: SecurityKind) -> Self {
        kind.to_string()
    }
}

/// 거래 가능한 종목.
///
/// 종목 목록은 동기화 실행마다 한 번 조회되며 실행 중에는 변하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    /// 종목 코드 (예: "2330", "0050")
    pub code: String,
    /// 종목명. 시세 컬렉션 이름으로도 사용됩니다.
    pub name: String,
    /// 종목 구분
    pub kind: SecurityKind,
    /// 시장 구분 (市場別, 예: "上市")
    pub market_segment: String,
    /// 상장일. 목록에 없으면 `None`이며 필요 시 소스에서 다시 조회합니다.
    pub listed_date: Option<NaiveDate>,
}

impl Security {
    /// 코드의 첫 글자와 마지막 글자가 모두 영문자가 아닌지 확인.
    ///
    /// 권리증서·워런트 등은 코드 앞뒤에 영문자가 붙습니다.
    pub fn has_plain_code(&self) -> bool {
        match (self.code.chars().next(), self.code.chars().last()) {
            (Some(first), Some(last)) => !first.is_alphabetic() && !last.is_alphabetic(),
            _ => false,
        }
    }

    /// 시세 레코드가 참조하는 식별 정보.
    pub fn reference(&self) -> SecurityRef {
        SecurityRef {
            code: self.code.clone(),
            name: self.name.clone(),
        }
    }

    /// 시세 컬렉션 이름.
    pub fn collection_name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.name)
    }
}

/// 시세 레코드에 저장되는 종목 메타데이터.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityRef {
    pub code: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn security(code: &str) -> Security {
        Security {
            code: code.to_string(),
            name: "테스트".to_string(),
            kind: SecurityKind::Equity,
            market_segment: "上市".to_string(),
            listed_date: None,
        }
    }

    #[test]
    fn test_has_plain_code() {
        assert!(security("2330").has_plain_code());
        assert!(security("0050").has_plain_code());
        assert!(security("00632R1").has_plain_code());
        assert!(!security("00632R").has_plain_code());
        assert!(!security("T1234").has_plain_code());
        assert!(!security("").has_plain_code());
    }

    #[test]
    fn test_security_kind_parse() {
        assert_eq!(SecurityKind::parse("ETF"), SecurityKind::Etf);
        assert_eq!(SecurityKind::parse("股票"), SecurityKind::Equity);
        assert_eq!(
            SecurityKind::parse("特別股"),
            SecurityKind::Other("特別股".to_string())
        );
        assert!(SecurityKind::Etf.is_tracked());
        assert!(!SecurityKind::parse("受益證券").is_tracked());
    }

    #[test]
    fn test_security_kind_serde() {
        let json = serde_json::to_string(&SecurityKind::Equity).unwrap();
        assert_eq!(json, "\"equity\"");
        let kind: SecurityKind = serde_json::from_str("\"ETF\"").unwrap();
        assert_eq!(kind, SecurityKind::Etf);
    }
}
