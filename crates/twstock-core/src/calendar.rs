//! 민국력(ROC, 中華民國曆) 날짜 변환.
//!
//! TWSE 시세 응답의 날짜는 `yyy/mm/dd` 형식의 민국력으로 표기됩니다.
//! 민국 연도에 1911을 더하면 서기 연도가 됩니다 (예: `112/03/15` → 2023-03-15).

use chrono::NaiveDate;

use crate::error::{CoreError, Result};

/// 민국력 연도와 서기 연도의 차이.
pub const ROC_YEAR_OFFSET: i32 = 1911;

/// 민국력 날짜 문자열을 서기 날짜로 변환합니다.
///
/// 구분자는 `/`, `-`, `.` 를 허용하며, 날짜 뒤에 붙는 주석 문자
/// (예: `112/03/15＊`)는 무시합니다.
pub fn parse_roc_date(text: &str) -> Result<NaiveDate> {
    let (year, month, day) = split_date(text)?;
    build_date(year + ROC_YEAR_OFFSET, month, day)
}

/// 서기 `yyyy/mm/dd` 날짜 문자열을 파싱합니다 (상장일 표기).
pub fn parse_slash_date(text: &str) -> Result<NaiveDate> {
    let (year, month, day) = split_date(text)?;
    if year < 1000 {
        return Err(CoreError::InvalidDate(text.to_string()));
    }
    build_date(year, month, day)
}

fn split_date(text: &str) -> Result<(i32, u32, u32)> {
    let cleaned: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '/' | '-' | '.'))
        .collect();

    let parts: Vec<&str> = cleaned.split(['/', '-', '.']).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(CoreError::InvalidDate(text.to_string()));
    }

    let invalid = |_| CoreError::InvalidDate(text.to_string());
    let year = parts[0].parse::<i32>().map_err(invalid)?;
    let month = parts[1].parse::<u32>().map_err(invalid)?;
    let day = parts[2].parse::<u32>().map_err(invalid)?;

    Ok((year, month, day))
}

fn build_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(CoreError::OutOfRange { year, month, day })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roc_date() {
        assert_eq!(
            parse_roc_date("112/03/15").unwrap(),
            NaiveDate::from_ymd_opt(2023, 3, 15).unwrap()
        );
        assert_eq!(
            parse_roc_date("99/01/04").unwrap(),
            NaiveDate::from_ymd_opt(2010, 1, 4).unwrap()
        );
        // 주석 문자가 붙은 날짜
        assert_eq!(
            parse_roc_date(" 112/03/15＊").unwrap(),
            NaiveDate::from_ymd_opt(2023, 3, 15).unwrap()
        );
    }

    #[test]
    fn test_parse_roc_date_invalid() {
        assert!(parse_roc_date("").is_err());
        assert!(parse_roc_date("112/03").is_err());
        assert!(parse_roc_date("abc").is_err());
        assert_eq!(
            parse_roc_date("112/02/30"),
            Err(CoreError::OutOfRange {
                year: 2023,
                month: 2,
                day: 30
            })
        );
    }

    #[test]
    fn test_parse_slash_date() {
        assert_eq!(
            parse_slash_date("1994/09/05").unwrap(),
            NaiveDate::from_ymd_opt(1994, 9, 5).unwrap()
        );
        // 민국력 형식은 상장일로 허용하지 않음
        assert!(parse_slash_date("83/09/05").is_err());
    }
}
