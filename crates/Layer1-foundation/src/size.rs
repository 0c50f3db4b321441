//! Size Unit - 사람이 읽는 크기 문자열 <-> 메가바이트 정수
//!
//! `"200M"`, `"1G"`, `"512K"`, 단위 없는 바이트 수를 받아 MB로 변환합니다.
//! 쓰기는 항상 `"<n>M"` 형태 하나뿐이라 `parse(format(n)) == n`은 성립하지만
//! `format(parse(s)) == s`는 성립하지 않습니다 (`"1G"` -> `"1024M"`).

use crate::{Error, Result};

const MB_PER_GB: u64 = 1024;
const KB_PER_MB: u64 = 1024;
const BYTES_PER_MB: u64 = 1024 * 1024;

/// 크기 문자열을 MB로 변환
///
/// 1 MB 미만은 0 쪽으로 버림 (`"512K"` -> 0).
pub fn parse(text: &str) -> Result<u64> {
    let normalized = text.trim().to_uppercase();
    let invalid = || Error::InvalidSizeFormat(text.to_string());

    let unit = normalized
        .chars()
        .last()
        .filter(|c| matches!(c, 'G' | 'M' | 'K'));
    let digits = match unit {
        Some(_) => &normalized[..normalized.len() - 1],
        None => normalized.as_str(),
    }
    .trim();

    if digits.is_empty() || digits.starts_with('-') {
        return Err(invalid());
    }
    let value: u64 = digits.parse().map_err(|_| invalid())?;

    match unit {
        Some('G') => value.checked_mul(MB_PER_GB).ok_or_else(invalid),
        Some('M') => Ok(value),
        Some(_) => Ok(value / KB_PER_MB),
        // 단위가 없으면 바이트
        None => Ok(value / BYTES_PER_MB),
    }
}

/// MB 값을 정규 형태 `"<n>M"`로 변환
pub fn format(megabytes: u64) -> String {
    format!("{}M", megabytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse("1G").unwrap(), 1024);
        assert_eq!(parse("200M").unwrap(), 200);
        assert_eq!(parse("2048K").unwrap(), 2);
        assert_eq!(parse("1048576").unwrap(), 1);
        assert_eq!(parse("0M").unwrap(), 0);
    }

    #[test]
    fn test_parse_is_case_and_space_insensitive() {
        assert_eq!(parse("  200m ").unwrap(), 200);
        assert_eq!(parse("1g").unwrap(), 1024);
    }

    #[test]
    fn test_sub_megabyte_truncates() {
        assert_eq!(parse("512K").unwrap(), 0);
        assert_eq!(parse("1048575").unwrap(), 0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["abc", "", "M", "-5M", "1.5G", "12X", "   "] {
            assert!(
                matches!(parse(bad), Err(Error::InvalidSizeFormat(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        let huge = format!("{}G", u64::MAX);
        assert!(matches!(parse(&huge), Err(Error::InvalidSizeFormat(_))));
    }

    #[test]
    fn test_format_is_always_megabytes() {
        assert_eq!(format(1024), "1024M");
        assert_eq!(format(0), "0M");
    }

    #[test]
    fn test_format_then_parse_preserves_value() {
        for s in ["1G", "200M", "4096K", "0M", "3145728"] {
            let mb = parse(s).unwrap();
            assert_eq!(parse(&format(mb)).unwrap(), mb);
        }
    }
}
