//! System facts - 전체 RAM, 필요한 외부 도구 존재 여부

use crate::{Error, Result};
use std::path::Path;

/// `/proc/meminfo` 경로
pub const MEMINFO_PATH: &str = "/proc/meminfo";

/// 전체 물리 메모리 (MB)
pub fn total_ram_mb() -> Result<u64> {
    total_ram_mb_from(Path::new(MEMINFO_PATH))
}

pub fn total_ram_mb_from(path: &Path) -> Result<u64> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config_read(path, e.to_string()))?;
    parse_meminfo(&content)
        .ok_or_else(|| Error::config_read(path, "no MemTotal line"))
}

/// `MemTotal:  16318480 kB` -> MB (1024로 내림 나눗셈)
pub fn parse_meminfo(content: &str) -> Option<u64> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("MemTotal:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb / 1024)
}

/// 외부 도구 감지 결과
#[derive(Debug, Clone)]
pub struct SystemProbe {
    pub has_elevation: bool,
    pub has_systemctl: bool,
}

impl SystemProbe {
    pub fn detect(elevation_program: &str) -> Self {
        Self {
            has_elevation: which::which(elevation_program).is_ok(),
            has_systemctl: which::which("systemctl").is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "MemTotal:       16318480 kB\n\
                           MemFree:         1022324 kB\n\
                           MemAvailable:    9360232 kB\n";

    #[test]
    fn test_parse_meminfo() {
        assert_eq!(parse_meminfo(MEMINFO), Some(15935));
    }

    #[test]
    fn test_parse_meminfo_missing() {
        assert_eq!(parse_meminfo("MemFree: 10 kB\n"), None);
        assert_eq!(parse_meminfo("MemTotal: lots kB\n"), None);
    }

    #[test]
    fn test_total_ram_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meminfo");
        std::fs::write(&path, MEMINFO).unwrap();
        assert_eq!(total_ram_mb_from(&path).unwrap(), 15935);

        let missing = total_ram_mb_from(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(missing, Error::ConfigRead { .. }));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_total_ram_on_linux() {
        assert!(total_ram_mb().unwrap() > 0);
    }
}
