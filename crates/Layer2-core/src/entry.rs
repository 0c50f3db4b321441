//! Entry Store - 캐시 항목별 설정 (folders.conf)
//!
//! 항목마다 섹션 하나, 예약된 `GLOBAL` 섹션에는 전체 예산만 둡니다.
//! 저장은 항상 전체 재생성이며, 예산 검증은 호출자가 `BudgetLedger`로 합니다.

use serde::{Deserialize, Serialize};
use ssdsaver_foundation::{parse_sections, render_sections, size, PrivilegedWriter, Section};
use ssdsaver_foundation::{Error, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// 전체 예산 섹션 이름 (항목 이름으로 사용 불가)
pub const GLOBAL_SECTION: &str = "GLOBAL";

/// 경로 목록 구분자
pub const PATH_SEPARATOR: char = ';';

const KEY_ENABLED: &str = "enabled";
const KEY_SIZE: &str = "size";
const KEY_MODE: &str = "mode";
const KEY_PATHS: &str = "paths";
const KEY_BUDGET: &str = "budget";

// ============================================================================
// Sync Mode
// ============================================================================

/// 동기화 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// 주기적으로 디스크에 되돌려 씀
    #[default]
    Safe,
    /// 메모리에만 유지
    Lossy,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Lossy => "lossy",
        }
    }
}

impl FromStr for SyncMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "safe" => Ok(Self::Safe),
            "lossy" => Ok(Self::Lossy),
            other => Err(Error::InvalidEntry(format!(
                "unknown mode '{}' (expected safe or lossy)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entry
// ============================================================================

/// 캐시 항목 하나
///
/// 저장소에 없는 항목은 `enabled: false`와 같습니다.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Entry {
    pub enabled: bool,
    pub size_mb: u64,
    pub mode: SyncMode,
    pub paths: Vec<String>,
}

impl Entry {
    fn from_section(section: &Section, path: &Path) -> Result<Self> {
        let fail = |message: String| {
            Error::config_read(
                path,
                format!("[{}] (line {}): {}", section.name, section.line, message),
            )
        };

        let mut entry = Entry::default();
        for (key, value) in &section.entries {
            match key.as_str() {
                KEY_ENABLED => {
                    entry.enabled = parse_bool(value)
                        .ok_or_else(|| fail(format!("invalid boolean {:?}", value)))?;
                }
                KEY_SIZE => entry.size_mb = size::parse(value).map_err(|e| fail(e.to_string()))?,
                KEY_MODE => entry.mode = value.parse().map_err(|e: Error| fail(e.to_string()))?,
                KEY_PATHS => {
                    entry.paths = split_paths(value);
                    validate_paths(&entry.paths).map_err(|e| fail(e.to_string()))?;
                }
                other => return Err(fail(format!("unknown key '{}'", other))),
            }
        }
        Ok(entry)
    }

    fn to_section(&self, name: &str) -> Section {
        let section = Section::new(name)
            .with(KEY_ENABLED, self.enabled.to_string())
            .with(KEY_SIZE, size::format(self.size_mb))
            .with(KEY_MODE, self.mode.as_str());

        if self.paths.is_empty() {
            section
        } else {
            section.with(KEY_PATHS, join_paths(&self.paths))
        }
    }
}

// ============================================================================
// Entry Store
// ============================================================================

/// 항목 설정 저장소
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStore {
    path: PathBuf,
    /// 섹션 삽입 순서 유지
    entries: Vec<(String, Entry)>,
    global_budget_mb: Option<u64>,
}

impl EntryStore {
    /// 빈 저장소
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
            global_budget_mb: None,
        }
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 파일 로드 (없으면 빈 저장소)
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Entry file absent, starting empty");
                return Ok(Self::new(path));
            }
            Err(e) => return Err(Error::config_read(&path, e.to_string())),
        };

        let store = Self::parse(&content, path)?;
        debug!(
            path = %store.path.display(),
            entries = store.entries.len(),
            "Loaded entry store"
        );
        Ok(store)
    }

    /// 텍스트에서 파싱
    pub fn parse(content: &str, path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::new(path);

        for section in parse_sections(content, &store.path)? {
            if section.name == GLOBAL_SECTION {
                store.global_budget_mb = parse_global(&section, &store.path)?;
            } else {
                validate_name(&section.name)
                    .map_err(|e| Error::config_read(&store.path, e.to_string()))?;
                let entry = Entry::from_section(&section, &store.path)?;
                store.entries.push((section.name, entry));
            }
        }
        Ok(store)
    }

    /// 전체 섹션 텍스트 (항목 순서대로, GLOBAL은 마지막)
    pub fn serialize(&self) -> String {
        let mut sections: Vec<Section> = self
            .entries
            .iter()
            .map(|(name, entry)| entry.to_section(name))
            .collect();

        if let Some(budget) = self.global_budget_mb {
            sections.push(Section::new(GLOBAL_SECTION).with(KEY_BUDGET, size::format(budget)));
        }
        render_sections(&sections)
    }

    /// 권한 채널로 전체 저장 (실패해도 메모리 상태는 그대로)
    pub fn save(&self, writer: &dyn PrivilegedWriter) -> Result<()> {
        writer.write(&self.path, &self.serialize())?;
        info!(path = %self.path.display(), entries = self.entries.len(), "Saved entry store");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ========================================================================
    // 조회
    // ========================================================================

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, entry)| entry)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).map(|e| e.enabled).unwrap_or(false)
    }

    /// 모든 항목 (삽입 순서)
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    /// 활성 항목 이름 (삽입 순서)
    pub fn enabled_entries(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, e)| e.enabled)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    pub fn global_budget_mb(&self) -> Option<u64> {
        self.global_budget_mb
    }

    // ========================================================================
    // 수정
    // ========================================================================

    /// 항목 upsert (예산 검증 없음)
    pub fn set_entry(
        &mut self,
        name: &str,
        enabled: bool,
        size_mb: u64,
        mode: SyncMode,
        paths: Vec<String>,
    ) -> Result<()> {
        validate_name(name)?;
        validate_paths(&paths)?;

        let entry = Entry {
            enabled,
            size_mb,
            mode,
            paths,
        };
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((name.to_string(), entry)),
        }
        Ok(())
    }

    /// 비활성화만 (크기/모드/경로는 유지)
    ///
    /// 항목이 없으면 false.
    pub fn clear_entry_enabled(&mut self, name: &str) -> bool {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, entry)) => {
                entry.enabled = false;
                true
            }
            None => false,
        }
    }

    /// GLOBAL.budget 설정 (항목은 건드리지 않음)
    pub fn set_global_budget(&mut self, budget_mb: u64) {
        self.global_budget_mb = Some(budget_mb);
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_global(section: &Section, path: &Path) -> Result<Option<u64>> {
    let mut budget = None;
    for (key, value) in &section.entries {
        if key != KEY_BUDGET {
            return Err(Error::config_read(
                path,
                format!("[{}] (line {}): unknown key '{}'", GLOBAL_SECTION, section.line, key),
            ));
        }
        budget = Some(size::parse(value).map_err(|e| Error::config_read(path, e.to_string()))?);
    }
    Ok(budget)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn split_paths(value: &str) -> Vec<String> {
    value
        .split(PATH_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_paths(paths: &[String]) -> String {
    paths.join(&PATH_SEPARATOR.to_string())
}

/// 항목 이름: 비어있지 않고, 섹션 헤더를 깨지 않으며, GLOBAL이 아님
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidEntry("entry name is empty".to_string()));
    }
    if name != name.trim() || name.contains(['[', ']', '\n', '\r']) {
        return Err(Error::InvalidEntry(format!("invalid entry name {:?}", name)));
    }
    if name == GLOBAL_SECTION {
        return Err(Error::InvalidEntry(format!("'{}' is reserved", GLOBAL_SECTION)));
    }
    Ok(())
}

/// log2ram.conf의 큰따옴표 값 안에서 셸이 해석하는 문자
const SHELL_SPECIAL: &[char] = &['"', '$', '`', '\\'];

/// 경로: 절대 경로이고, 앞뒤 공백이 없고, 구분자/셸 특수문자를 포함하지 않음
///
/// 경로는 root 셸이 source하는 `PATH_DISK="..."`에 그대로 들어갑니다.
pub fn validate_paths(paths: &[String]) -> Result<()> {
    for path in paths {
        let invalid = |reason: &str| Error::InvalidEntry(format!("path {:?} {}", path, reason));

        if path != path.trim() {
            return Err(invalid("has leading or trailing whitespace"));
        }
        if !path.starts_with('/') {
            return Err(invalid("is not absolute"));
        }
        if path.contains(PATH_SEPARATOR) || path.contains(['\n', '\r']) {
            return Err(invalid("contains a separator"));
        }
        if path.contains(SHELL_SPECIAL) {
            return Err(invalid("contains a shell-special character"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssdsaver_foundation::privilege::testing::RecordingWriter;

    const SAMPLE: &str = "[chrome]\n\
                          enabled = true\n\
                          size = 200M\n\
                          mode = safe\n\
                          paths = /home/u/.cache/google-chrome/Default/Cache\n\
                          \n\
                          [steam]\n\
                          enabled = False\n\
                          size = 1G\n\
                          mode = lossy\n\
                          paths = /home/u/.local/share/Steam/appcache;/tmp/steam\n\
                          \n\
                          [GLOBAL]\n\
                          budget = 512M\n";

    fn sample() -> EntryStore {
        EntryStore::parse(SAMPLE, "/etc/ssdsaver/folders.conf").unwrap()
    }

    #[test]
    fn test_parse_entries() {
        let store = sample();

        let chrome = store.get("chrome").unwrap();
        assert!(chrome.enabled);
        assert_eq!(chrome.size_mb, 200);
        assert_eq!(chrome.mode, SyncMode::Safe);

        let steam = store.get("steam").unwrap();
        assert!(!steam.enabled);
        assert_eq!(steam.size_mb, 1024);
        assert_eq!(steam.mode, SyncMode::Lossy);
        assert_eq!(steam.paths.len(), 2);

        assert_eq!(store.global_budget_mb(), Some(512));
        assert_eq!(store.enabled_entries(), vec!["chrome"]);
    }

    #[test]
    fn test_absent_entry_is_disabled() {
        assert!(!sample().is_enabled("firefox"));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let store = sample();
        assert!(store.get("Chrome").is_none());
    }

    #[test]
    fn test_save_reload_is_idempotent() {
        let store = sample();
        let reparsed = EntryStore::parse(&store.serialize(), store.path()).unwrap();
        assert_eq!(reparsed, store);
        assert_eq!(reparsed.serialize(), store.serialize());
    }

    #[test]
    fn test_load_absent_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntryStore::load(dir.path().join("folders.conf")).unwrap();
        assert_eq!(store.entries().count(), 0);
        assert_eq!(store.global_budget_mb(), None);
        assert_eq!(store.serialize(), "");
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folders.conf");
        std::fs::write(&path, SAMPLE).unwrap();

        let store = EntryStore::load(&path).unwrap();
        assert_eq!(store, EntryStore::parse(SAMPLE, &path).unwrap());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = EntryStore::parse("[chrome]\nenabled = true\ncolor = red\n", "f").unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
        assert!(err.to_string().contains("color"));

        let err = EntryStore::parse("[GLOBAL]\nbudget = 1G\nlimit = 2G\n", "f").unwrap_err();
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(EntryStore::parse("[a]\nsize = lots\n", "f").is_err());
        assert!(EntryStore::parse("[a]\nenabled = maybe\n", "f").is_err());
        assert!(EntryStore::parse("[a]\nmode = fast\n", "f").is_err());
        assert!(EntryStore::parse("[a]\npaths = relative/dir\n", "f").is_err());
    }

    #[test]
    fn test_set_entry_upserts_in_place() {
        let mut store = sample();
        store
            .set_entry("steam", true, 300, SyncMode::Safe, vec!["/data/steam".into()])
            .unwrap();
        store
            .set_entry("firefox", true, 150, SyncMode::Safe, vec![])
            .unwrap();

        let names: Vec<_> = store.entries().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["chrome", "steam", "firefox"]);
        assert_eq!(store.get("steam").unwrap().size_mb, 300);
        assert_eq!(store.enabled_entries(), vec!["chrome", "steam", "firefox"]);
    }

    #[test]
    fn test_set_entry_validates() {
        let mut store = sample();
        assert!(store
            .set_entry("GLOBAL", true, 1, SyncMode::Safe, vec![])
            .is_err());
        assert!(store.set_entry("a]b", true, 1, SyncMode::Safe, vec![]).is_err());
        assert!(store.set_entry("", true, 1, SyncMode::Safe, vec![]).is_err());
        assert!(store
            .set_entry("a", true, 1, SyncMode::Safe, vec!["~/.cache".into()])
            .is_err());
        assert!(store
            .set_entry("a", true, 1, SyncMode::Safe, vec!["/x;/y".into()])
            .is_err());
        assert!(store.get("a").is_none());
    }

    #[test]
    fn test_set_entry_rejects_shell_special_paths() {
        let mut store = sample();
        for bad in [
            "/x\" MAIL=\"$(id)",
            "/home/$USER/.cache",
            "/tmp/`id`",
            "/tmp/a\\b",
        ] {
            let err = store
                .set_entry("a", true, 1, SyncMode::Safe, vec![bad.to_string()])
                .unwrap_err();
            assert!(matches!(err, Error::InvalidEntry(_)), "{bad:?} should be rejected");
        }
        assert!(store.get("a").is_none());

        // 파일에서 읽은 경로도 같은 규칙
        assert!(EntryStore::parse("[a]\npaths = /home/$USER\n", "f").is_err());
    }

    #[test]
    fn test_set_entry_rejects_untrimmed_paths() {
        let mut store = sample();
        for bad in ["/x ", " /x", "/x\t"] {
            assert!(store
                .set_entry("a", true, 1, SyncMode::Safe, vec![bad.to_string()])
                .is_err());
        }
        assert!(store.get("a").is_none());
    }

    #[test]
    fn test_paths_with_inner_spaces_survive_reload() {
        let mut store = sample();
        store
            .set_entry(
                "vivaldi",
                true,
                150,
                SyncMode::Safe,
                vec!["/home/u/.cache/My Cache".into(), "/srv/b".into()],
            )
            .unwrap();

        let reparsed = EntryStore::parse(&store.serialize(), store.path()).unwrap();
        assert_eq!(reparsed, store);
        assert_eq!(
            reparsed.get("vivaldi").unwrap().paths,
            vec!["/home/u/.cache/My Cache", "/srv/b"]
        );
    }

    #[test]
    fn test_clear_entry_enabled_keeps_fields() {
        let mut store = sample();
        let before = store.get("chrome").unwrap().clone();

        assert!(store.clear_entry_enabled("chrome"));
        let after = store.get("chrome").unwrap();
        assert!(!after.enabled);
        assert_eq!(after.size_mb, before.size_mb);
        assert_eq!(after.paths, before.paths);

        assert!(!store.clear_entry_enabled("missing"));
    }

    #[test]
    fn test_serialize_format() {
        let mut store = EntryStore::new("f");
        store
            .set_entry("apt", true, 500, SyncMode::Lossy, vec!["/var/cache/apt/archives".into()])
            .unwrap();
        store.set_global_budget(1024);

        assert_eq!(
            store.serialize(),
            "[apt]\nenabled = true\nsize = 500M\nmode = lossy\npaths = /var/cache/apt/archives\n\n\
             [GLOBAL]\nbudget = 1024M\n\n"
        );
    }

    #[test]
    fn test_save_failure_keeps_state() {
        let mut store = sample();
        store.set_global_budget(256);
        let before = store.clone();

        let err = store.save(&RecordingWriter::failing()).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store, before);
    }

    #[test]
    fn test_save_writes_to_store_path() {
        let writer = RecordingWriter::default();
        let store = sample();
        store.save(&writer).unwrap();
        assert_eq!(
            writer.last_write_to(Path::new("/etc/ssdsaver/folders.conf")),
            Some(store.serialize())
        );
    }
}
