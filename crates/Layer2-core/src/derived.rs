//! Derived Config - log2ram.conf에 들어갈 관리 키 생성
//!
//! `PATH_DISK`와 `SIZE` 두 키만 관리하고, 나머지 키는 `LineConfigDocument::set`의
//! 단일 키 교체 방식 덕분에 읽은 그대로 남습니다.

use crate::budget::BudgetLedger;
use crate::entry::{EntryStore, PATH_SEPARATOR};
use serde::Serialize;
use ssdsaver_foundation::{size, LineConfigDocument, PrivilegedWriter, Result};
use std::path::Path;
use tracing::info;

/// 항상 맨 앞에 오는 시스템 로그 경로
pub const SYSTEM_LOG_PATH: &str = "/var/log";

/// 관리 키
pub const PATH_DISK_KEY: &str = "PATH_DISK";
pub const SIZE_KEY: &str = "SIZE";

/// 생성된 서비스 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedConfig {
    /// 미러링할 디렉토리 (중복 허용, 순서 유지)
    pub path_list: Vec<String>,
    /// 램디스크 크기 = 전체 예산
    pub size_mb: u64,
}

impl DerivedConfig {
    /// `PATH_DISK` 값
    pub fn path_disk(&self) -> String {
        self.path_list.join(&PATH_SEPARATOR.to_string())
    }
}

/// `EntryStore` -> 서비스 설정
#[derive(Debug, Clone, Copy)]
pub struct DerivedConfigSynthesizer {
    system_ram_mb: u64,
}

impl DerivedConfigSynthesizer {
    pub fn new(system_ram_mb: u64) -> Self {
        Self { system_ram_mb }
    }

    /// 매 호출마다 전체 재계산
    pub fn synthesize(&self, store: &EntryStore) -> DerivedConfig {
        let mut path_list = vec![SYSTEM_LOG_PATH.to_string()];
        for name in store.enabled_entries() {
            if let Some(entry) = store.get(name) {
                path_list.extend(entry.paths.iter().cloned());
            }
        }

        DerivedConfig {
            path_list,
            size_mb: BudgetLedger::new(store, self.system_ram_mb).global_budget_mb(),
        }
    }

    /// 관리 키를 문서에 반영하고 저장
    ///
    /// 저장이 성공한 뒤에만 `document`를 교체하므로 실패 시 커밋 전 상태가 유지됩니다.
    pub fn apply(
        &self,
        document: &mut LineConfigDocument,
        store: &EntryStore,
        path: &Path,
        writer: &dyn PrivilegedWriter,
    ) -> Result<DerivedConfig> {
        let derived = self.synthesize(store);

        let mut next = document.clone();
        next.set(PATH_DISK_KEY, &derived.path_disk())?;
        next.set(SIZE_KEY, &size::format(derived.size_mb))?;
        next.commit(path, writer)?;

        info!(
            path = %path.display(),
            paths = derived.path_list.len(),
            size_mb = derived.size_mb,
            "Applied derived service config"
        );
        *document = next;
        Ok(derived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::SyncMode;
    use crate::primary::PRIMARY_DEFAULTS;
    use ssdsaver_foundation::privilege::testing::RecordingWriter;

    const LOG2RAM_CONF: &str = "# Configuration file for Log2Ram\n\
                                SIZE=40M\n\
                                # Set to true to use rsync\n\
                                USE_RSYNC=false\n\
                                MAIL=true\n\
                                PATH_DISK=\"/var/log\"\n\
                                ZL2R=false\n\
                                COMP_ALG=lz4\n";

    fn store() -> EntryStore {
        let mut store = EntryStore::new("/etc/ssdsaver/folders.conf");
        store
            .set_entry("A", true, 100, SyncMode::Safe, vec!["/x".into()])
            .unwrap();
        store
            .set_entry("B", false, 100, SyncMode::Safe, vec!["/y".into()])
            .unwrap();
        store.set_global_budget(256);
        store
    }

    #[test]
    fn test_synthesize_skips_disabled_entries() {
        let derived = DerivedConfigSynthesizer::new(8192).synthesize(&store());
        assert_eq!(derived.path_list, vec!["/var/log", "/x"]);
        assert_eq!(derived.size_mb, 256);
        assert_eq!(derived.path_disk(), "/var/log;/x");
    }

    #[test]
    fn test_synthesize_flattens_in_entry_order_with_duplicates() {
        let mut store = store();
        store
            .set_entry("C", true, 10, SyncMode::Lossy, vec!["/z1".into(), "/x".into()])
            .unwrap();

        let derived = DerivedConfigSynthesizer::new(8192).synthesize(&store);
        assert_eq!(derived.path_list, vec!["/var/log", "/x", "/z1", "/x"]);
    }

    #[test]
    fn test_synthesize_without_global_uses_recommendation() {
        let store = EntryStore::new("f");
        let derived = DerivedConfigSynthesizer::new(2048).synthesize(&store);
        assert_eq!(derived.path_list, vec!["/var/log"]);
        assert_eq!(derived.size_mb, 204);
    }

    #[test]
    fn test_apply_touches_only_managed_keys() {
        let writer = RecordingWriter::default();
        let path = Path::new("/etc/log2ram.conf");
        let mut doc = LineConfigDocument::parse(LOG2RAM_CONF, PRIMARY_DEFAULTS);

        DerivedConfigSynthesizer::new(8192)
            .apply(&mut doc, &store(), path, &writer)
            .unwrap();

        let written = writer.last_write_to(path).unwrap();
        assert_eq!(
            written,
            "# Configuration file for Log2Ram\n\
             SIZE=\"256M\"\n\
             # Set to true to use rsync\n\
             USE_RSYNC=false\n\
             MAIL=true\n\
             PATH_DISK=\"/var/log;/x\"\n\
             ZL2R=false\n\
             COMP_ALG=lz4\n"
        );
        assert_eq!(doc.serialize(), written);
    }

    #[test]
    fn test_apply_failure_leaves_document_untouched() {
        let mut doc = LineConfigDocument::parse(LOG2RAM_CONF, PRIMARY_DEFAULTS);
        let before = doc.clone();

        let err = DerivedConfigSynthesizer::new(8192)
            .apply(
                &mut doc,
                &store(),
                Path::new("/etc/log2ram.conf"),
                &RecordingWriter::failing(),
            )
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(doc, before);
    }
}
