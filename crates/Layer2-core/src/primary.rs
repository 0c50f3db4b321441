//! Primary config (log2ram.conf) 값 읽기/토글
//!
//! `SIZE`와 `PATH_DISK`는 `DerivedConfigSynthesizer`가 관리하므로 여기서는
//! 읽기만 하고, 사용자가 직접 바꾸는 키는 불리언 토글 세 개입니다.

use crate::derived::{PATH_DISK_KEY, SIZE_KEY};
use serde::Serialize;
use ssdsaver_foundation::{size, LineConfigDocument, Loaded, Result};
use std::path::Path;

/// log2ram.conf 기본 키
pub const PRIMARY_DEFAULTS: &[(&str, &str)] = &[
    (SIZE_KEY, "40M"),
    (USE_RSYNC_KEY, "false"),
    (MAIL_KEY, "true"),
    (ZL2R_KEY, "false"),
];

pub const USE_RSYNC_KEY: &str = "USE_RSYNC";
pub const MAIL_KEY: &str = "MAIL";
pub const ZL2R_KEY: &str = "ZL2R";

/// 기본값과 함께 로드
pub fn load_primary(path: &Path) -> Loaded<LineConfigDocument> {
    LineConfigDocument::load(path, PRIMARY_DEFAULTS)
}

/// 현재 log2ram.conf 값 (출력용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimarySummary {
    /// SIZE를 해석할 수 없으면 None
    pub size_mb: Option<u64>,
    pub use_rsync: bool,
    pub mail: bool,
    pub zl2r: bool,
    pub path_disk: Option<String>,
}

impl PrimarySummary {
    pub fn from_document(doc: &LineConfigDocument) -> Self {
        Self {
            size_mb: doc.get(SIZE_KEY).and_then(|s| size::parse(s).ok()),
            use_rsync: flag(doc, USE_RSYNC_KEY),
            mail: flag(doc, MAIL_KEY),
            zl2r: flag(doc, ZL2R_KEY),
            path_disk: doc.get(PATH_DISK_KEY).map(str::to_string),
        }
    }
}

/// 사용자 토글 변경 (None은 유지)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrimaryUpdate {
    pub use_rsync: Option<bool>,
    pub mail: Option<bool>,
    pub zl2r: Option<bool>,
}

impl PrimaryUpdate {
    pub fn is_empty(&self) -> bool {
        self.use_rsync.is_none() && self.mail.is_none() && self.zl2r.is_none()
    }

    pub fn apply_to(&self, doc: &mut LineConfigDocument) -> Result<()> {
        let toggles = [
            (USE_RSYNC_KEY, self.use_rsync),
            (MAIL_KEY, self.mail),
            (ZL2R_KEY, self.zl2r),
        ];
        for (key, value) in toggles {
            if let Some(value) = value {
                doc.set(key, if value { "true" } else { "false" })?;
            }
        }
        Ok(())
    }
}

fn flag(doc: &LineConfigDocument, key: &str) -> bool {
    doc.get(key)
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
