//! Storage module for SSDsaver
//!
//! - `line`: `KEY="VALUE"` 라인 패치 문서 (log2ram.conf)
//! - `section`: `[name]` 섹션 파일 (folders.conf)

mod line;
mod section;

pub use line::LineConfigDocument;
pub use section::{parse_sections, render_sections, Section};

use crate::Error;

/// 로드 결과 + 보고용 경고
///
/// 읽기 실패 시 기본값으로 계속 진행하고 에러는 던지지 않고 넘겨줍니다.
#[derive(Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub warning: Option<Error>,
}

impl<T> Loaded<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    pub fn degraded(value: T, warning: Error) -> Self {
        Self {
            value,
            warning: Some(warning),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }
}
