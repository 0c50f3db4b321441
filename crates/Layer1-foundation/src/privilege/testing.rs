//! 테스트용 PrivilegedWriter

use super::PrivilegedWriter;
use crate::{Error, Result};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// 기록 요청을 메모리에 저장하는 writer
///
/// `failing_on`으로 특정 경로에 대한 쓰기만 실패시킬 수 있습니다.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    writes: RefCell<Vec<(PathBuf, String)>>,
    fail_all: bool,
    fail_on: Option<PathBuf>,
}

impl RecordingWriter {
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn failing_on(path: impl Into<PathBuf>) -> Self {
        Self {
            fail_on: Some(path.into()),
            ..Self::default()
        }
    }

    /// 성공한 쓰기 목록
    pub fn writes(&self) -> Vec<(PathBuf, String)> {
        self.writes.borrow().clone()
    }

    /// 해당 경로에 마지막으로 쓴 내용
    pub fn last_write_to(&self, path: &Path) -> Option<String> {
        self.writes
            .borrow()
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, content)| content.clone())
    }
}

impl PrivilegedWriter for RecordingWriter {
    fn write(&self, path: &Path, content: &str) -> Result<()> {
        if self.fail_all || self.fail_on.as_deref() == Some(path) {
            return Err(Error::Persistence(format!(
                "authorization dismissed for {}",
                path.display()
            )));
        }
        self.writes
            .borrow_mut()
            .push((path.to_path_buf(), content.to_string()));
        Ok(())
    }
}
