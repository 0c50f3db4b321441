//! Line Config Document - `KEY="VALUE"` 라인 기반 설정 파일
//!
//! 주석/빈 줄/순서를 그대로 보존하는 라인 패치 방식입니다.
//! 구조화된 파서가 아니므로 `set`은 해당 키의 첫 번째 할당 줄만 교체하고
//! 나머지 줄은 바이트 단위로 유지합니다.

use super::Loaded;
use crate::privilege::PrivilegedWriter;
use crate::{Error, Result};
use std::path::Path;
use tracing::{debug, warn};

/// 라인 기반 설정 문서
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineConfigDocument {
    /// 원본 줄 (개행 제외)
    lines: Vec<String>,
    /// 키 -> 최신 값 (기본값 위에 파일 값을 덮어씀, 삽입 순서 유지)
    values: Vec<(String, String)>,
}

impl LineConfigDocument {
    /// 빈 문서 (기본값만 보유)
    pub fn with_defaults(defaults: &[(&str, &str)]) -> Self {
        let mut doc = Self::default();
        for (key, value) in defaults {
            doc.put_value(key, value);
        }
        doc
    }

    /// 텍스트에서 파싱
    pub fn parse(content: &str, defaults: &[(&str, &str)]) -> Self {
        let mut doc = Self::with_defaults(defaults);
        doc.lines = content.split_terminator('\n').map(str::to_string).collect();

        for index in 0..doc.lines.len() {
            if let Some((key, value)) = split_assignment(&doc.lines[index]) {
                let value = value.trim().trim_matches('"').to_string();
                let key = key.to_string();
                doc.put_value(&key, &value);
            }
        }
        doc
    }

    /// 파일 로드
    ///
    /// - 파일 없음: 기본값만 가진 문서 (경고 없음)
    /// - 읽기 실패: 기본값 문서 + `ConfigRead` 경고 (호출자가 보고)
    pub fn load(path: &Path, defaults: &[(&str, &str)]) -> Loaded<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let doc = Self::parse(&content, defaults);
                debug!(path = %path.display(), lines = doc.lines.len(), "Loaded line config");
                Loaded::ok(doc)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Line config absent, using defaults");
                Loaded::ok(Self::with_defaults(defaults))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Falling back to default config");
                Loaded::degraded(
                    Self::with_defaults(defaults),
                    Error::config_read(path, e.to_string()),
                )
            }
        }
    }

    // ========================================================================
    // 조회
    // ========================================================================

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 원본 줄
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    // ========================================================================
    // 수정
    // ========================================================================

    /// 키 하나를 설정
    ///
    /// 첫 번째 유효한 할당 줄을 `key="value"`로 교체하고, 없으면 끝에 추가합니다.
    /// 읽을 때의 따옴표 여부와 무관하게 쓸 때는 항상 큰따옴표로 감쌉니다.
    /// 파일은 root 셸이 source하므로 큰따옴표 안에서 해석되는 문자는 거부합니다.
    /// CRLF 줄은 `\r`을 유지합니다.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        check_value(key, value)?;
        if self.lines.is_empty() {
            self.lines = self.synthesized_lines();
        }

        let rendered = format!("{}=\"{}\"", key, value);
        let position = self
            .lines
            .iter()
            .position(|line| split_assignment(line).map(|(k, _)| k) == Some(key));

        match position {
            Some(index) => {
                let ending = if self.lines[index].ends_with('\r') { "\r" } else { "" };
                self.lines[index] = format!("{}{}", rendered, ending);
            }
            None => {
                let crlf = self.lines.last().is_some_and(|line| line.ends_with('\r'));
                let ending = if crlf { "\r" } else { "" };
                self.lines.push(format!("{}{}", rendered, ending));
            }
        }
        self.put_value(key, value);
        Ok(())
    }

    // ========================================================================
    // 직렬화 / 저장
    // ========================================================================

    /// 줄을 개행으로 연결 (끝 개행 보장)
    ///
    /// 줄이 하나도 없으면 (파일이 없던 경우) 기본값에서 줄을 합성합니다.
    pub fn serialize(&self) -> String {
        let lines = if self.lines.is_empty() {
            self.synthesized_lines()
        } else {
            self.lines.clone()
        };

        let mut out = lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// 권한 채널로 저장 (실패해도 메모리 상태는 변경되지 않음)
    pub fn commit(&self, path: &Path, writer: &dyn PrivilegedWriter) -> Result<()> {
        writer.write(path, &self.serialize())
    }

    fn synthesized_lines(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, v))
            .collect()
    }

    fn put_value(&mut self, key: &str, value: &str) {
        match self.values.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.values.push((key.to_string(), value.to_string())),
        }
    }
}

/// 큰따옴표 안에서도 셸이 해석하는 문자
const SHELL_SPECIAL: &[char] = &['"', '$', '`', '\\'];

fn check_value(key: &str, value: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };
    if value.contains(SHELL_SPECIAL) {
        return Err(invalid("contains a shell-special character"));
    }
    if value.contains(['\n', '\r']) {
        return Err(invalid("contains a line break"));
    }
    Ok(())
}

/// 주석/빈 줄이 아닌 `KEY=VALUE` 줄을 (키, 값)으로 분리
fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let stripped = line.trim();
    if stripped.is_empty() || stripped.starts_with('#') {
        return None;
    }
    let (key, value) = stripped.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}
