//! Section file - `[name]` 아래 `key = value` 형식
//!
//! 닫힌 형식이라 저장할 때는 전체를 다시 생성합니다 (줄 보존 없음).

use crate::{Error, Result};
use std::path::Path;

/// 이름이 붙은 섹션 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    /// (키, 값) - 키는 소문자로 정규화
    pub entries: Vec<(String, String)>,
    /// 헤더가 있던 줄 번호 (1부터, 생성된 섹션은 0)
    pub line: usize,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            line: 0,
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.entries.push((key.to_string(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// 섹션 파일 파싱
///
/// `path`는 에러 메시지용입니다.
pub fn parse_sections(content: &str, path: &Path) -> Result<Vec<Section>> {
    let mut sections: Vec<Section> = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let fail = |message: String| Error::config_read(path, format!("line {}: {}", line_no, message));

        if let Some(header) = line.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .ok_or_else(|| fail(format!("unterminated section header {:?}", line)))?;
            if name.is_empty() {
                return Err(fail("empty section name".to_string()));
            }
            if sections.iter().any(|s| s.name == name) {
                return Err(fail(format!("duplicate section [{}]", name)));
            }
            sections.push(Section {
                name: name.to_string(),
                entries: Vec::new(),
                line: line_no,
            });
            continue;
        }

        let split_at = line
            .find(|c| c == '=' || c == ':')
            .ok_or_else(|| fail(format!("expected key = value, got {:?}", line)))?;
        let key = line[..split_at].trim().to_lowercase();
        let value = line[split_at + 1..].trim().to_string();
        if key.is_empty() {
            return Err(fail("empty key".to_string()));
        }

        let section = sections
            .last_mut()
            .ok_or_else(|| fail(format!("key '{}' outside of any section", key)))?;
        if section.get(&key).is_some() {
            return Err(fail(format!("duplicate key '{}' in [{}]", key, section.name)));
        }
        section.entries.push((key, value));
    }

    Ok(sections)
}

/// 섹션 목록을 텍스트로 생성
pub fn render_sections(sections: &[Section]) -> String {
    let mut out = String::new();
    for section in sections {
        out.push('[');
        out.push_str(&section.name);
        out.push_str("]\n");
        for (key, value) in &section.entries {
            out.push_str(key);
            out.push_str(" = ");
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<Vec<Section>> {
        parse_sections(content, Path::new("folders.conf"))
    }

    #[test]
    fn test_parse_sections() {
        let sections = parse(
            "; written by ssdsaver\n\
             [chrome]\n\
             Enabled = true\n\
             size: 200M\n\
             \n\
             [GLOBAL]\n\
             budget = 512M\n",
        )
        .unwrap();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "chrome");
        assert_eq!(sections[0].get("enabled"), Some("true"));
        assert_eq!(sections[0].get("size"), Some("200M"));
        assert_eq!(sections[0].line, 2);
        assert_eq!(sections[1].get("budget"), Some("512M"));
    }

    #[test]
    fn test_value_keeps_inner_separators() {
        let sections = parse("[a]\npaths = /x=1;/y:2\n").unwrap();
        assert_eq!(sections[0].get("paths"), Some("/x=1;/y:2"));
    }

    #[test]
    fn test_rejects_key_outside_section() {
        let err = parse("enabled = true\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_rejects_duplicates() {
        assert!(parse("[a]\n[a]\n").is_err());
        assert!(parse("[a]\nsize = 1M\nSIZE = 2M\n").is_err());
    }

    #[test]
    fn test_rejects_malformed_lines() {
        assert!(parse("[a\n").is_err());
        assert!(parse("[]\n").is_err());
        assert!(parse("[a]\njust words\n").is_err());
    }

    #[test]
    fn test_render_then_parse() {
        let sections = vec![
            Section::new("firefox").with("enabled", "false").with("size", "150M"),
            Section::new("GLOBAL").with("budget", "256M"),
        ];
        let text = render_sections(&sections);
        assert_eq!(
            text,
            "[firefox]\nenabled = false\nsize = 150M\n\n[GLOBAL]\nbudget = 256M\n\n"
        );

        let parsed = parse(&text).unwrap();
        assert_eq!(parsed[0].entries, sections[0].entries);
        assert_eq!(parsed[1].entries, sections[1].entries);
    }
}
