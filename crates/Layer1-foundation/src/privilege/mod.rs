//! Privileged Writer - 보호된 위치에 파일을 원자적으로 기록
//!
//! - `ElevatedWriter`: pkexec 등 권한 상승 프로그램을 통해 교체
//! - `DirectWriter`: 현재 사용자 권한으로 교체 (root 실행, 테스트용 경로)
//!
//! 두 구현 모두 대상 디렉토리 안의 임시 파일에 쓴 뒤 rename으로 옮기므로
//! 파일은 완전히 교체되거나 그대로 남습니다.

use crate::process::{describe, run_bounded};
use crate::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::info;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// 완성된 문서를 보호된 위치에 저장하는 외부 협력자
pub trait PrivilegedWriter {
    /// `content`로 `path`를 통째로 교체
    fn write(&self, path: &Path, content: &str) -> Result<()>;
}

// ============================================================================
// Elevated Writer
// ============================================================================

/// 스테이징한 파일을 대상 옆 임시 경로로 복사한 뒤 rename
///
/// 인자는 `$1`, `$2`로 넘기므로 경로가 셸에 보간되지 않습니다.
const INSTALL_SCRIPT: &str = r#"set -e
mkdir -p "$(dirname "$2")"
tmp="$2.ssdsaver-tmp"
cp "$1" "$tmp"
chmod 644 "$tmp"
mv -f "$tmp" "$2""#;

/// 권한 상승 프로그램(pkexec)을 통한 기록
#[derive(Debug, Clone)]
pub struct ElevatedWriter {
    program: String,
    timeout: Duration,
}

impl ElevatedWriter {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn install_command(&self, staged: &Path, target: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["sh", "-c", INSTALL_SCRIPT, "sh"])
            .arg(staged)
            .arg(target);
        cmd
    }
}

impl PrivilegedWriter for ElevatedWriter {
    fn write(&self, path: &Path, content: &str) -> Result<()> {
        let staged = stage(None, content)
            .map_err(|e| Error::Persistence(format!("cannot stage {}: {}", path.display(), e)))?;

        let cmd = self.install_command(staged.path(), path);
        let label = describe(&cmd);
        let output = run_bounded(cmd, self.timeout)?;

        if !output.status.success() {
            return Err(Error::Persistence(format!(
                "`{}` failed ({}): {}",
                label,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        info!(path = %path.display(), bytes = content.len(), "Wrote file via {}", self.program);
        Ok(())
    }
}

// ============================================================================
// Direct Writer
// ============================================================================

/// 현재 권한으로 대상 디렉토리에 임시 파일을 만들고 rename
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectWriter;

impl PrivilegedWriter for DirectWriter {
    fn write(&self, path: &Path, content: &str) -> Result<()> {
        let dir = parent_dir(path);
        let persist = || -> std::io::Result<()> {
            std::fs::create_dir_all(&dir)?;
            let staged = stage(Some(&dir), content)?;
            staged.persist(path).map_err(|e| e.error)?;
            Ok(())
        };

        persist()
            .map_err(|e| Error::Persistence(format!("cannot write {}: {}", path.display(), e)))?;

        info!(path = %path.display(), bytes = content.len(), "Wrote file");
        Ok(())
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// 임시 파일에 내용을 기록 (dir이 없으면 시스템 임시 디렉토리)
fn stage(dir: Option<&Path>, content: &str) -> std::io::Result<NamedTempFile> {
    let mut file = match dir {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new()?,
    };
    file.write_all(content.as_bytes())?;
    file.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_writer_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log2ram.conf");
        std::fs::write(&path, "OLD=1\n").unwrap();

        DirectWriter.write(&path, "SIZE=\"128M\"\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "SIZE=\"128M\"\n");
        // 임시 파일이 남지 않아야 함
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_direct_writer_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ssdsaver").join("folders.conf");

        DirectWriter.write(&path, "[GLOBAL]\nbudget = 256M\n\n").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_direct_writer_reports_persistence_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let err = DirectWriter
            .write(&blocker.join("folders.conf"), "x")
            .unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_elevated_writer_runs_install_script() {
        // 권한 상승 없이 스크립트만 검증: `env`가 나머지 인자를 그대로 실행
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etc").join("log2ram.conf");
        let writer = ElevatedWriter::new("env", Duration::from_secs(5));

        writer.write(&path, "SIZE=\"64M\"\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "SIZE=\"64M\"\n");
        assert!(!dir.path().join("etc").join("log2ram.conf.ssdsaver-tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_elevated_writer_failure() {
        let writer = ElevatedWriter::new("false", Duration::from_secs(5));
        let err = writer
            .write(Path::new("/etc/log2ram.conf"), "SIZE=\"64M\"\n")
            .unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }
}
