//! Tool Settings - SSDsaver 동작 설정
//!
//! `~/.config/ssdsaver/settings.toml` (없으면 기본값).
//! 우선순위: CLI 플래그 > 설정 파일 > 기본값

use crate::privilege::{DirectWriter, ElevatedWriter, PrivilegedWriter};
use crate::process::DEFAULT_TIMEOUT_SECS;
use crate::service::SystemdController;
use crate::storage::Loaded;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// 설정 파일명
pub const SETTINGS_FILE: &str = "settings.toml";

/// SSDsaver 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// log2ram 설정 파일 (라인 보존 방식)
    pub primary_config: PathBuf,

    /// 항목 설정 파일 (섹션 방식)
    pub entry_file: PathBuf,

    /// 감독 대상 systemd 유닛
    pub service_unit: String,

    /// 권한 상승 프로그램
    pub elevation_program: String,

    /// 외부 호출 제한 시간 (초)
    pub timeout_secs: u64,

    /// false면 현재 권한으로 직접 기록 (root로 실행할 때)
    pub elevate: bool,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            primary_config: PathBuf::from("/etc/log2ram.conf"),
            entry_file: PathBuf::from("/etc/ssdsaver/folders.conf"),
            service_unit: "log2ram".to_string(),
            elevation_program: "pkexec".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            elevate: true,
        }
    }
}

impl ToolSettings {
    // ========================================================================
    // Load
    // ========================================================================

    /// 기본 설정 파일 경로 (~/.config/ssdsaver/settings.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ssdsaver").join(SETTINGS_FILE))
    }

    /// 기본 경로에서 로드 (경로를 알 수 없으면 기본값)
    pub fn load_default() -> Loaded<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Loaded::ok(Self::default()),
        }
    }

    /// 파일에서 로드, 실패하면 기본값 + 경고
    pub fn load(path: &Path) -> Loaded<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                return Loaded::ok(Self::default());
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read settings");
                return Loaded::degraded(Self::default(), Error::config_read(path, e.to_string()));
            }
        };

        match toml::from_str::<Self>(&content) {
            Ok(settings) => Loaded::ok(settings),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid settings file");
                Loaded::degraded(Self::default(), Error::Toml(e))
            }
        }
    }

    // ========================================================================
    // Builder (CLI 플래그 덮어쓰기)
    // ========================================================================

    pub fn primary_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.primary_config = path.into();
        self
    }

    pub fn entry_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.entry_file = path.into();
        self
    }

    pub fn elevate(mut self, elevate: bool) -> Self {
        self.elevate = elevate;
        self
    }

    // ========================================================================
    // 협력자 생성
    // ========================================================================

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 설정에 맞는 writer
    pub fn writer(&self) -> Box<dyn PrivilegedWriter> {
        if self.elevate {
            Box::new(ElevatedWriter::new(&self.elevation_program, self.timeout()))
        } else {
            Box::new(DirectWriter)
        }
    }

    /// 서비스 컨트롤러
    pub fn service(&self) -> SystemdController {
        let program = if self.elevate {
            self.elevation_program.as_str()
        } else {
            "env"
        };
        SystemdController::new(&self.service_unit, program, self.timeout())
    }
}
