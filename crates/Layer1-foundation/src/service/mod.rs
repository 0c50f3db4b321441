//! Service Controller - 감독 대상 서비스(log2ram)의 실행 상태
//!
//! 상태 조회는 권한 없이, start/stop/restart는 권한 상승 프로그램을 거칩니다.

use crate::process::{describe, run_bounded};
use crate::{Error, Result};
use serde::Serialize;
use std::process::Command;
use std::time::Duration;
use tracing::{info, warn};

// ============================================================================
// Service Status
// ============================================================================

/// `systemctl is-active` 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum ServiceStatus {
    Active,
    Inactive,
    Failed,
    Activating,
    Deactivating,
    Unknown(String),
}

impl ServiceStatus {
    /// `is-active` 출력 파싱
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "active" => Self::Active,
            "inactive" => Self::Inactive,
            "failed" => Self::Failed,
            "activating" => Self::Activating,
            "deactivating" => Self::Deactivating,
            "" => Self::Unknown("unknown".to_string()),
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Failed => "failed",
            Self::Activating => "activating",
            Self::Deactivating => "deactivating",
            Self::Unknown(s) => s,
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ServiceStatus> for String {
    fn from(status: ServiceStatus) -> Self {
        status.as_str().to_string()
    }
}

/// 서비스 제어 동작
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
}

impl ServiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

/// 서비스 실행 상태를 조회/변경하는 외부 협력자
pub trait ServiceController {
    fn status(&self) -> ServiceStatus;

    fn run(&self, action: ServiceAction) -> Result<()>;

    fn start(&self) -> Result<()> {
        self.run(ServiceAction::Start)
    }

    fn stop(&self) -> Result<()> {
        self.run(ServiceAction::Stop)
    }

    fn restart(&self) -> Result<()> {
        self.run(ServiceAction::Restart)
    }
}

/// systemd 기반 컨트롤러
#[derive(Debug, Clone)]
pub struct SystemdController {
    unit: String,
    elevation_program: String,
    timeout: Duration,
}

impl SystemdController {
    pub fn new(
        unit: impl Into<String>,
        elevation_program: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            unit: unit.into(),
            elevation_program: elevation_program.into(),
            timeout,
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }
}

impl ServiceController for SystemdController {
    fn status(&self) -> ServiceStatus {
        let mut cmd = Command::new("systemctl");
        cmd.args(["is-active", self.unit.as_str()]);

        // inactive/failed도 0이 아닌 종료 코드를 내므로 stdout만 봅니다
        match run_bounded(cmd, self.timeout) {
            Ok(output) => ServiceStatus::parse(&String::from_utf8_lossy(&output.stdout)),
            Err(e) => {
                warn!(unit = %self.unit, error = %e, "Cannot query service status");
                ServiceStatus::Unknown("unknown".to_string())
            }
        }
    }

    fn run(&self, action: ServiceAction) -> Result<()> {
        let mut cmd = Command::new(&self.elevation_program);
        cmd.args(["systemctl", action.as_str(), self.unit.as_str()]);
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

        info!(unit = %self.unit, action = action.as_str(), "Service command succeeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(ServiceStatus::parse("active\n"), ServiceStatus::Active);
        assert_eq!(ServiceStatus::parse("inactive"), ServiceStatus::Inactive);
        assert_eq!(ServiceStatus::parse("failed"), ServiceStatus::Failed);
        assert_eq!(
            ServiceStatus::parse("reloading"),
            ServiceStatus::Unknown("reloading".to_string())
        );
        assert_eq!(ServiceStatus::parse("").as_str(), "unknown");
    }

    #[test]
    fn test_status_serializes_as_string() {
        let json = serde_json::to_string(&ServiceStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_action_is_persistence_failure() {
        let controller = SystemdController::new("log2ram", "false", Duration::from_secs(5));
        let err = controller.restart().unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_action() {
        // `true`는 인자를 무시하고 0으로 종료
        let controller = SystemdController::new("log2ram", "true", Duration::from_secs(5));
        assert!(controller.start().is_ok());
    }
}
