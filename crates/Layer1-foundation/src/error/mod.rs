//! Error types for SSDsaver
//!
//! 모든 에러를 중앙에서 관리

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// SSDsaver 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 입력 관련
    // ========================================================================
    #[error("Invalid size format: {0:?}")]
    InvalidSizeFormat(String),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    // ========================================================================
    // 설정 파일 관련
    // ========================================================================
    #[error("Cannot read {}: {message}", path.display())]
    ConfigRead { path: PathBuf, message: String },

    // ========================================================================
    // 예산 정책 관련
    // ========================================================================
    #[error(
        "Enabling '{entry}' at {requested_mb}M exceeds the RAM budget ({used_mb}M of {budget_mb}M already in use)"
    )]
    BudgetExceeded {
        entry: String,
        requested_mb: u64,
        used_mb: u64,
        budget_mb: u64,
    },

    #[error(
        "RAM budget {budget_mb}M is below the {used_mb}M used by enabled entries; disable or shrink entries first"
    )]
    DowngradeConflict { budget_mb: u64, used_mb: u64 },

    // ========================================================================
    // 권한 채널 / 서비스 관련
    // ========================================================================
    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// 사용자가 해결 방법을 골라야 하는 정책 위반인지 확인
    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            Error::BudgetExceeded { .. } | Error::DowngradeConflict { .. }
        )
    }

    /// 재시도 가능한 에러인지 확인 (메모리 상태는 커밋 전 그대로)
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Persistence(_) | Error::Timeout(_))
    }

    /// ConfigRead 에러 생성 헬퍼
    pub fn config_read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::ConfigRead {
            path: path.into(),
            message: message.into(),
        }
    }
}
