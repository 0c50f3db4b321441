//! # ssdsaver-foundation
//!
//! Foundation layer for SSDsaver:
//! - Error: 공통 에러 타입
//! - Size: 크기 문자열 <-> MB
//! - Storage: 라인 보존 문서 (log2ram.conf), 섹션 파일 (folders.conf)
//! - Privilege: 보호된 파일 교체 (pkexec)
//! - Service: systemd 서비스 상태/제어
//! - System: 전체 RAM, 도구 감지
//! - Config: SSDsaver 자체 설정 (TOML)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  ssdsaver-core (EntryStore, Budget, Derived) │
//! │                     │                        │
//! │          ┌──────────┴──────────┐             │
//! │          ▼                     ▼             │
//! │   LineConfigDocument     Section file        │
//! │          │                     │             │
//! │          └──────────┬──────────┘             │
//! │                     ▼                        │
//! │   PrivilegedWriter (pkexec + atomic rename)  │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod privilege;
pub mod process;
pub mod service;
pub mod size;
pub mod storage;
pub mod system;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{ToolSettings, SETTINGS_FILE};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::{parse_sections, render_sections, LineConfigDocument, Loaded, Section};

// ============================================================================
// Privilege / Service (외부 협력자)
// ============================================================================
pub use privilege::{DirectWriter, ElevatedWriter, PrivilegedWriter};
pub use service::{ServiceAction, ServiceController, ServiceStatus, SystemdController};

// ============================================================================
// System (시스템 정보)
// ============================================================================
pub use system::{total_ram_mb, SystemProbe};
