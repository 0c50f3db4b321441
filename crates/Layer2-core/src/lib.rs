//! ssdsaver-core: 설정 조정 및 RAM 예산 엔진
//!
//! Layer2 - 항목 상태를 관리하고 log2ram 설정을 만들어내는 레이어
//!
//! # 주요 모듈
//!
//! - `entry`: 캐시 항목 저장소 (folders.conf)
//! - `budget`: 전체 RAM 예산 계산/검증
//! - `derived`: log2ram.conf의 `PATH_DISK`/`SIZE` 생성
//! - `primary`: log2ram.conf 기본 키와 토글
//! - `context`: 명시적으로 소유되는 컨텍스트와 커밋 흐름
//!
//! # 사용 예시
//!
//! ```ignore
//! use ssdsaver_core::{ConfigContext, SyncMode};
//!
//! let mut ctx = ConfigContext::load(&settings, ram_mb)?.value;
//! if ctx.ledger().would_exceed("firefox", 150) {
//!     // 예산 올리기 / 다른 항목 끄기 / 크기 줄이기
//! }
//! ctx.enable("firefox", 150, SyncMode::Safe, paths)?;
//! ctx.commit(writer.as_ref())?;
//! ```

pub mod budget;
pub mod context;
pub mod derived;
pub mod entry;
pub mod primary;

// Re-exports: Entry
pub use entry::{Entry, EntryStore, SyncMode, GLOBAL_SECTION};

// Re-exports: Budget
pub use budget::{recommended_budget_mb, BudgetLedger, BudgetSummary};

// Re-exports: Derived
pub use derived::{DerivedConfig, DerivedConfigSynthesizer, SYSTEM_LOG_PATH};

// Re-exports: Primary
pub use primary::{load_primary, PrimarySummary, PrimaryUpdate, PRIMARY_DEFAULTS};

// Re-exports: Context
pub use context::{CommitReport, ConfigContext};
