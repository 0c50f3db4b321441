//! Config Context - 명시적으로 소유되는 설정 상태
//!
//! 전역 싱글턴 없이 호출자가 컨텍스트를 만들어 각 작업에 넘깁니다.
//! 작업 흐름: 항목 변경 -> 예산 검증 -> 항목 파일 저장 -> 서비스 설정 재생성/저장
//!
//! ## 사용 예시
//! ```ignore
//! let settings = ToolSettings::load_default().value;
//! let mut ctx = ConfigContext::load(&settings, total_ram_mb()?)?.value;
//!
//! ctx.enable("chrome", 200, SyncMode::Safe, vec![cache_dir])?;
//! let report = ctx.commit(settings.writer().as_ref())?;
//! ```

use crate::budget::{BudgetLedger, BudgetSummary};
use crate::derived::{DerivedConfig, DerivedConfigSynthesizer};
use crate::entry::{EntryStore, SyncMode};
use crate::primary::{load_primary, PrimaryUpdate};
use serde::Serialize;
use ssdsaver_foundation::{LineConfigDocument, Loaded, PrivilegedWriter, Result};
use ssdsaver_foundation::ToolSettings;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 커밋 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    pub derived: DerivedConfig,
    pub budget: BudgetSummary,
}

/// 설정 컨텍스트
#[derive(Debug, Clone)]
pub struct ConfigContext {
    primary_path: PathBuf,
    primary: LineConfigDocument,
    entries: EntryStore,
    system_ram_mb: u64,
}

impl ConfigContext {
    pub fn new(
        primary_path: impl Into<PathBuf>,
        primary: LineConfigDocument,
        entries: EntryStore,
        system_ram_mb: u64,
    ) -> Self {
        Self {
            primary_path: primary_path.into(),
            primary,
            entries,
            system_ram_mb,
        }
    }

    /// 두 설정 파일 로드
    ///
    /// log2ram.conf를 읽지 못하면 기본값으로 진행하고 경고로 돌려줍니다.
    /// 항목 파일 오류는 그대로 에러입니다 (덮어쓰면 사용자 항목이 사라짐).
    pub fn load(settings: &ToolSettings, system_ram_mb: u64) -> Result<Loaded<Self>> {
        let entries = EntryStore::load(&settings.entry_file)?;
        let primary = load_primary(&settings.primary_config);

        let ctx = Self::new(
            &settings.primary_config,
            primary.value,
            entries,
            system_ram_mb,
        );
        Ok(match primary.warning {
            Some(warning) => Loaded::degraded(ctx, warning),
            None => Loaded::ok(ctx),
        })
    }

    // ========================================================================
    // 조회
    // ========================================================================

    pub fn primary(&self) -> &LineConfigDocument {
        &self.primary
    }

    pub fn primary_path(&self) -> &Path {
        &self.primary_path
    }

    pub fn entries(&self) -> &EntryStore {
        &self.entries
    }

    pub fn system_ram_mb(&self) -> u64 {
        self.system_ram_mb
    }

    pub fn ledger(&self) -> BudgetLedger<'_> {
        BudgetLedger::new(&self.entries, self.system_ram_mb)
    }

    /// 지금 커밋하면 만들어질 서비스 설정
    pub fn preview(&self) -> DerivedConfig {
        DerivedConfigSynthesizer::new(self.system_ram_mb).synthesize(&self.entries)
    }

    // ========================================================================
    // 변경
    // ========================================================================

    /// 항목 활성화 또는 크기 변경
    ///
    /// 예산을 넘으면 `BudgetExceeded`이고 상태는 바뀌지 않습니다.
    /// `paths`가 비어 있으면 기존 경로를 유지합니다.
    pub fn enable(
        &mut self,
        name: &str,
        size_mb: u64,
        mode: SyncMode,
        paths: Vec<String>,
    ) -> Result<()> {
        self.ledger().check_enable(name, size_mb)?;

        let paths = match (paths.is_empty(), self.entries.get(name)) {
            (true, Some(existing)) => existing.paths.clone(),
            _ => paths,
        };
        self.entries.set_entry(name, true, size_mb, mode, paths)
    }

    /// 항목 비활성화 (없으면 false)
    pub fn disable(&mut self, name: &str) -> bool {
        self.entries.clear_entry_enabled(name)
    }

    /// 전체 예산 변경
    ///
    /// 값은 항상 기록됩니다. 현재 사용량보다 낮으면 `DowngradeConflict`를
    /// 돌려주며, 항목을 줄이거나 끄기 전까지 `commit`이 거부됩니다.
    pub fn set_global_budget(&mut self, budget_mb: u64) -> Result<()> {
        self.entries.set_global_budget(budget_mb);
        let result = self.ledger().check_downgrade();
        if let Err(conflict) = &result {
            warn!(%conflict, "Budget lowered below current usage");
        }
        result
    }

    /// log2ram.conf 토글 변경 (커밋 시 함께 저장)
    pub fn update_primary(&mut self, update: &PrimaryUpdate) -> Result<()> {
        update.apply_to(&mut self.primary)
    }

    // ========================================================================
    // 커밋
    // ========================================================================

    /// 검증 후 두 파일 저장
    ///
    /// 1. 사용량 > 예산이면 `DowngradeConflict` (아무것도 쓰지 않음)
    /// 2. 항목 파일 저장
    /// 3. 서비스 설정 재생성 후 저장 (성공 시에만 메모리 문서 교체)
    pub fn commit(&mut self, writer: &dyn PrivilegedWriter) -> Result<CommitReport> {
        self.ledger().check_downgrade()?;

        self.entries.save(writer)?;
        let derived = DerivedConfigSynthesizer::new(self.system_ram_mb).apply(
            &mut self.primary,
            &self.entries,
            &self.primary_path,
            writer,
        )?;

        let report = CommitReport {
            derived,
            budget: self.ledger().summary(),
        };
        info!(
            used_mb = report.budget.used_mb,
            budget_mb = report.budget.budget_mb,
            "Committed configuration"
        );
        Ok(report)
    }
}
