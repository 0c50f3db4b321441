//! Budget Ledger - RAM 예산 계산
//!
//! `EntryStore` 위의 상태 없는 뷰입니다. 정책 위반은 에러로 돌려줄 뿐
//! 항목을 자동으로 끄거나 줄이지 않습니다.

use crate::entry::EntryStore;
use serde::Serialize;
use ssdsaver_foundation::{Error, Result};

/// 권장 예산 하한 (MB)
pub const MIN_RECOMMENDED_BUDGET_MB: u64 = 128;
/// 권장 예산 상한 (MB)
pub const MAX_RECOMMENDED_BUDGET_MB: u64 = 512;

/// 권장 예산: 전체 RAM의 10%, [128, 512] MB로 제한
pub fn recommended_budget_mb(system_ram_mb: u64) -> u64 {
    (system_ram_mb / 10).clamp(MIN_RECOMMENDED_BUDGET_MB, MAX_RECOMMENDED_BUDGET_MB)
}

/// 예산 요약 (출력용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetSummary {
    pub system_ram_mb: u64,
    pub budget_mb: u64,
    /// GLOBAL.budget이 없어 권장값을 사용 중인지
    pub recommended: bool,
    pub used_mb: u64,
    pub available_mb: u64,
}

/// RAM 예산 계산기
#[derive(Debug, Clone, Copy)]
pub struct BudgetLedger<'a> {
    store: &'a EntryStore,
    system_ram_mb: u64,
}

impl<'a> BudgetLedger<'a> {
    pub fn new(store: &'a EntryStore, system_ram_mb: u64) -> Self {
        Self {
            store,
            system_ram_mb,
        }
    }

    /// GLOBAL.budget, 없으면 권장값
    pub fn global_budget_mb(&self) -> u64 {
        self.store
            .global_budget_mb()
            .unwrap_or_else(|| recommended_budget_mb(self.system_ram_mb))
    }

    /// 활성 항목 크기 합 (GLOBAL 제외)
    pub fn used_mb(&self) -> u64 {
        self.store
            .entries()
            .filter(|(_, e)| e.enabled)
            .fold(0u64, |acc, (_, e)| acc.saturating_add(e.size_mb))
    }

    /// 남은 예산 (음수는 0)
    pub fn available_mb(&self) -> u64 {
        self.global_budget_mb().saturating_sub(self.used_mb())
    }

    /// `name`을 `candidate_mb`로 활성화/크기 변경하면 예산을 넘는지
    ///
    /// 이미 활성인 항목은 현재 크기를 빼고 계산하므로 같은 크기로 다시
    /// 설정하는 경우는 초과로 판정되지 않습니다.
    pub fn would_exceed(&self, name: &str, candidate_mb: u64) -> bool {
        self.projected_usage(name, candidate_mb) > self.global_budget_mb()
    }

    /// `would_exceed`의 에러 버전
    pub fn check_enable(&self, name: &str, candidate_mb: u64) -> Result<()> {
        if self.would_exceed(name, candidate_mb) {
            return Err(Error::BudgetExceeded {
                entry: name.to_string(),
                requested_mb: candidate_mb,
                used_mb: self.projected_usage(name, 0),
                budget_mb: self.global_budget_mb(),
            });
        }
        Ok(())
    }

    /// 현재 사용량이 예산 이하인지 (예산을 낮춘 뒤 커밋 전에 확인)
    pub fn check_downgrade(&self) -> Result<()> {
        let used_mb = self.used_mb();
        let budget_mb = self.global_budget_mb();
        if used_mb > budget_mb {
            return Err(Error::DowngradeConflict { budget_mb, used_mb });
        }
        Ok(())
    }

    pub fn summary(&self) -> BudgetSummary {
        BudgetSummary {
            system_ram_mb: self.system_ram_mb,
            budget_mb: self.global_budget_mb(),
            recommended: self.store.global_budget_mb().is_none(),
            used_mb: self.used_mb(),
            available_mb: self.available_mb(),
        }
    }

    fn projected_usage(&self, name: &str, candidate_mb: u64) -> u64 {
        let current = match self.store.get(name) {
            Some(entry) if entry.enabled => entry.size_mb,
            _ => 0,
        };
        self.used_mb()
            .saturating_sub(current)
            .saturating_add(candidate_mb)
    }
}
