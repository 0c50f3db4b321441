//! Subcommand handlers
//!
//! 변경 명령은 모두 `ConfigContext::commit`으로 끝납니다.

use crate::apps;
use anyhow::{bail, Context};
use serde::Serialize;
use ssdsaver_core::{
    BudgetSummary, CommitReport, ConfigContext, DerivedConfig, Entry, PrimarySummary,
    PrimaryUpdate, SyncMode,
};
use ssdsaver_foundation::{
    size, total_ram_mb, ServiceAction, ServiceController, ServiceStatus, SystemProbe,
    ToolSettings,
};
use tracing::warn;

// ============================================================================
// Context
// ============================================================================

/// 시스템 RAM을 읽지 못하면 0 (권장 예산은 하한값이 됨)
fn system_ram_mb() -> u64 {
    total_ram_mb().unwrap_or_else(|e| {
        warn!(error = %e, "Cannot determine system RAM");
        0
    })
}

fn load_context(settings: &ToolSettings) -> anyhow::Result<ConfigContext> {
    let loaded = ConfigContext::load(settings, system_ram_mb())
        .with_context(|| format!("loading {}", settings.entry_file.display()))?;
    if let Some(warning) = &loaded.warning {
        eprintln!("Warning: {} (using log2ram defaults)", warning);
    }
    Ok(loaded.value)
}

fn commit(settings: &ToolSettings, ctx: &mut ConfigContext) -> anyhow::Result<CommitReport> {
    let writer = settings.writer();
    let report = ctx.commit(writer.as_ref())?;
    println!(
        "✓ Saved {} and {}",
        settings.entry_file.display(),
        settings.primary_config.display()
    );
    println!(
        "  SIZE={}  PATH_DISK={}",
        size::format(report.derived.size_mb),
        report.derived.path_disk()
    );
    Ok(report)
}

// ============================================================================
// Read-only commands
// ============================================================================

#[derive(Serialize)]
struct StatusReport {
    budget: BudgetSummary,
    primary: PrimarySummary,
    pending: DerivedConfig,
    service_unit: String,
    service: ServiceStatus,
    elevation_available: bool,
    systemctl_available: bool,
}

pub fn status(settings: &ToolSettings, json: bool) -> anyhow::Result<()> {
    let ctx = load_context(settings)?;
    let probe = SystemProbe::detect(&settings.elevation_program);
    let service = settings.service();

    let report = StatusReport {
        budget: ctx.ledger().summary(),
        primary: PrimarySummary::from_document(ctx.primary()),
        pending: ctx.preview(),
        service_unit: service.unit().to_string(),
        service: service.status(),
        elevation_available: probe.has_elevation,
        systemctl_available: probe.has_systemctl,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let budget = &report.budget;
    println!(
        "RAM budget: {} used of {}{} (system RAM {})",
        size::format(budget.used_mb),
        size::format(budget.budget_mb),
        if budget.recommended { " recommended" } else { "" },
        size::format(budget.system_ram_mb)
    );
    println!("Available:  {}", size::format(budget.available_mb));
    println!("Service:    {} ({})", report.service, report.service_unit);

    let primary = &report.primary;
    println!("log2ram:    {}", settings.primary_config.display());
    match primary.size_mb {
        Some(mb) => println!("  SIZE       {}", size::format(mb)),
        None => println!("  SIZE       (unreadable)"),
    }
    println!("  USE_RSYNC  {}", primary.use_rsync);
    println!("  MAIL       {}", primary.mail);
    println!("  ZL2R       {}", primary.zl2r);
    println!(
        "  PATH_DISK  {}",
        primary.path_disk.as_deref().unwrap_or("(unset)")
    );

    let pending = report.pending.path_disk();
    if primary.path_disk.as_deref() != Some(pending.as_str())
        || primary.size_mb != Some(report.pending.size_mb)
    {
        println!("Pending changes: run `ssdsaver apply` to write them");
    }
    if !report.elevation_available && settings.elevate {
        println!(
            "Warning: {} not found; use --no-elevate when running as root",
            settings.elevation_program
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct EntryRow<'a> {
    name: &'a str,
    #[serde(flatten)]
    entry: &'a Entry,
}

pub fn entries(settings: &ToolSettings, json: bool) -> anyhow::Result<()> {
    let ctx = load_context(settings)?;
    let rows: Vec<EntryRow<'_>> = ctx
        .entries()
        .entries()
        .map(|(name, entry)| EntryRow { name, entry })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No entries configured.");
        return Ok(());
    }
    for row in &rows {
        println!(
            "{} {:<12} {:>6}  {:<5}  {}",
            if row.entry.enabled { "●" } else { "○" },
            row.name,
            size::format(row.entry.size_mb),
            row.entry.mode,
            row.entry.paths.join(", ")
        );
    }
    let summary = ctx.ledger().summary();
    println!(
        "\n{} of {} in use",
        size::format(summary.used_mb),
        size::format(summary.budget_mb)
    );
    Ok(())
}

#[derive(Serialize)]
struct AppRow {
    #[serde(flatten)]
    app: apps::DetectedApp,
    enabled: bool,
}

pub fn apps(settings: &ToolSettings, json: bool) -> anyhow::Result<()> {
    let ctx = load_context(settings)?;
    let detected = apps::detect_all();

    if json {
        let rows: Vec<AppRow> = detected
            .into_iter()
            .map(|app| AppRow {
                enabled: ctx.entries().is_enabled(app.id),
                app,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for app in detected {
        let marker = match (app.is_installed(), ctx.entries().is_enabled(app.id)) {
            (_, true) => "enabled",
            (true, false) => "installed",
            (false, false) => "-",
        };
        println!(
            "{:<11} {:<20} {:>6}  {}",
            app.id,
            app.display_name,
            size::format(app.default_size_mb),
            marker
        );
        for path in &app.cache_paths {
            println!("            {}", path);
        }
    }
    Ok(())
}

// ============================================================================
// Mutating commands
// ============================================================================

/// 항목 활성화
///
/// 크기: `--size` > 기존 항목 > 앱 프리셋 기본값.
/// 경로: `--path` > 기존 항목 > 감지된 앱 캐시 경로.
pub fn enable(
    settings: &ToolSettings,
    name: &str,
    size_mb: Option<u64>,
    mode: Option<SyncMode>,
    paths: Vec<String>,
) -> anyhow::Result<()> {
    let mut ctx = load_context(settings)?;
    let existing = ctx.entries().get(name).cloned();
    let preset = apps::find(name);

    let size_mb = size_mb
        .or_else(|| existing.as_ref().map(|e| e.size_mb))
        .or_else(|| preset.map(|p| p.default_size_mb));
    let Some(size_mb) = size_mb else {
        bail!("'{}' is not a known application; pass --size", name);
    };

    let has_existing_paths = existing.as_ref().is_some_and(|e| !e.paths.is_empty());
    let paths = match (paths.is_empty(), has_existing_paths, preset) {
        (true, false, Some(preset)) => preset.existing_paths(),
        _ => paths,
    };
    if paths.is_empty() && !has_existing_paths {
        bail!("no cache directory found for '{}'; pass --path", name);
    }

    let mode = mode
        .or_else(|| existing.as_ref().map(|e| e.mode))
        .unwrap_or_default();

    ctx.enable(name, size_mb, mode, paths)?;
    commit(settings, &mut ctx)?;
    Ok(())
}

pub fn disable(settings: &ToolSettings, name: &str) -> anyhow::Result<()> {
    let mut ctx = load_context(settings)?;
    if !ctx.disable(name) {
        println!("'{}' is not configured; nothing to do", name);
        return Ok(());
    }
    commit(settings, &mut ctx)?;
    Ok(())
}

pub fn budget(settings: &ToolSettings, size_mb: Option<u64>) -> anyhow::Result<()> {
    let mut ctx = load_context(settings)?;

    let Some(size_mb) = size_mb else {
        let summary = ctx.ledger().summary();
        println!(
            "Budget {}{}, {} used, {} available",
            size::format(summary.budget_mb),
            if summary.recommended { " (recommended)" } else { "" },
            size::format(summary.used_mb),
            size::format(summary.available_mb)
        );
        return Ok(());
    };

    // 사용량보다 낮추면 아무것도 쓰지 않음
    ctx.set_global_budget(size_mb)?;
    commit(settings, &mut ctx)?;
    Ok(())
}

pub fn settings(
    settings: &ToolSettings,
    use_rsync: Option<bool>,
    mail: Option<bool>,
    zl2r: Option<bool>,
) -> anyhow::Result<()> {
    let mut ctx = load_context(settings)?;
    let update = PrimaryUpdate {
        use_rsync,
        mail,
        zl2r,
    };

    if update.is_empty() {
        let summary = PrimarySummary::from_document(ctx.primary());
        println!("USE_RSYNC={}", summary.use_rsync);
        println!("MAIL={}", summary.mail);
        println!("ZL2R={}", summary.zl2r);
        return Ok(());
    }

    ctx.update_primary(&update)?;
    commit(settings, &mut ctx)?;
    Ok(())
}

pub fn apply(settings: &ToolSettings, restart: bool) -> anyhow::Result<()> {
    let mut ctx = load_context(settings)?;
    commit(settings, &mut ctx)?;

    if restart {
        run_service(settings, ServiceAction::Restart)?;
    }
    Ok(())
}

/// `None`이면 상태 조회
pub fn service(settings: &ToolSettings, action: Option<ServiceAction>) -> anyhow::Result<()> {
    match action {
        Some(action) => run_service(settings, action),
        None => {
            let service = settings.service();
            println!("{}: {}", service.unit(), service.status());
            Ok(())
        }
    }
}

fn run_service(settings: &ToolSettings, action: ServiceAction) -> anyhow::Result<()> {
    let service = settings.service();
    service.run(action)?;
    println!("✓ {} {}: {}", action.as_str(), service.unit(), service.status());
    Ok(())
}
