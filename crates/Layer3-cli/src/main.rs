//! SSDsaver CLI - Main entry point

mod apps;
mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use ssdsaver_core::SyncMode;
use ssdsaver_foundation::{size, Error, ServiceAction, ToolSettings};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// SSDsaver - keep hot cache and log directories in RAM via log2ram
#[derive(Parser, Debug)]
#[command(name = "ssdsaver")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Settings file (default: ~/.config/ssdsaver/settings.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// log2ram config file to manage
    #[arg(long, global = true)]
    primary_config: Option<PathBuf>,

    /// Entry file holding per-application settings
    #[arg(long, global = true)]
    entry_file: Option<PathBuf>,

    /// Write files and run systemctl with the current privileges
    #[arg(long, global = true)]
    no_elevate: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show budget, log2ram settings and service state
    Status {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List configured entries
    Entries {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List known applications and their detected cache directories
    Apps {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Enable an entry or change its size
    Enable {
        /// Entry name (known application ids pick up preset defaults)
        name: String,

        /// RAM reserved for this entry, e.g. 200M or 1G
        #[arg(long, value_parser = parse_size)]
        size: Option<u64>,

        /// Sync policy
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Directory to keep in RAM (repeatable)
        #[arg(long = "path")]
        paths: Vec<String>,
    },
    /// Disable an entry (its settings are kept)
    Disable {
        /// Entry name
        name: String,
    },
    /// Show or set the global RAM budget
    Budget {
        /// New budget, e.g. 512M
        #[arg(value_parser = parse_size)]
        size: Option<u64>,
    },
    /// Show or change log2ram toggles
    Settings {
        #[arg(long)]
        use_rsync: Option<bool>,

        #[arg(long)]
        mail: Option<bool>,

        #[arg(long)]
        zl2r: Option<bool>,
    },
    /// Regenerate log2ram.conf from the entry file
    Apply {
        /// Restart the service afterwards
        #[arg(long)]
        restart: bool,
    },
    /// Control the log2ram service
    Service {
        #[arg(value_enum)]
        action: ServiceArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Safe,
    Lossy,
}

impl From<ModeArg> for SyncMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Safe => SyncMode::Safe,
            ModeArg::Lossy => SyncMode::Lossy,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ServiceArg {
    Start,
    Stop,
    Restart,
    Status,
}

impl ServiceArg {
    /// `Status`는 조회라서 None
    fn action(self) -> Option<ServiceAction> {
        match self {
            Self::Start => Some(ServiceAction::Start),
            Self::Stop => Some(ServiceAction::Stop),
            Self::Restart => Some(ServiceAction::Restart),
            Self::Status => None,
        }
    }
}

fn parse_size(text: &str) -> Result<u64, String> {
    size::parse(text).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(hint) = e.downcast_ref::<Error>().and_then(remediation) {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let settings = load_settings(&args);

    match args.command {
        Command::Status { json } => commands::status(&settings, json),
        Command::Entries { json } => commands::entries(&settings, json),
        Command::Apps { json } => commands::apps(&settings, json),
        Command::Enable {
            name,
            size,
            mode,
            paths,
        } => commands::enable(&settings, &name, size, mode.map(Into::into), paths),
        Command::Disable { name } => commands::disable(&settings, &name),
        Command::Budget { size } => commands::budget(&settings, size),
        Command::Settings {
            use_rsync,
            mail,
            zl2r,
        } => commands::settings(&settings, use_rsync, mail, zl2r),
        Command::Apply { restart } => commands::apply(&settings, restart),
        Command::Service { action } => commands::service(&settings, action.action()),
    }
}

/// 설정 파일 로드 후 CLI 플래그로 덮어쓰기
fn load_settings(args: &Args) -> ToolSettings {
    let loaded = match &args.config {
        Some(path) => ToolSettings::load(path),
        None => ToolSettings::load_default(),
    };
    if let Some(warning) = &loaded.warning {
        eprintln!("Warning: {} (using defaults)", warning);
    }

    let mut settings = loaded.value;
    if let Some(path) = &args.primary_config {
        settings = settings.primary_config(path);
    }
    if let Some(path) = &args.entry_file {
        settings = settings.entry_file(path);
    }
    if args.no_elevate {
        settings = settings.elevate(false);
    }
    settings
}

/// 정책 위반 시 사용자가 고를 수 있는 해결 방법
fn remediation(error: &Error) -> Option<&'static str> {
    match error {
        Error::BudgetExceeded { .. } => Some(
            "raise the budget with `ssdsaver budget <size>`, choose a smaller --size, or disable another entry",
        ),
        Error::DowngradeConflict { .. } => {
            Some("disable or shrink entries with `ssdsaver disable <name>` before lowering the budget")
        }
        Error::Persistence(_) | Error::Timeout(_) => {
            Some("the write can be retried safely; pass --no-elevate when already running as root")
        }
        _ => None,
    }
}
