//! App Catalog - RAM 캐시로 이득을 보는 알려진 애플리케이션
//!
//! 설치 여부는 실행 파일이 PATH에 있는지로 판단하고,
//! 캐시 경로 패턴은 `~` 확장과 `*` glob으로 실제 경로가 됩니다.

use serde::Serialize;
use ssdsaver_core::entry::validate_paths;
use std::path::Path;
use tracing::warn;

/// 애플리케이션 프리셋
#[derive(Debug, Clone, Copy)]
pub struct AppPreset {
    pub id: &'static str,
    pub display_name: &'static str,
    pub executables: &'static [&'static str],
    pub cache_paths: &'static [&'static str],
    pub default_size_mb: u64,
}

pub const CATALOG: &[AppPreset] = &[
    AppPreset {
        id: "chrome",
        display_name: "Google Chrome",
        executables: &["google-chrome", "google-chrome-stable", "chrome"],
        cache_paths: &["~/.cache/google-chrome/Default/Cache"],
        default_size_mb: 200,
    },
    AppPreset {
        id: "chromium",
        display_name: "Chromium",
        executables: &["chromium", "chromium-browser"],
        cache_paths: &["~/.cache/chromium/Default/Cache"],
        default_size_mb: 200,
    },
    AppPreset {
        id: "firefox",
        display_name: "Mozilla Firefox",
        executables: &["firefox"],
        // .default, .default-release, .default-esr 모두
        cache_paths: &["~/.cache/mozilla/firefox/*.default*/cache2"],
        default_size_mb: 150,
    },
    AppPreset {
        id: "brave",
        display_name: "Brave Browser",
        executables: &["brave", "brave-browser"],
        cache_paths: &[
            "~/.config/BraveSoftware/Brave-Browser/Default/Cache",
            "~/.cache/BraveSoftware/Brave-Browser/Default/Cache",
        ],
        default_size_mb: 200,
    },
    AppPreset {
        id: "edge",
        display_name: "Microsoft Edge",
        executables: &["microsoft-edge", "microsoft-edge-stable"],
        cache_paths: &["~/.config/microsoft-edge/Default/Cache"],
        default_size_mb: 200,
    },
    AppPreset {
        id: "opera",
        display_name: "Opera",
        executables: &["opera"],
        cache_paths: &["~/.cache/opera/Cache"],
        default_size_mb: 150,
    },
    AppPreset {
        id: "vivaldi",
        display_name: "Vivaldi",
        executables: &["vivaldi"],
        cache_paths: &["~/.cache/vivaldi/Default/Cache"],
        default_size_mb: 150,
    },
    AppPreset {
        id: "discord",
        display_name: "Discord",
        executables: &["discord"],
        cache_paths: &["~/.config/discord/Cache", "~/.config/discord/Code Cache"],
        default_size_mb: 100,
    },
    AppPreset {
        id: "slack",
        display_name: "Slack",
        executables: &["slack"],
        cache_paths: &["~/.config/Slack/Cache", "~/.config/Slack/Code Cache"],
        default_size_mb: 100,
    },
    AppPreset {
        id: "steam",
        display_name: "Steam",
        executables: &["steam"],
        cache_paths: &["~/.local/share/Steam/appcache"],
        default_size_mb: 300,
    },
    AppPreset {
        id: "apt",
        display_name: "APT Package Cache",
        executables: &["apt", "apt-get"],
        cache_paths: &["/var/cache/apt/archives"],
        default_size_mb: 500,
    },
    AppPreset {
        id: "thumbnails",
        display_name: "Thumbnail Cache",
        // 항상 사용 가능
        executables: &["true"],
        cache_paths: &["~/.cache/thumbnails"],
        default_size_mb: 100,
    },
];

pub fn find(id: &str) -> Option<&'static AppPreset> {
    CATALOG.iter().find(|preset| preset.id == id)
}

impl AppPreset {
    /// PATH에서 처음 발견된 실행 파일
    pub fn detect_executable(&self) -> Option<&'static str> {
        self.executables
            .iter()
            .copied()
            .find(|exe| which::which(exe).is_ok())
    }

    /// 현재 존재하는 캐시 경로 (항목 경로로 쓸 수 없는 경로는 제외)
    pub fn existing_paths(&self) -> Vec<String> {
        let home = dirs::home_dir();
        self.cache_paths
            .iter()
            .flat_map(|pattern| expand_pattern(pattern, home.as_deref()))
            .filter(|path| usable_path(path))
            .collect()
    }
}

/// `~`와 `*`를 확장하고 실제로 존재하는 경로만 반환
pub fn expand_pattern(pattern: &str, home: Option<&Path>) -> Vec<String> {
    let expanded = match (pattern.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest).to_string_lossy().into_owned(),
        (Some(_), None) => return Vec::new(),
        (None, _) => pattern.to_string(),
    };

    if expanded.contains('*') {
        return glob::glob(&expanded)
            .map(|paths| {
                paths
                    .filter_map(|p| p.ok())
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
    }

    if Path::new(&expanded).exists() {
        vec![expanded]
    } else {
        Vec::new()
    }
}

fn usable_path(path: &str) -> bool {
    match validate_paths(std::slice::from_ref(&path.to_string())) {
        Ok(()) => true,
        Err(e) => {
            warn!(path, error = %e, "Skipping detected cache directory");
            false
        }
    }
}

/// 감지 결과 (출력용)
#[derive(Debug, Clone, Serialize)]
pub struct DetectedApp {
    pub id: &'static str,
    pub display_name: &'static str,
    pub executable: Option<&'static str>,
    pub cache_paths: Vec<String>,
    pub default_size_mb: u64,
}

impl DetectedApp {
    pub fn is_installed(&self) -> bool {
        self.executable.is_some()
    }
}

/// 카탈로그 전체 감지
pub fn detect_all() -> Vec<DetectedApp> {
    CATALOG
        .iter()
        .map(|preset| DetectedApp {
            id: preset.id,
            display_name: preset.display_name,
            executable: preset.detect_executable(),
            cache_paths: preset.existing_paths(),
            default_size_mb: preset.default_size_mb,
        })
        .collect()
}
