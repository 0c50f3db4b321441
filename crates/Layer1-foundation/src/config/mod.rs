//! Config - SSDsaver 자체 설정
//!
//! - `settings.rs` - 설정 파일 경로, 서비스 이름, 권한 채널 (TOML)

mod settings;

pub use settings::{ToolSettings, SETTINGS_FILE};
