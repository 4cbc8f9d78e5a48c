//! Configuration module for Read For Me.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each remote
//! service and for the proxy, `AppPaths` for cross-platform data
//! directories, TOML persistence via `AppConfig::load` / `AppConfig::save`,
//! and environment overrides (`GMI_API_KEY`, `READFORME_MODEL`, `PORT`).

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    parse_dotenv, AppConfig, BudgetConfig, CompletionConfig, ServerConfig, ServiceConfig,
    ShareConfig, SpeechConfig,
};
