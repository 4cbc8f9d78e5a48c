//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Missing sections fall back to their defaults, so a settings file only
//! needs the keys the user actually changed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Environment variable holding the service credential.
pub const SERVICE_KEY_ENV: &str = "GMI_API_KEY";
/// Environment variable overriding the completion model identifier.
pub const MODEL_ENV: &str = "READFORME_MODEL";
/// Environment variable overriding the proxy listen port.
pub const PORT_ENV: &str = "PORT";

// ---------------------------------------------------------------------------
// CompletionConfig
// ---------------------------------------------------------------------------

/// Settings for the hosted chat-completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base URL; `/v1/chat/completions` is appended.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Output cap for the free-text pinyin completion.
    pub pinyin_max_tokens: u32,
    /// Output cap for the JSON word breakdown (longer, so lists are not cut).
    pub words_max_tokens: u32,
    /// Maximum seconds to wait for a completion.
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.gmi-serving.com".into(),
            model: "zai-org/GLM-5-FP8".into(),
            pinyin_max_tokens: 2000,
            words_max_tokens: 4000,
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for the hosted, queue-based speech endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// URL the synthesis job is submitted to.
    pub submit_url: String,
    /// Speech model identifier.
    pub model: String,
    pub voice_id: String,
    pub audio_encoding: String,
    pub sample_rate_hertz: u32,
    pub speaking_rate: f32,
    /// Synthesis temperature (prosody variation), not LLM sampling.
    pub temperature: f32,
    /// Per-request timeout, applied to both the submit and download step.
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            submit_url: "https://console.gmicloud.ai/api/v1/ie/requestqueue/apikey/requests"
                .into(),
            model: "inworld-tts-1.5-max".into(),
            voice_id: "Xinyi".into(),
            audio_encoding: "MP3".into(),
            sample_rate_hertz: 22_050,
            speaking_rate: 1.0,
            temperature: 1.1,
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// BudgetConfig
// ---------------------------------------------------------------------------

/// Anonymous usage allowance on the service path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Token units after which a user key is required.
    pub ceiling: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self { ceiling: 50_000 }
    }
}

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// Service path settings: where clients reach the proxy, and the credential
/// the proxy injects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the proxy as seen by clients.
    pub base_url: String,
    /// Service credential. Normally supplied through `GMI_API_KEY` rather
    /// than written to disk; `None` disables the service path.
    pub api_key: Option<String>,
    /// Client-side timeout for proxy calls.
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".into(),
            api_key: None,
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Proxy listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding `index.html` and the other static assets.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3001,
            static_dir: PathBuf::from("public"),
        }
    }
}

// ---------------------------------------------------------------------------
// ShareConfig
// ---------------------------------------------------------------------------

/// Share blob store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Blob root directory; `None` uses [`AppPaths::share_dir`].
    pub dir: Option<PathBuf>,
}

impl ShareConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| AppPaths::new().share_dir)
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use read_for_me::config::AppConfig;
///
/// // Load (returns Default when file is missing) and apply env overrides.
/// let config = AppConfig::load().unwrap().with_env(None);
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub completion: CompletionConfig,
    pub speech: SpeechConfig,
    pub budget: BudgetConfig,
    pub service: ServiceConfig,
    pub server: ServerConfig,
    pub share: ShareConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply process environment overrides, then those from an optional
    /// `.env` file (the file wins, matching how the proxy has always loaded
    /// its credentials).
    pub fn with_env(mut self, dotenv: Option<&Path>) -> Self {
        let mut vars: HashMap<String, String> = std::env::vars().collect();
        if let Some(path) = dotenv {
            if let Ok(content) = std::fs::read_to_string(path) {
                log::debug!("config: loading overrides from {}", path.display());
                vars.extend(parse_dotenv(&content));
            }
        }
        self.apply_overrides(&vars);
        self
    }

    /// Apply overrides from an explicit variable map.
    pub fn apply_overrides(&mut self, vars: &HashMap<String, String>) {
        if let Some(key) = vars.get(SERVICE_KEY_ENV) {
            let key = key.trim();
            self.service.api_key = (!key.is_empty()).then(|| key.to_string());
        }
        if let Some(model) = vars.get(MODEL_ENV).map(|m| m.trim()) {
            if !model.is_empty() {
                self.completion.model = model.to_string();
            }
        }
        if let Some(port) = vars.get(PORT_ENV) {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => log::warn!("config: ignoring invalid {PORT_ENV}={port:?}"),
            }
        }
    }

    /// Returns `true` when no `settings.toml` file exists yet.
    pub fn is_first_run() -> bool {
        !AppPaths::new().settings_file.exists()
    }
}

/// Parse `KEY=value` lines from a `.env` file.
///
/// Blank lines and `#` comments are skipped; values are trimmed and one
/// surrounding quote character is removed from each end.
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let (key, value) = line.split_once('=')?;
            let valid_key = key
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid_key {
                return None;
            }
            let value = value.trim();
            let value = value
                .strip_prefix(['"', '\''])
                .unwrap_or(value);
            let value = value.strip_suffix(['"', '\'']).unwrap_or(value);
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
