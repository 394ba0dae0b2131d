/// Configuration schema and defaults for chatdash.
///
/// The same document plays two roles: it is the local configuration of the
/// CLI/server (`[server]`, `[client]`, `[logging]`) and it is the
/// configuration document served by `GET /api/config` and edited through
/// the dashboard's configuration editor (`[server]`, `[system]`, `[ui]`,
/// `[models.*]`).
///
/// Every field has a built-in default; a TOML file only needs the values it
/// wants to override.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::view::theme::Theme;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level chatdash configuration.
///
/// Maps directly to `~/.chatdash/config.toml` and `.chatdash.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub system: SystemLimits,
    pub ui: UiConfig,
    pub models: BTreeMap<String, ModelConfig>,
    pub logging: LoggingConfig,
}

impl Default for DashConfig {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert(
            "gpt-4o".to_string(),
            ModelConfig {
                endpoint: "https://api.openai.com/v1".to_string(),
                ..ModelConfig::default()
            },
        );
        models.insert(
            "llama-3".to_string(),
            ModelConfig {
                endpoint: "http://localhost:11434".to_string(),
                ..ModelConfig::default()
            },
        );

        Self {
            server: ServerConfig::default(),
            client: ClientConfig::default(),
            system: SystemLimits::default(),
            ui: UiConfig::default(),
            models,
            logging: LoggingConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Reference backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to listen on. `PORT` / `CHATDASH_PORT` override it.
    pub port: u16,
    /// Verbose request logging.
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            debug: false,
        }
    }
}

impl ServerConfig {
    /// `host:port` suitable for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// [client]
// ---------------------------------------------------------------------------

/// Dashboard client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the dashboard backend.
    pub base_url: String,
    /// Per-request timeout (milliseconds). `0` disables the timeout.
    pub timeout_ms: u64,
    /// Stats poll interval while only the summary is visible.
    pub summary_poll_ms: u64,
    /// Stats poll interval while the detail view is open.
    pub detail_poll_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 30_000,
            summary_poll_ms: 5_000,
            detail_poll_ms: 2_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [system]
// ---------------------------------------------------------------------------

/// Generation and concurrency limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemLimits {
    pub max_tokens: u32,
    pub concurrent_requests: u32,
    pub retries: u32,
    pub timeout_secs: u64,
}

impl Default for SystemLimits {
    fn default() -> Self {
        Self {
            max_tokens: 8192,
            concurrent_requests: 2,
            retries: 3,
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// [ui]
// ---------------------------------------------------------------------------

/// Presentation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Theme used when no preference has been persisted yet.
    pub theme: Theme,
    pub show_timestamps: bool,
    /// Number of samples kept by each live chart.
    pub chart_window: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            show_timestamps: true,
            chart_window: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// [models.<name>]
// ---------------------------------------------------------------------------

/// Per-model connection and sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub endpoint: String,
    pub api_key: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub enabled: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            temperature: 0.7,
            max_tokens: 4096,
            enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info,chatdash=debug"`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl DashConfig {
    /// The annotated TOML written by `chatdash config init`.
    pub fn default_toml() -> String {
        r#"# chatdash configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (CHATDASH_*, PORT, DEBUG)
#   2. Project config (.chatdash.toml in current directory)
#   3. User global config (~/.chatdash/config.toml)
#   4. Built-in defaults

[server]
host = "127.0.0.1"
port = 5000
debug = false

[client]
base_url = "http://127.0.0.1:5000"
timeout_ms = 30000          # 0 disables the request timeout
summary_poll_ms = 5000
detail_poll_ms = 2000

[system]
max_tokens = 8192
concurrent_requests = 2
retries = 3
timeout_secs = 60

[ui]
theme = "dark"              # light | dark
show_timestamps = true
chart_window = 20

[models.gpt-4o]
endpoint = "https://api.openai.com/v1"
api_key = ""
temperature = 0.7
max_tokens = 4096
enabled = true

[models.llama-3]
endpoint = "http://localhost:11434"
api_key = ""
temperature = 0.7
max_tokens = 4096
enabled = true

[logging]
filter = "info"             # overridden by CHATDASH_LOG or RUST_LOG
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
