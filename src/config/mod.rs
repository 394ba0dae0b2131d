/// Configuration system for chatdash.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::DashConfig::default()`]
/// 2. **User global config**: `~/.chatdash/config.toml`
/// 3. **Project local config**: `.chatdash.toml` in the current working directory
/// 4. **Environment variables**: `CHATDASH_*` overrides (highest precedence)
///
/// The global file doubles as the backend's persisted configuration
/// document: `POST /api/config` merges the submitted document into it.
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

pub use schema::DashConfig;

use crate::view::theme::Theme;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved chatdash configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> DashConfig {
    let mut config = DashConfig::default();

    if let Some(global) = global_config_path().and_then(|p| load_file(&p)) {
        config = global;
    }

    if let Some(project) = project_config_path().and_then(|p| load_file(&p)) {
        config = project;
    }

    apply_env_overrides(&mut config);

    config
}

/// Load a TOML config file.
///
/// Returns `None` if the file doesn't exist or the content is malformed.
/// Malformed files are logged and otherwise ignored so a bad edit never
/// keeps the dashboard from starting.
pub fn load_file(path: &Path) -> Option<DashConfig> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            None
        }
    }
}

/// Write a config to `path` as pretty TOML, creating parent directories.
pub fn save_file(path: &Path, config: &DashConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config).context("failed to serialize config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, toml_str)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// The per-user state directory: `~/.chatdash`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".chatdash"))
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".chatdash.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `CHATDASH_URL`: backend base URL used by the client
/// - `CHATDASH_HOST`: server bind host
/// - `CHATDASH_PORT` / `PORT`: server port
/// - `CHATDASH_DEBUG` / `DEBUG`: verbose server logging
/// - `CHATDASH_THEME`: default theme (`light` / `dark`)
/// - `CHATDASH_LOG`: logging filter directive
fn apply_env_overrides(config: &mut DashConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

fn apply_overrides_from(config: &mut DashConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("CHATDASH_URL").filter(|v| !v.is_empty()) {
        config.client.base_url = val.trim_end_matches('/').to_string();
    }
    if let Some(val) = lookup("CHATDASH_HOST").filter(|v| !v.is_empty()) {
        config.server.host = val;
    }
    if let Some(port) = lookup("CHATDASH_PORT")
        .or_else(|| lookup("PORT"))
        .and_then(|v| v.parse::<u16>().ok())
    {
        config.server.port = port;
    }
    if let Some(val) = lookup("CHATDASH_DEBUG").or_else(|| lookup("DEBUG")) {
        config.server.debug = is_truthy(&val);
    }
    if let Some(theme) = lookup("CHATDASH_THEME").and_then(|v| Theme::parse(&v)) {
        config.ui.theme = theme;
    }
    if let Some(val) = lookup("CHATDASH_LOG").filter(|v| !v.is_empty()) {
        config.logging.filter = val;
    }
}

/// Check if a string value represents a truthy boolean.
pub(crate) fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Document merging (backend side of POST /api/config)
// ---------------------------------------------------------------------------

/// Merge a submitted configuration document over the stored config.
///
/// Objects merge key by key; any other value replaces what was there. The
/// result must still deserialize into [`DashConfig`], otherwise the stored
/// config is left unchanged and an error is returned.
pub fn merge_document(base: &DashConfig, overlay: &Value) -> Result<DashConfig> {
    if !overlay.is_object() {
        anyhow::bail!("configuration document must be a JSON object");
    }
    let mut merged = serde_json::to_value(base).context("failed to serialize current config")?;
    merge_value(&mut merged, overlay);
    serde_json::from_value(merged).context("configuration document does not match the schema")
}

fn merge_value(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.chatdash/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.chatdash/ directory")?;
    }

    fs::write(&path, DashConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single dotted key (e.g. `system.retries`) in the global config file.
///
/// The raw value is coerced to the type of the value it replaces. Missing
/// files start from the built-in defaults.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&DashConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Reject edits that no longer fit the schema before touching the file.
    let _: DashConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("value '{value}' is not valid for '{key}'"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key '{key}'");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];
    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("'{key}' is a section, not a value"),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn is_truthy_accepts_variants() {
        for yes in ["1", "true", "TRUE", "yes", "on", "ON"] {
            assert!(is_truthy(yes), "{yes}");
        }
        for no in ["0", "false", "no", "off", ""] {
            assert!(!is_truthy(no), "{no}");
        }
    }

    #[test]
    fn env_overrides_apply_in_precedence_order() {
        let mut config = DashConfig::default();
        apply_overrides_from(
            &mut config,
            env(&[
                ("CHATDASH_URL", "http://example.test:9000/"),
                ("CHATDASH_PORT", "7000"),
                ("PORT", "6000"),
                ("DEBUG", "1"),
                ("CHATDASH_THEME", "light"),
                ("CHATDASH_LOG", "debug"),
            ]),
        );

        assert_eq!(config.client.base_url, "http://example.test:9000");
        assert_eq!(config.server.port, 7000);
        assert!(config.server.debug);
        assert_eq!(config.ui.theme, Theme::Light);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn env_overrides_ignore_garbage() {
        let mut config = DashConfig::default();
        apply_overrides_from(
            &mut config,
            env(&[("PORT", "not-a-port"), ("CHATDASH_THEME", "sepia")]),
        );
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.ui.theme, Theme::Dark);
    }

    #[test]
    fn load_file_ignores_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server\nport = ").unwrap();
        assert!(load_file(&path).is_none());
    }

    #[test]
    fn save_then_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = DashConfig::default();
        config.system.retries = 9;
        save_file(&path, &config).unwrap();
        assert_eq!(load_file(&path).unwrap().system.retries, 9);
    }

    #[test]
    fn merge_document_overlays_nested_values() {
        let base = DashConfig::default();
        let overlay = serde_json::json!({
            "system": { "max_tokens": 1024 },
            "models": { "gpt-4o": { "temperature": 0.2 } },
        });

        let merged = merge_document(&base, &overlay).unwrap();
        assert_eq!(merged.system.max_tokens, 1024);
        assert_eq!(merged.system.concurrent_requests, 2);
        let gpt = &merged.models["gpt-4o"];
        assert!((gpt.temperature - 0.2).abs() < f64::EPSILON);
        assert_eq!(gpt.endpoint, "https://api.openai.com/v1");
        // Sections the editor never sends are preserved.
        assert_eq!(merged.client, base.client);
    }

    #[test]
    fn merge_document_rejects_schema_violations() {
        let base = DashConfig::default();
        let overlay = serde_json::json!({ "server": { "port": "eighty" } });
        assert!(merge_document(&base, &overlay).is_err());
        assert!(merge_document(&base, &serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn set_toml_value_coerces_by_existing_type() {
        let mut root: toml::Value = toml::from_str(
            r#"
[system]
retries = 3
[server]
debug = false
[models.m]
temperature = 0.7
endpoint = ""
"#,
        )
        .unwrap();

        set_toml_value(&mut root, "system.retries", "5").unwrap();
        set_toml_value(&mut root, "server.debug", "yes").unwrap();
        set_toml_value(&mut root, "models.m.temperature", "0.3").unwrap();
        set_toml_value(&mut root, "models.m.endpoint", "http://x").unwrap();

        assert_eq!(root["system"]["retries"].as_integer(), Some(5));
        assert_eq!(root["server"]["debug"].as_bool(), Some(true));
        assert!((root["models"]["m"]["temperature"].as_float().unwrap() - 0.3).abs() < 1e-9);
        assert_eq!(root["models"]["m"]["endpoint"].as_str(), Some("http://x"));
    }

    #[test]
    fn set_toml_value_rejects_bad_keys_and_values() {
        let mut root: toml::Value = toml::from_str("[system]\nretries = 3\n").unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "1").is_err());
        assert!(set_toml_value(&mut root, "system.missing", "1").is_err());
        assert!(set_toml_value(&mut root, "system.retries", "many").is_err());
        assert!(set_toml_value(&mut root, "system", "1").is_err());
        assert!(set_toml_value(&mut root, "system..retries", "1").is_err());
    }
}
