//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `chatdash chat [MESSAGE]`: one-shot or interactive chat
//! - `chatdash stats [--watch]`: system metrics from the backend
//! - `chatdash models` / `chatdash tools`: backend catalogues
//! - `chatdash upload FILE`: attach a file
//! - `chatdash settings KEY=VALUE...`: update backend settings
//! - `chatdash theme [toggle|light|dark]`: persisted theme preference
//! - `chatdash config show|init|set|reset|path|remote`: configuration management
//!
//! Every network command goes through a [`Dashboard`] so the CLI sees the
//! same conversation, toast and metrics state the page does.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use colored::Colorize;
use serde_json::{Map, Value};

use crate::api::{Backend, HttpBackend, ModelInfo, SystemStats};
use crate::config;
use crate::config::schema::DashConfig;
use crate::dashboard::Dashboard;
use crate::view::config_form::FieldKind;
use crate::view::conversation::{BlockKind, Role};
use crate::view::metrics::format_bytes;
use crate::view::theme::{Theme, ThemeStore};
use crate::view::toast::ToastKind;

/// Output format for data commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

fn connect(config: &DashConfig) -> Dashboard<HttpBackend> {
    let backend = Arc::new(HttpBackend::from_config(&config.client));
    Dashboard::new(backend, config, ThemeStore::user())
}

// ---------------------------------------------------------------------------
// chatdash chat
// ---------------------------------------------------------------------------

/// Send one message, or read messages from stdin until EOF when `message`
/// is `None`.
pub fn run_chat(config: &DashConfig, message: Option<&str>, model: Option<&str>) -> Result<()> {
    let mut dash = connect(config);
    if let Some(model) = model {
        dash.load_models();
        if !dash.view_mut().select_model(model) {
            bail!("model '{model}' is not available");
        }
    }

    if let Some(message) = message {
        return send_and_print(&mut dash, message);
    }

    println!(
        "{} (Ctrl+D to quit)",
        format!("Chatting with {}", dash.backend().base_url()).bold().cyan()
    );
    let stdin = io::stdin();
    loop {
        print!("{} ", ">".green().bold());
        io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }
        send_and_print(&mut dash, &line)?;
    }
}

fn send_and_print<B: Backend>(dash: &mut Dashboard<B>, message: &str) -> Result<()> {
    let before = dash.view().conversation.blocks().len();
    dash.send(message);

    for block in &dash.view().conversation.blocks()[before..] {
        match block.kind {
            BlockKind::Message(Role::Assistant) => {
                println!("{} {}", "Assistant:".bold().cyan(), block.text);
            }
            BlockKind::Error => {
                eprintln!("{} {}", "error:".red().bold(), block.text);
                bail!("chat request failed");
            }
            _ => {}
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// chatdash stats
// ---------------------------------------------------------------------------

/// Print system metrics once, or keep refreshing when `watch` is set.
pub fn run_stats(config: &DashConfig, format: OutputFormat, watch: bool) -> Result<()> {
    let mut dash = connect(config);
    dash.mount(Instant::now());

    if !watch {
        dash.poll(Instant::now());
        return print_current_stats(&dash, format);
    }

    dash.enable_background_polling();
    dash.open_metrics_detail(Instant::now());
    loop {
        watch_once(&mut dash, Instant::now(), format)?;
    }
}

/// One pass of `stats --watch`: start the due poll, wait for it and print
/// the result. Returns whether a completion was applied.
fn watch_once<B>(dash: &mut Dashboard<B>, now: Instant, format: OutputFormat) -> Result<bool>
where
    B: Backend + Send + Sync + 'static,
{
    dash.tick(now);
    let wait = dash
        .poller()
        .next_deadline()
        .map(|d| d.saturating_duration_since(now))
        .unwrap_or(Duration::from_secs(1));
    if !dash.wait_for_stats(wait) {
        return Ok(false);
    }
    report_watch_tick(dash, format)?;
    Ok(true)
}

/// A failed tick is reported and skipped; the next interval retries.
fn report_watch_tick<B: Backend>(dash: &Dashboard<B>, format: OutputFormat) -> Result<()> {
    if let Some(status) = &dash.view().metrics.status {
        eprintln!("{} {status}", "warning:".yellow().bold());
        return Ok(());
    }
    print_current_stats(dash, format)
}

fn print_current_stats<B: Backend>(dash: &Dashboard<B>, format: OutputFormat) -> Result<()> {
    let metrics = &dash.view().metrics;
    if let Some(status) = &metrics.status {
        bail!("{status}");
    }
    let Some(stats) = &metrics.last else {
        bail!("no stats received");
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(stats)?),
        OutputFormat::Table => print_stats_table(stats, dash),
    }
    Ok(())
}

fn print_stats_table<B: Backend>(stats: &SystemStats, dash: &Dashboard<B>) {
    let metrics = &dash.view().metrics;
    println!("{}", "System Metrics".bold().cyan());
    println!("{}", "=".repeat(50));
    for (name, bar, detail) in [
        (
            "CPU ",
            &metrics.cpu,
            format!("{} cores @ {:.0} MHz", stats.cpu.cores, stats.cpu.frequency),
        ),
        (
            "RAM ",
            &metrics.memory,
            format!(
                "{} / {}",
                format_bytes(stats.memory.used),
                format_bytes(stats.memory.total)
            ),
        ),
        (
            "Disk",
            &metrics.disk,
            format!(
                "{} free of {}",
                format_bytes(stats.disk.free),
                format_bytes(stats.disk.total)
            ),
        ),
    ] {
        println!(
            "  {} {} {:>6}  {}",
            name.bold(),
            colorize_bar(bar.percent()),
            bar.label(),
            detail.dimmed()
        );
    }

    if let Some(charts) = metrics.charts() {
        let trend: Vec<String> = charts.cpu.iter().map(|v| format!("{v:.0}")).collect();
        println!("  {} {}", "CPU trend:".dimmed(), trend.join(" "));
    }
    println!();
}

fn colorize_bar(percent: f64) -> colored::ColoredString {
    let bar = render_bar(percent, 20);
    if percent >= 90.0 {
        bar.red()
    } else if percent >= 70.0 {
        bar.yellow()
    } else {
        bar.green()
    }
}

fn render_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

// ---------------------------------------------------------------------------
// chatdash models / tools
// ---------------------------------------------------------------------------

pub fn run_models(config: &DashConfig, format: OutputFormat) -> Result<()> {
    let backend = HttpBackend::from_config(&config.client);
    let models = backend
        .models()
        .with_context(|| format!("failed to list models from {}", backend.base_url()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&models)?),
        OutputFormat::Table => print_models_table(&models),
    }
    Ok(())
}

fn print_models_table(models: &[ModelInfo]) {
    println!("{}", "Available Models".bold().cyan());
    println!("  {:<18} {:<18} Features", "ID", "Name");
    println!("  {}", "-".repeat(60));
    for model in models {
        let line = format!(
            "  {:<18} {:<18} {}",
            model.id,
            model.name,
            model.features.join(", ")
        );
        if model.disabled {
            println!("{} {}", line.dimmed(), "(disabled)".dimmed());
        } else {
            println!("{line}");
        }
    }
}

pub fn run_tools(config: &DashConfig) -> Result<()> {
    let backend = HttpBackend::from_config(&config.client);
    let tools = backend
        .tools()
        .with_context(|| format!("failed to list tools from {}", backend.base_url()))?;

    println!("{}", "Available Tools".bold().cyan());
    for tool in tools {
        println!("  {:<14} {}", tool.id.bold(), tool.description);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// chatdash upload
// ---------------------------------------------------------------------------

pub fn run_upload(config: &DashConfig, path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("file name is not valid UTF-8")?;

    let mut dash = connect(config);
    let ok = dash.attach_file(filename, &bytes);
    print_last_toast(&dash);
    if !ok {
        bail!("upload failed");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// chatdash settings
// ---------------------------------------------------------------------------

/// Update backend settings from `key=value` pairs. Values are read as JSON
/// when they parse, otherwise as plain strings.
pub fn run_settings(config: &DashConfig, assignments: &[String]) -> Result<()> {
    let settings = parse_assignments(assignments)?;
    let mut dash = connect(config);
    let ok = dash.update_settings(&settings);
    print_last_toast(&dash);
    if !ok {
        bail!("settings were not saved");
    }
    Ok(())
}

fn parse_assignments(assignments: &[String]) -> Result<Map<String, Value>> {
    let mut map = Map::new();
    for assignment in assignments {
        let Some((key, raw)) = assignment.split_once('=') else {
            bail!("expected KEY=VALUE, got '{assignment}'");
        };
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        map.insert(key.trim().to_string(), value);
    }
    Ok(map)
}

// ---------------------------------------------------------------------------
// chatdash theme
// ---------------------------------------------------------------------------

/// Show, toggle or set the persisted theme.
pub fn run_theme(config: &DashConfig, action: Option<&str>) -> Result<()> {
    let store = ThemeStore::user();
    let current = store.load().unwrap_or(config.ui.theme);

    let next = match action {
        None => {
            println!("Theme: {}", current.as_str().bold());
            return Ok(());
        }
        Some("toggle") => current.toggled(),
        Some(other) => match Theme::parse(other) {
            Some(theme) => theme,
            None => bail!("unknown theme '{other}' (expected light, dark or toggle)"),
        },
    };

    store.save(next)?;
    println!("{} Theme set to {}", "✓".green().bold(), next.as_str().bold());
    Ok(())
}

// ---------------------------------------------------------------------------
// chatdash config show | init | set | reset | path | remote
// ---------------------------------------------------------------------------

pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective chatdash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    // Show source info
    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);

    println!("{}", "Sources".bold());
    println!(
        "  Global:  {}",
        if global_exists {
            "~/.chatdash/config.toml".green()
        } else {
            "not found".dimmed()
        }
    );
    println!(
        "  Project: {}",
        if project_exists {
            ".chatdash.toml".green()
        } else {
            "not found".dimmed()
        }
    );
    Ok(())
}

pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Created config at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Reset config at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

pub fn run_config_path() -> Result<()> {
    let path = config::global_config_file().context("could not determine home directory")?;
    println!("{}", path.display());
    Ok(())
}

/// Edit the backend's configuration through the editor form. Without
/// assignments the form is printed.
pub fn run_config_remote(config: &DashConfig, assignments: &[String]) -> Result<()> {
    let mut dash = connect(config);
    if !dash.open_config_editor() {
        print_last_toast(&dash);
        bail!("could not load configuration");
    }

    if assignments.is_empty() {
        print_config_form(&dash);
        return Ok(());
    }

    for assignment in assignments {
        let Some((name, raw)) = assignment.split_once('=') else {
            bail!("expected FIELD=VALUE, got '{assignment}'");
        };
        dash.set_config_field(name.trim(), raw)?;
    }
    let saved = dash.save_config();
    print_last_toast(&dash);
    if !saved {
        bail!("configuration was not saved");
    }
    Ok(())
}

fn print_config_form<B: Backend>(dash: &Dashboard<B>) {
    let Some(form) = &dash.view().config_form else {
        return;
    };
    for section in &form.sections {
        println!("{}", section.title.bold().cyan());
        for control in &section.controls {
            let value = match control.kind {
                FieldKind::Secret if control.value.to_string().is_empty() => String::new(),
                FieldKind::Secret => "********".to_string(),
                _ => control.value.to_string(),
            };
            println!("  {:<32} {}", control.name(), value);
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn print_last_toast<B: Backend>(dash: &Dashboard<B>) {
    let Some(toast) = dash.view().toasts.last() else {
        return;
    };
    let line = match toast.kind {
        ToastKind::Success => format!("{} {}", "✓".green().bold(), toast.message),
        ToastKind::Error => format!("{} {}", "✗".red().bold(), toast.message),
        ToastKind::Warning => format!("{} {}", "!".yellow().bold(), toast.message),
        ToastKind::Info => format!("{} {}", "i".cyan().bold(), toast.message),
    };
    println!("{line}");
}
