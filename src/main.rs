use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use chatdash::cli::{self, OutputFormat};
use chatdash::config;
use chatdash::logging;
use chatdash::web;

#[derive(Debug, Parser)]
#[command(name = "chatdash")]
#[command(about = "Chat dashboard with live system metrics and a configuration editor")]
struct App {
    /// Backend base URL (overrides `client.base_url`)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the dashboard backend and serve the page
    Serve {
        /// Address to bind (default: server.host:server.port)
        #[arg(long)]
        addr: Option<String>,
        /// Open the dashboard in the default browser
        #[arg(long)]
        open: bool,
    },
    /// Send a message, or chat interactively when none is given
    Chat {
        /// Message to send
        message: Option<String>,
        /// Model to use
        #[arg(long)]
        model: Option<String>,
    },
    /// Show system metrics from the backend
    Stats {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
        /// Keep polling and print every sample
        #[arg(long)]
        watch: bool,
    },
    /// List the backend's models
    Models {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List the backend's tools
    Tools,
    /// Upload a file to the backend
    Upload {
        file: PathBuf,
    },
    /// Update backend settings with KEY=VALUE pairs
    Settings {
        #[arg(required = true)]
        assignments: Vec<String>,
    },
    /// Show or change the theme: toggle, light or dark
    Theme {
        action: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Write a default ~/.chatdash/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `server.port 8080`
    Set { key: String, value: String },
    /// Restore the default configuration file
    Reset,
    /// Print the global config file path
    Path,
    /// View or edit the backend's configuration (FIELD=VALUE...)
    Remote { assignments: Vec<String> },
}

fn main() -> Result<()> {
    let app = App::parse();

    let mut cfg = config::load();
    logging::init(&cfg.logging.filter);
    if let Some(url) = app.url {
        cfg.client.base_url = url;
    }

    match app.command {
        Commands::Serve { addr, open } => {
            let addr = addr.unwrap_or_else(|| cfg.server.bind_addr());
            let state = web::ServerState::new(cfg, config::global_config_file());
            web::serve(&addr, state, open)
        }
        Commands::Chat { message, model } => {
            cli::run_chat(&cfg, message.as_deref(), model.as_deref())
        }
        Commands::Stats { format, watch } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_stats(&cfg, fmt, watch)
        }
        Commands::Models { format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_models(&cfg, fmt)
        }
        Commands::Tools => cli::run_tools(&cfg),
        Commands::Upload { file } => cli::run_upload(&cfg, &file),
        Commands::Settings { assignments } => cli::run_settings(&cfg, &assignments),
        Commands::Theme { action } => cli::run_theme(&cfg, action.as_deref()),
        Commands::Config { command } => match command {
            ConfigCommand::Show => cli::run_config_show(),
            ConfigCommand::Init { force } => cli::run_config_init(force),
            ConfigCommand::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigCommand::Reset => cli::run_config_reset(),
            ConfigCommand::Path => cli::run_config_path(),
            ConfigCommand::Remote { assignments } => cli::run_config_remote(&cfg, &assignments),
        },
    }
}
