//! Reference backend for the dashboard.
//!
//! A small synchronous HTTP server (`tiny_http`) that serves:
//! - The server-rendered dashboard page at `/`
//! - The JSON endpoints the dashboard client talks to: chat, system stats,
//!   configuration, settings, models, tools and uploads
//!
//! Launched via `chatdash serve` (default: `http://127.0.0.1:5000`).

mod api;
pub mod assistant;
pub mod stats;

use std::io::{Cursor, Read};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{info, warn};

use crate::config::schema::DashConfig;
use crate::view::WELCOME_MESSAGE;
use crate::view::conversation::{Conversation, Role};
use stats::StatsSampler;

pub(crate) type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Server state
// ---------------------------------------------------------------------------

/// Everything the handlers read and mutate. Requests are handled one at a
/// time, so handlers get exclusive access.
pub struct ServerState {
    pub config: DashConfig,
    /// Where `POST /api/config` persists; `None` keeps changes in memory.
    pub config_path: Option<PathBuf>,
    pub settings: Map<String, Value>,
    pub sampler: StatsSampler,
    /// Chat history served with the page, so a reload keeps it.
    pub conversation: Conversation,
    uploads: u64,
}

impl ServerState {
    pub fn new(config: DashConfig, config_path: Option<PathBuf>) -> Self {
        let settings = default_settings(&config);
        let mut conversation = Conversation::new(config.ui.show_timestamps);
        conversation.append_message(Role::Assistant, WELCOME_MESSAGE);
        Self {
            config,
            config_path,
            settings,
            sampler: StatsSampler::new(),
            conversation,
            uploads: 0,
        }
    }

    /// Number of files accepted so far.
    pub fn upload_count(&self) -> u64 {
        self.uploads
    }

    fn next_upload_id(&mut self) -> u64 {
        self.uploads += 1;
        self.uploads
    }
}

/// Settings served before any update.
pub fn default_settings(config: &DashConfig) -> Map<String, Value> {
    let value = serde_json::json!({
        "theme": config.ui.theme.as_str(),
        "default_model": assistant::DEFAULT_MODEL,
        "temperature": 0.7,
        "save_conversations": true,
        "allow_web_searches": true,
        "data_retention_days": 30,
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

// ---------------------------------------------------------------------------
// Server entry points
// ---------------------------------------------------------------------------

/// Bind the listening socket.
pub fn bind(addr: &str) -> Result<Server> {
    Server::http(addr).map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))
}

/// Start the server on `addr` and block serving requests.
pub fn serve(addr: &str, state: ServerState, open: bool) -> Result<()> {
    let server = bind(addr)?;

    println!("chatdash running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if open {
        let url = format!("http://{addr}");
        if let Err(e) = open_browser(&url) {
            warn!(error = %e, "could not open browser");
        }
    }

    run(&server, state);
    Ok(())
}

/// Serve on a background thread. Returns the bound address, which is
/// useful with port 0.
pub fn spawn(addr: &str, state: ServerState) -> Result<(SocketAddr, JoinHandle<()>)> {
    let server = bind(addr)?;
    let local = server
        .server_addr()
        .to_ip()
        .context("server is not listening on an IP socket")?;
    let handle = thread::spawn(move || run(&server, state));
    Ok((local, handle))
}

/// Handle requests sequentially until the server shuts down. Errors are
/// answered per request and never stop the loop.
pub fn run(server: &Server, mut state: ServerState) {
    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        // Read body up-front for methods that carry one
        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = Vec::new();
            if let Err(e) = request.as_reader().read_to_end(&mut buf) {
                warn!(error = %e, %url, "failed to read request body");
            }
            Some(buf)
        } else {
            None
        };

        let resp = match dispatch(&mut state, &method, &url, body.as_deref()) {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, %method, %url, "request failed");
                let body = serde_json::json!({ "error": e.to_string() }).to_string();
                json_bytes(500, body.into_bytes())
            }
        };
        let status = resp.status_code().0;
        if let Err(e) = request.respond(resp) {
            warn!(error = %e, "failed to send response");
        }

        info!(%method, %url, status, "request");
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
pub(crate) fn dispatch(
    state: &mut ServerState,
    method: &Method,
    url: &str,
    body: Option<&[u8]>,
) -> Result<HttpResponse> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);
    let body = body.unwrap_or_default();

    match (method, path) {
        // Page
        (&Method::Get, "/") | (&Method::Get, "/index.html") => api::get_index(state),

        // API: Chat
        (&Method::Post, "/api/chat") => api::post_chat(state, body),

        // API: Metrics
        (&Method::Get, "/api/system/stats") => api::get_system_stats(state),

        // API: Configuration
        (&Method::Get, "/api/config") => api::get_config(state),
        (&Method::Post, "/api/config") => api::post_config(state, body),

        // API: Settings
        (&Method::Get, "/api/settings") => api::get_settings(state),
        (&Method::Put, "/api/settings") => api::put_settings(state, body),

        // API: Catalogues
        (&Method::Get, "/api/models") => api::get_models(state),
        (&Method::Get, "/api/tools") => api::get_tools(),

        // API: Uploads
        (&Method::Post, "/api/upload") => api::post_upload(state, url, body),

        // 404
        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn not_found() -> HttpResponse {
    json_bytes(404, br#"{"error": "not found"}"#.to_vec())
}

pub(crate) fn json_bytes(code: u16, body: Vec<u8>) -> HttpResponse {
    Response::from_data(body)
        .with_header(content_type_json())
        .with_status_code(StatusCode(code))
}

pub(crate) fn html_response(html: String) -> HttpResponse {
    Response::from_data(html.into_bytes())
        .with_header(content_type_html())
        .with_status_code(StatusCode(200))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8")
        .expect("static header is valid")
}

/// HTML content type header.
fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8").expect("static header is valid")
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
