//! Handlers for the dashboard's JSON endpoints and page.
//!
//! Each handler corresponds to a route in [`super::dispatch`] and returns a
//! ready-to-send response. Client mistakes become 4xx replies with an
//! `{error}` body; only serialization failures surface as `Err`.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::types::{
    ConfigEnvelope, ConfigSubmission, ModelInfo, ModelsReply, SettingsReply, SettingsUpdate,
    ToolInfo, ToolsReply, UploadReceipt,
};
use crate::config;
use crate::view::DashboardView;
use crate::view::conversation::Role;
use crate::view::page::render_page;

use super::{HttpResponse, ServerState, assistant, html_response, json_bytes};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON response with the given status.
fn json_status<T: Serialize>(code: u16, data: &T) -> Result<HttpResponse> {
    let body = serde_json::to_vec(data).context("failed to serialize JSON response")?;
    Ok(json_bytes(code, body))
}

fn json_response<T: Serialize>(data: &T) -> Result<HttpResponse> {
    json_status(200, data)
}

fn bad_request(message: &str) -> Result<HttpResponse> {
    json_status(400, &serde_json::json!({ "error": message }))
}

/// Value of query parameter `key`, percent-decoded.
fn query_param(url: &str, key: &str) -> Option<String> {
    url.split('?').nth(1)?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == key { Some(percent_decode(v)) } else { None }
    })
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                if let Some(byte) = decoded {
                    out.push(byte);
                    i += 3;
                    continue;
                }
                out.push(b'%');
            }
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

// ---------------------------------------------------------------------------
// Catalogues
// ---------------------------------------------------------------------------

fn model(id: &str, name: &str, features: &[&str]) -> ModelInfo {
    ModelInfo {
        id: id.to_string(),
        name: name.to_string(),
        disabled: false,
        features: features.iter().map(|f| f.to_string()).collect(),
    }
}

/// Built-in models plus any extra configured ones. Models configured with
/// `enabled = false` are listed as disabled.
pub fn model_catalogue(config: &config::schema::DashConfig) -> Vec<ModelInfo> {
    let mut models = vec![
        model(
            "gpt-4o",
            "GPT-4o",
            &["web_access", "file_upload", "code_execution", "tool_use"],
        ),
        model(
            "claude-3-opus",
            "Claude 3 Opus",
            &["web_access", "file_upload", "code_execution", "tool_use"],
        ),
        model(
            "claude-3-sonnet",
            "Claude 3 Sonnet",
            &["web_access", "file_upload", "code_execution"],
        ),
        model("llama-3", "Llama 3", &["file_upload", "code_execution"]),
    ];

    for (name, model_config) in &config.models {
        match models.iter_mut().find(|m| &m.id == name) {
            Some(existing) => existing.disabled = !model_config.enabled,
            None => models.push(ModelInfo {
                id: name.clone(),
                name: name.clone(),
                disabled: !model_config.enabled,
                features: Vec::new(),
            }),
        }
    }
    models
}

fn tool(id: &str, name: &str, icon: &str, description: &str) -> ToolInfo {
    ToolInfo {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        description: description.to_string(),
    }
}

pub fn tool_catalogue() -> Vec<ToolInfo> {
    vec![
        tool("web_search", "Web Search", "fa-globe", "Search the web for information"),
        tool("file_upload", "File Upload", "fa-file-upload", "Upload and analyze files"),
        tool("code_run", "Code Execution", "fa-code", "Execute code in various languages"),
        tool("browser", "Web Browser", "fa-window-maximize", "Navigate and interact with websites"),
        tool("terminal", "Terminal", "fa-terminal", "Run system commands"),
    ]
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /`: the dashboard page with the conversation so far.
pub fn get_index(state: &mut ServerState) -> Result<HttpResponse> {
    let mut view = DashboardView::new(&state.config.ui);
    view.conversation = state.conversation.clone();
    view.models = model_catalogue(&state.config);
    if let Some(default) = state.settings.get("default_model").and_then(Value::as_str) {
        view.select_model(default);
    }
    view.metrics.apply(&state.sampler.sample());
    Ok(html_response(render_page(&view)))
}

/// `POST /api/chat`: simulated assistant reply.
pub fn post_chat(state: &mut ServerState, body: &[u8]) -> Result<HttpResponse> {
    let Ok(request) = serde_json::from_slice::<Value>(body) else {
        return bad_request("Message is required");
    };
    let Some(message) = request
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
    else {
        return bad_request("Message is required");
    };
    let model = request
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or(assistant::DEFAULT_MODEL);

    let response = assistant::respond(message, model);
    state.conversation.append_message(Role::User, message);
    state.conversation.append_message(Role::Assistant, &response);
    json_response(&serde_json::json!({ "response": response, "model": model }))
}

/// `GET /api/system/stats`: a fresh host sample.
pub fn get_system_stats(state: &mut ServerState) -> Result<HttpResponse> {
    json_response(&state.sampler.sample())
}

/// `GET /api/config`: the effective configuration as a JSON document.
pub fn get_config(state: &mut ServerState) -> Result<HttpResponse> {
    let doc = serde_json::to_value(&state.config).context("failed to serialize config")?;
    let envelope = ConfigEnvelope {
        success: true,
        config: doc.as_object().cloned(),
        error: None,
    };
    json_response(&envelope)
}

/// `POST /api/config`: merge the posted document over the stored config
/// and persist it.
pub fn post_config(state: &mut ServerState, body: &[u8]) -> Result<HttpResponse> {
    let submission: ConfigSubmission = match serde_json::from_slice(body) {
        Ok(s) => s,
        Err(e) => {
            return json_status(
                400,
                &serde_json::json!({ "success": false, "error": format!("invalid request: {e}") }),
            );
        }
    };

    let merged = match config::merge_document(&state.config, &Value::Object(submission.config)) {
        Ok(merged) => merged,
        Err(e) => {
            warn!(error = %e, "rejected configuration update");
            return json_status(
                400,
                &serde_json::json!({ "success": false, "error": format!("{e:#}") }),
            );
        }
    };

    if let Some(path) = &state.config_path
        && let Err(e) = config::save_file(path, &merged)
    {
        warn!(error = %e, "failed to persist configuration");
        return json_status(
            500,
            &serde_json::json!({ "success": false, "error": format!("{e:#}") }),
        );
    }

    state.config = merged;
    info!("configuration updated");
    json_response(&serde_json::json!({ "success": true }))
}

/// `GET /api/settings`.
pub fn get_settings(state: &mut ServerState) -> Result<HttpResponse> {
    json_response(&state.settings)
}

/// `PUT /api/settings`: shallow merge of the posted keys.
pub fn put_settings(state: &mut ServerState, body: &[u8]) -> Result<HttpResponse> {
    let update: SettingsUpdate = match serde_json::from_slice(body) {
        Ok(u) => u,
        Err(e) => {
            let reply = SettingsReply {
                status: "error".to_string(),
                error: Some(format!("invalid settings: {e}")),
                settings: None,
            };
            return json_status(400, &reply);
        }
    };

    state.settings.extend(update.settings);
    json_response(&SettingsReply {
        status: "success".to_string(),
        error: None,
        settings: Some(state.settings.clone()),
    })
}

/// `GET /api/models`.
pub fn get_models(state: &mut ServerState) -> Result<HttpResponse> {
    json_response(&ModelsReply {
        models: model_catalogue(&state.config),
    })
}

/// `GET /api/tools`.
pub fn get_tools() -> Result<HttpResponse> {
    json_response(&ToolsReply {
        tools: tool_catalogue(),
    })
}

/// `POST /api/upload?filename=NAME`: accepts the raw body. Contents are
/// counted, not stored.
pub fn post_upload(state: &mut ServerState, url: &str, body: &[u8]) -> Result<HttpResponse> {
    let Some(filename) = query_param(url, "filename").filter(|f| !f.trim().is_empty()) else {
        return bad_request("No selected file");
    };

    let id = state.next_upload_id();
    info!(%filename, size = body.len(), "file uploaded");
    json_response(&UploadReceipt {
        success: true,
        filename,
        size: body.len() as u64,
        file_id: format!("upload-{id}"),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
