/// End-to-end tests: the reference server on an ephemeral port, driven by
/// the `ureq` client and by a full `Dashboard`.
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value, json};

use chatdash::api::{ApiError, Backend, ChatRequest, HttpBackend};
use chatdash::config::{self, DashConfig};
use chatdash::dashboard::{Dashboard, UiEvent};
use chatdash::view::Modal;
use chatdash::view::theme::ThemeStore;
use chatdash::web::{self, ServerState};

fn start(state: ServerState) -> HttpBackend {
    let (addr, _handle) = web::spawn("127.0.0.1:0", state).unwrap();
    HttpBackend::new(&format!("http://{addr}"), Some(Duration::from_secs(10)))
}

fn start_default() -> HttpBackend {
    start(ServerState::new(DashConfig::default(), None))
}

fn request(message: &str) -> ChatRequest {
    ChatRequest {
        message: message.to_string(),
        model: None,
    }
}

// ---------------------------------------------------------------------------
// Client against server
// ---------------------------------------------------------------------------

#[test]
fn chat_echoes_message_and_model() {
    let client = start_default();
    let reply = client.chat(&request("hello")).unwrap();
    assert!(reply.contains("gpt-4o"));
    assert!(reply.contains("'hello'"));

    let reply = client
        .chat(&ChatRequest {
            message: "hi".into(),
            model: Some("llama-3".into()),
        })
        .unwrap();
    assert!(reply.contains("llama-3"));
}

#[test]
fn blank_chat_message_is_a_400() {
    let client = start_default();
    match client.chat(&request("   ")) {
        Err(ApiError::Status { code, message }) => {
            assert_eq!(code, 400);
            assert_eq!(message, "Message is required");
        }
        other => panic!("expected a 400, got {other:?}"),
    }
}

#[test]
fn stats_are_percentages() {
    let client = start_default();
    let stats = client.system_stats().unwrap();
    for percent in [stats.cpu.percent, stats.memory.percent, stats.disk.percent] {
        assert!((0.0..=100.0).contains(&percent), "{percent} out of range");
    }
    assert!(stats.cpu.cores >= 1);
    assert!(stats.memory.total > 0);
}

#[test]
fn config_round_trip_merges_over_stored_values() {
    let client = start_default();
    let mut doc = client.load_config().unwrap();
    assert_eq!(doc["system"]["max_tokens"], 8192);

    doc.insert("system".to_string(), json!({ "max_tokens": 1024 }));
    client.save_config(&doc).unwrap();

    let reloaded = client.load_config().unwrap();
    assert_eq!(reloaded["system"]["max_tokens"], 1024);
    // Keys absent from the posted section keep their stored values.
    assert_eq!(reloaded["system"]["concurrent_requests"], 2);
}

#[test]
fn invalid_config_is_rejected_and_not_applied() {
    let client = start_default();
    let mut doc = Map::new();
    doc.insert("server".to_string(), json!({ "port": "eighty" }));

    match client.save_config(&doc) {
        Err(ApiError::Status { code, .. }) => assert_eq!(code, 400),
        other => panic!("expected a 400, got {other:?}"),
    }
    assert_eq!(client.load_config().unwrap()["server"]["port"], 5000);
}

#[test]
fn saved_config_is_persisted_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let client = start(ServerState::new(DashConfig::default(), Some(path.clone())));

    let mut doc = Map::new();
    doc.insert("ui".to_string(), json!({ "chart_window": 30 }));
    client.save_config(&doc).unwrap();

    let on_disk = config::load_file(&path).unwrap();
    assert_eq!(on_disk.ui.chart_window, 30);
}

#[test]
fn unwritable_config_path_is_a_500() {
    let dir = tempfile::tempdir().unwrap();
    // A directory cannot be written as a file.
    let client = start(ServerState::new(
        DashConfig::default(),
        Some(dir.path().to_path_buf()),
    ));

    let mut doc = Map::new();
    doc.insert("system".to_string(), json!({ "retries": 9 }));
    match client.save_config(&doc) {
        Err(ApiError::Status { code, .. }) => assert_eq!(code, 500),
        other => panic!("expected a 500, got {other:?}"),
    }
    assert_eq!(client.load_config().unwrap()["system"]["retries"], 3);
}

#[test]
fn settings_update_is_acknowledged() {
    let client = start_default();
    let mut settings = Map::new();
    settings.insert("temperature".to_string(), Value::from(0.2));
    client.update_settings(&settings).unwrap();
}

#[test]
fn catalogues_are_served() {
    let client = start_default();

    let models = client.models().unwrap();
    let ids: Vec<_> = models.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids[..4], ["gpt-4o", "claude-3-opus", "claude-3-sonnet", "llama-3"]);

    let tools = client.tools().unwrap();
    assert!(tools.iter().any(|t| t.id == "terminal"));
}

#[test]
fn upload_returns_receipt() {
    let client = start_default();
    let receipt = client.upload("notes & ideas.txt", b"hello world").unwrap();
    assert!(receipt.success);
    assert_eq!(receipt.filename, "notes & ideas.txt");
    assert_eq!(receipt.size, 11);
    assert_eq!(receipt.file_id, "upload-1");

    let second = client.upload("b.txt", b"").unwrap();
    assert_eq!(second.file_id, "upload-2");
}

// ---------------------------------------------------------------------------
// Dashboard against server
// ---------------------------------------------------------------------------

fn dashboard(client: HttpBackend) -> Dashboard<HttpBackend> {
    Dashboard::new(
        Arc::new(client),
        &DashConfig::default(),
        ThemeStore::ephemeral(),
    )
}

#[test]
fn dashboard_chats_and_polls_over_http() {
    let mut dash = dashboard(start_default());
    let now = Instant::now();
    dash.mount(now);

    assert!(dash.send("hello"));
    let last = dash.view().conversation.messages().last().unwrap();
    assert!(last.1.contains("simulated reply"));

    assert!(dash.poll(now));
    assert!(dash.view().metrics.last.is_some());
    assert!(dash.view().metrics.status.is_none());

    dash.unmount();
}

#[test]
fn dashboard_edits_config_over_http() {
    let client = start_default();
    let mut dash = dashboard(client.clone());

    assert!(dash.handle(&UiEvent::click("#open-config")));
    assert!(dash.view().is_open(Modal::Config));
    dash.set_config_field("system.max_tokens", "2048").unwrap();
    assert!(dash.save_config());
    assert!(!dash.view().is_open(Modal::Config));

    assert_eq!(client.load_config().unwrap()["system"]["max_tokens"], 2048);
}

#[test]
fn dashboard_loads_models_over_http() {
    let mut dash = dashboard(start_default());
    assert!(dash.load_models());
    assert_eq!(dash.view().models.len(), 4);
    assert_eq!(dash.view().selected_model.as_deref(), Some("gpt-4o"));
}

#[test]
fn server_page_contains_dashboard_controls() {
    let client = start_default();
    let body = ureq::get(&format!("{}/", client.base_url()))
        .call()
        .unwrap()
        .into_string()
        .unwrap();
    for id in ["#send-button", "#model-select", "#config-modal"] {
        let attr = format!("id=\"{}\"", &id[1..]);
        assert!(body.contains(&attr), "page is missing {id}");
    }
}

#[test]
fn page_keeps_chat_history_across_loads() {
    let client = start_default();
    let reply = client.chat(&request("hello from the page")).unwrap();

    let body = ureq::get(&format!("{}/", client.base_url()))
        .call()
        .unwrap()
        .into_string()
        .unwrap();
    assert!(body.contains("hello from the page"));
    // The page escapes the quotes around the echoed message.
    assert!(body.contains(&reply.replace('\'', "&#39;")));
}
