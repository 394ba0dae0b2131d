//! Full HTML document for a [`DashboardView`].
//!
//! The document is self-contained: styles and the small refresh script are
//! inlined, and icons degrade to empty `<i>` tags when Font Awesome is not
//! reachable.

use super::context::TOOL_OPTIONS;
use super::format::escape_html;
use super::{DashboardView, Modal, SUGGESTED_ACTIONS};

/// Render the whole dashboard.
pub fn render_page(view: &DashboardView) -> String {
    let mut html = String::with_capacity(16 * 1024);
    html.push_str(&format!(
        concat!(
            "<!DOCTYPE html>\n<html lang=\"en\" data-theme=\"{theme}\">\n<head>\n",
            "<meta charset=\"utf-8\">\n",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
            "<title>chatdash</title>\n<style>{css}</style>\n</head>\n<body>\n"
        ),
        theme = view.theme.as_str(),
        css = STYLESHEET,
    ));

    html.push_str(&header_html(view));
    html.push_str(r#"<div class="layout">"#);
    html.push_str(&sidebar_html(view));
    html.push_str(&chat_html(view));
    html.push_str(&view.visualization.render_html());
    html.push_str("</div>");

    html.push_str(&modal_html(
        view,
        Modal::Metrics,
        "System Metrics",
        &view.metrics.render_detail_html(),
    ));
    let config_body = view
        .config_form
        .as_ref()
        .map(|form| form.render_html())
        .unwrap_or_default();
    html.push_str(&modal_html(view, Modal::Config, "Configuration", &config_body));
    html.push_str(&modal_html(view, Modal::Settings, "Settings", &settings_html(view)));

    html.push_str(&view.toasts.render_html());
    html.push_str("<script>");
    html.push_str(SCRIPT);
    html.push_str("</script>\n</body>\n</html>\n");
    html
}

fn header_html(view: &DashboardView) -> String {
    format!(
        concat!(
            r#"<header><h1><span class="logo">chat</span>dash</h1>"#,
            r#"<div class="header-actions">"#,
            r#"<button id="toggle-sidebar" class="btn btn-transparent"><i class="fas fa-bars"></i></button>"#,
            r#"<button id="open-metrics" class="btn btn-transparent"><i class="fas fa-chart-line"></i></button>"#,
            r#"<button id="open-config" class="btn btn-transparent"><i class="fas fa-sliders-h"></i></button>"#,
            r#"<button id="open-settings" class="btn btn-transparent"><i class="fas fa-cog"></i></button>"#,
            r#"<button id="theme-toggle" class="btn btn-transparent"><i class="fas {icon}"></i></button>"#,
            r#"</div></header>"#
        ),
        icon = view.theme.toggle_icon(),
    )
}

fn sidebar_html(view: &DashboardView) -> String {
    let mut html = String::from(r#"<div class="sidebar">"#);
    html.push_str(&view.metrics.render_summary_html());

    html.push_str(&format!(
        r#"<div class="tools-dropdown{}"><button id="tools-button" class="btn">Tools</button><ul>"#,
        if view.tools_dropdown_open { " open" } else { "" }
    ));
    for (id, label, icon) in TOOL_OPTIONS {
        html.push_str(&format!(
            r#"<li class="tool-option" data-tool="{id}"><i class="fas {icon}"></i>{label}</li>"#
        ));
    }
    html.push_str("</ul></div>");

    html.push_str(&view.context.render_html());
    html.push_str("</div>");
    html
}

fn chat_html(view: &DashboardView) -> String {
    let mut html = String::from(r#"<main class="chat">"#);
    html.push_str(&view.conversation.render_html());

    html.push_str(r#"<div class="suggested-actions">"#);
    for (action, label) in SUGGESTED_ACTIONS {
        html.push_str(&format!(
            r#"<button class="suggested-action" data-action="{action}">{label}</button>"#
        ));
    }
    html.push_str("</div>");

    html.push_str(r#"<div class="input-row"><select id="model-select">"#);
    for model in &view.models {
        let selected = view.selected_model.as_deref() == Some(model.id.as_str());
        html.push_str(&format!(
            r#"<option value="{}"{}{}>{}</option>"#,
            escape_html(&model.id),
            if selected { " selected" } else { "" },
            if model.disabled { " disabled" } else { "" },
            escape_html(&model.name),
        ));
    }
    html.push_str(&format!(
        concat!(
            r#"</select><textarea id="user-input" rows="1" placeholder="Type a message">{}</textarea>"#,
            r#"<button id="send-button" class="btn"><i class="fas fa-paper-plane"></i></button></div>"#
        ),
        escape_html(&view.input),
    ));
    html.push_str("</main>");
    html
}

fn settings_html(view: &DashboardView) -> String {
    format!(
        concat!(
            r#"<form id="settings-form">"#,
            r#"<label>Theme <select name="theme">"#,
            r#"<option value="dark"{dark}>Dark</option><option value="light"{light}>Light</option>"#,
            r#"</select></label>"#,
            r#"<button type="submit" class="btn">Save</button></form>"#
        ),
        dark = if view.theme.as_str() == "dark" { " selected" } else { "" },
        light = if view.theme.as_str() == "light" { " selected" } else { "" },
    )
}

fn modal_html(view: &DashboardView, modal: Modal, title: &str, body: &str) -> String {
    format!(
        concat!(
            r#"<div id="{id}" class="modal{open}"><div class="modal-content">"#,
            r#"<div class="modal-header"><h2>{title}</h2>"#,
            r#"<button class="btn btn-transparent close-modal"><i class="fas fa-times"></i></button></div>"#,
            r#"<div class="modal-body">{body}</div></div></div>"#
        ),
        id = modal.id(),
        open = if view.is_open(modal) { " open" } else { "" },
        title = title,
        body = body,
    )
}

const STYLESHEET: &str = r#"
:root {
  --bg: #0d1117; --surface: #161b22; --border: #30363d;
  --text: #e6edf3; --text-muted: #8b949e; --accent: #58a6ff;
  --green: #3fb950; --yellow: #d29922; --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}
[data-theme="light"] {
  --bg: #ffffff; --surface: #f6f8fa; --border: #d0d7de;
  --text: #1f2328; --text-muted: #656d76; --accent: #0969da;
}
* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font-family: var(--font); font-size: 14px; line-height: 1.5; }
header { display: flex; justify-content: space-between; align-items: center; padding: 12px 24px; border-bottom: 1px solid var(--border); }
header h1 { font-size: 20px; font-weight: 600; }
header h1 .logo { color: var(--accent); font-family: var(--mono); }
.layout { display: flex; height: calc(100vh - 58px); }
.sidebar { width: 260px; padding: 16px; border-right: 1px solid var(--border); overflow-y: auto; }
.tools-sidebar.collapsed { display: none; }
.chat { flex: 1; display: flex; flex-direction: column; padding: 16px; }
.conversation { flex: 1; overflow-y: auto; }
.message { display: flex; justify-content: space-between; margin-bottom: 12px; padding: 10px 14px; border-radius: var(--radius); background: var(--surface); border: 1px solid var(--border); }
.message.user { border-color: var(--accent); }
.message.error { border-color: var(--red); color: var(--red); }
.message-sender { font-weight: 600; margin-right: 8px; }
.message-time { color: var(--text-muted); font-size: 12px; }
pre { background: var(--bg); padding: 8px; border-radius: 6px; font-family: var(--mono); overflow-x: auto; }
code { font-family: var(--mono); }
.typing-indicator span { display: inline-block; width: 6px; height: 6px; margin: 0 2px; border-radius: 50%; background: var(--text-muted); }
.input-row { display: flex; gap: 8px; margin-top: 12px; }
.input-row textarea { flex: 1; resize: none; padding: 8px; border-radius: 6px; border: 1px solid var(--border); background: var(--surface); color: var(--text); }
.btn { padding: 6px 12px; border: 1px solid var(--border); border-radius: 6px; background: var(--surface); color: var(--text); cursor: pointer; }
.btn-transparent { background: transparent; border: none; }
.btn-sm { padding: 2px 6px; }
.suggested-actions { display: flex; gap: 6px; flex-wrap: wrap; margin-top: 8px; }
.suggested-action { padding: 4px 10px; border-radius: 12px; border: 1px solid var(--border); background: transparent; color: var(--text-muted); cursor: pointer; }
.tools-dropdown ul { display: none; list-style: none; }
.tools-dropdown.open ul { display: block; }
.tool-option { padding: 4px 8px; cursor: pointer; }
.context-item { display: flex; align-items: center; gap: 6px; padding: 4px 8px; margin: 4px 0; border-radius: 12px; background: var(--surface); }
.system-stats { margin-bottom: 16px; }
.stat-row { display: flex; align-items: center; gap: 8px; margin: 4px 0; }
.stat-name { width: 40px; color: var(--text-muted); }
.stat-bar { flex: 1; height: 6px; background: var(--border); border-radius: 3px; }
.stat-fill { height: 100%; background: var(--green); border-radius: 3px; transition: width 0.3s; }
.stat-status { color: var(--yellow); font-size: 12px; }
.visualization-panel { width: 360px; border-left: 1px solid var(--border); padding: 16px; }
.hidden { display: none; }
.tab-btn.active { color: var(--accent); border-bottom: 2px solid var(--accent); }
.modal { display: none; position: fixed; inset: 0; background: rgba(0,0,0,0.6); }
.modal.open { display: flex; align-items: center; justify-content: center; }
.modal-content { background: var(--surface); border: 1px solid var(--border); border-radius: var(--radius); padding: 20px; min-width: 420px; max-height: 85vh; overflow-y: auto; }
.modal-header { display: flex; justify-content: space-between; margin-bottom: 12px; }
fieldset { border: 1px solid var(--border); border-radius: 6px; padding: 10px; margin-bottom: 10px; }
fieldset label { display: flex; justify-content: space-between; margin: 4px 0; }
polyline { stroke: var(--accent); stroke-width: 2; }
.toast-container { position: fixed; bottom: 24px; right: 24px; }
.toast { padding: 10px 16px; margin-top: 8px; border-radius: var(--radius); background: var(--surface); border: 1px solid var(--border); }
.toast.success { border-color: var(--green); }
.toast.error { border-color: var(--red); }
.toast.warning { border-color: var(--yellow); }
"#;

const SCRIPT: &str = r#"
async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  return res.json();
}

async function refreshStats() {
  try {
    const s = await api('GET', '/api/system/stats');
    for (const [id, pct] of [['cpu', s.cpu.percent], ['ram', s.memory.percent], ['disk', s.disk.percent]]) {
      const bar = document.getElementById(id + '-bar');
      const text = document.getElementById(id + '-text');
      if (bar) bar.style.width = pct + '%';
      if (text) text.textContent = pct.toFixed(1) + '%';
    }
  } catch (e) {
    console.error('Error fetching system stats:', e);
  }
}

function appendBlock(kind, sender, text) {
  const conversation = document.getElementById('conversation');
  if (!conversation) return null;
  const block = document.createElement('div');
  block.className = 'message ' + kind;
  const content = document.createElement('div');
  content.className = 'message-content';
  const header = document.createElement('div');
  header.className = 'message-header';
  const name = document.createElement('span');
  name.className = 'message-sender';
  name.textContent = sender;
  header.appendChild(name);
  const body = document.createElement('div');
  body.className = 'message-text';
  if (text === null) {
    body.innerHTML = '<div class="typing-indicator"><span></span><span></span><span></span></div>';
  } else {
    const p = document.createElement('p');
    p.textContent = text;
    body.appendChild(p);
  }
  content.appendChild(header);
  content.appendChild(body);
  block.appendChild(content);
  conversation.appendChild(block);
  conversation.scrollTop = conversation.scrollHeight;
  return block;
}

async function sendMessage() {
  const input = document.getElementById('user-input');
  if (!input) return;
  const message = input.value.trim();
  if (!message) return;
  input.value = '';
  const select = document.getElementById('model-select');
  const model = (select && select.value) || undefined;

  appendBlock('user', 'You', message);
  const pending = appendBlock('assistant thinking', 'Assistant', null);
  try {
    const reply = await api('POST', '/api/chat', { message, model });
    if (pending) pending.remove();
    if (reply.error) {
      appendBlock('assistant error', 'Error', 'Sorry, there was an error: ' + reply.error);
    } else {
      appendBlock('assistant', 'Assistant', reply.response);
    }
  } catch (e) {
    if (pending) pending.remove();
    appendBlock('assistant error', 'Error', 'Sorry, there was an error: ' + e);
  }
}

const sendButton = document.getElementById('send-button');
if (sendButton) sendButton.addEventListener('click', sendMessage);
const userInput = document.getElementById('user-input');
if (userInput) userInput.addEventListener('keydown', e => {
  if (e.key === 'Enter' && !e.shiftKey) { e.preventDefault(); sendMessage(); }
});
setInterval(refreshStats, 5000);
"#;
