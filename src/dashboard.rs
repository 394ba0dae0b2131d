//! The dashboard lifecycle object.
//!
//! [`Dashboard`] owns the view tree, the metrics poller and the theme store,
//! and is the only thing that mutates them. UI events arrive through
//! [`Dashboard::handle`], which looks the event up in [`BINDINGS`]; network
//! calls go through the [`Backend`] seam and every failure ends up as a
//! toast, a conversation error or a status line, never as a panic.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::api::{ApiError, Backend, ChatRequest, SystemStats};
use crate::config::schema::DashConfig;
use crate::poller::{MetricsPoller, PollWorker, TickTicket};
use crate::view::config_form::{ConfigForm, FormError};
use crate::view::context::{self, FILE_UPLOAD};
use crate::view::conversation::Role;
use crate::view::page;
use crate::view::theme::{Theme, ThemeStore};
use crate::view::toast::ToastKind;
use crate::view::{DashboardView, Modal, suggested_prompt};

/// Text the web-search tool leaves in the message box.
pub const WEB_SEARCH_PROMPT: &str = "Search the web for: ";

// ---------------------------------------------------------------------------
// Event bindings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Click,
    Submit,
    Change,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SendMessage,
    ToggleTheme,
    ToggleSidebar,
    ToggleToolsDropdown,
    ToggleVisualization,
    /// `data-tool` of the clicked option.
    ActivateTool,
    /// `data-action` of the clicked suggestion.
    SuggestedAction,
    /// `data-index` of the chip.
    RemoveContextItem,
    /// `data-tab` of the tab button.
    SwitchTab,
    OpenMetrics,
    OpenConfig,
    OpenSettings,
    /// Modal id, or every modal when absent.
    CloseModal,
    SaveConfig,
    /// Selected theme value.
    SaveSettings,
    SelectModel,
}

#[derive(Debug, Clone, Copy)]
pub struct Binding {
    pub selector: &'static str,
    pub event: EventKind,
    pub action: Action,
}

const fn bind(selector: &'static str, event: EventKind, action: Action) -> Binding {
    Binding {
        selector,
        event,
        action,
    }
}

/// Every wired control of the page.
pub const BINDINGS: &[Binding] = &[
    bind("#send-button", EventKind::Click, Action::SendMessage),
    bind("#theme-toggle", EventKind::Click, Action::ToggleTheme),
    bind("#toggle-sidebar", EventKind::Click, Action::ToggleSidebar),
    bind("#tools-button", EventKind::Click, Action::ToggleToolsDropdown),
    bind(".close-viz", EventKind::Click, Action::ToggleVisualization),
    bind(".tool-option", EventKind::Click, Action::ActivateTool),
    bind(".suggested-action", EventKind::Click, Action::SuggestedAction),
    bind(".context-item button", EventKind::Click, Action::RemoveContextItem),
    bind(".tab-btn", EventKind::Click, Action::SwitchTab),
    bind("#open-metrics", EventKind::Click, Action::OpenMetrics),
    bind("#open-config", EventKind::Click, Action::OpenConfig),
    bind("#open-settings", EventKind::Click, Action::OpenSettings),
    bind(".close-modal", EventKind::Click, Action::CloseModal),
    bind("#config-form", EventKind::Submit, Action::SaveConfig),
    bind("#settings-form", EventKind::Submit, Action::SaveSettings),
    bind("#model-select", EventKind::Change, Action::SelectModel),
];

/// Look up the action bound to `selector` for `event`.
pub fn binding_for(selector: &str, event: EventKind) -> Option<Action> {
    BINDINGS
        .iter()
        .find(|b| b.selector == selector && b.event == event)
        .map(|b| b.action)
}

/// A UI event as delivered by the page: the bound selector, the event kind
/// and the data attribute or value that came with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiEvent {
    pub selector: String,
    pub kind: EventKind,
    pub data: Option<String>,
}

impl UiEvent {
    pub fn click(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            kind: EventKind::Click,
            data: None,
        }
    }

    pub fn submit(selector: &str) -> Self {
        Self {
            kind: EventKind::Submit,
            ..Self::click(selector)
        }
    }

    pub fn change(selector: &str, value: &str) -> Self {
        Self {
            kind: EventKind::Change,
            ..Self::click(selector).with_data(value)
        }
    }

    pub fn with_data(mut self, data: &str) -> Self {
        self.data = Some(data.to_string());
        self
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub struct Dashboard<B> {
    backend: Arc<B>,
    view: DashboardView,
    poller: MetricsPoller,
    worker: Option<PollWorker<B>>,
    theme_store: ThemeStore,
    mounted: bool,
}

impl<B: Backend> Dashboard<B> {
    pub fn new(backend: Arc<B>, config: &DashConfig, theme_store: ThemeStore) -> Self {
        Self {
            backend,
            view: DashboardView::welcome(&config.ui),
            poller: MetricsPoller::from_config(&config.client),
            worker: None,
            theme_store,
            mounted: false,
        }
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut DashboardView {
        &mut self.view
    }

    pub fn poller(&self) -> &MetricsPoller {
        &self.poller
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// The current view as a full HTML document.
    pub fn render_page(&self) -> String {
        page::render_page(&self.view)
    }

    // -- Lifecycle ----------------------------------------------------------

    /// Apply the persisted theme and start the metrics poller. Mounting an
    /// already mounted dashboard does nothing.
    pub fn mount(&mut self, now: Instant) {
        if self.mounted {
            return;
        }
        if let Some(theme) = self.theme_store.load() {
            self.view.theme = theme;
        }
        self.poller.mount(now);
        self.mounted = true;
        info!(theme = %self.view.theme, "dashboard mounted");
    }

    /// Stop polling and drop the charts. Completions still in flight are
    /// discarded when they arrive.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.poller.unmount();
        self.view.metrics.close_charts();
        self.view.close_modal(Modal::Metrics);
        self.mounted = false;
        info!("dashboard unmounted");
    }

    // -- Events -------------------------------------------------------------

    /// Dispatch a UI event. Returns false for unbound events.
    pub fn handle(&mut self, event: &UiEvent) -> bool {
        let Some(action) = binding_for(&event.selector, event.kind) else {
            debug!(selector = %event.selector, "unbound event");
            return false;
        };
        let data = event.data.as_deref();
        let now = Instant::now();

        match action {
            Action::SendMessage => {
                self.submit_message();
            }
            Action::ToggleTheme => {
                self.toggle_theme();
            }
            Action::ToggleSidebar => self.view.context.toggle(),
            Action::ToggleToolsDropdown => {
                self.view.tools_dropdown_open = !self.view.tools_dropdown_open;
            }
            Action::ToggleVisualization => self.view.visualization.toggle(),
            Action::ActivateTool => {
                if let Some(tool) = data {
                    self.activate_tool(tool);
                }
            }
            Action::SuggestedAction => {
                if let Some(action) = data {
                    self.suggested_action(action);
                }
            }
            Action::RemoveContextItem => {
                if let Some(index) = data.and_then(|d| d.parse().ok()) {
                    self.remove_context_item(index);
                }
            }
            Action::SwitchTab => {
                if let Some(tab) = data {
                    self.view.visualization.switch_tab(tab);
                }
            }
            Action::OpenMetrics => self.open_metrics_detail(now),
            Action::OpenConfig => {
                self.open_config_editor();
            }
            Action::OpenSettings => self.view.open_modal(Modal::Settings),
            Action::CloseModal => match data.and_then(modal_by_id) {
                Some(modal) => self.close_modal(modal, now),
                None => self.close_all_modals(now),
            },
            Action::SaveConfig => {
                self.save_config();
            }
            Action::SaveSettings => {
                if let Some(theme) = data.and_then(Theme::parse) {
                    self.save_settings(theme);
                }
            }
            Action::SelectModel => {
                if let Some(id) = data {
                    self.view.select_model(id);
                }
            }
        }
        true
    }

    /// Keydown in the message box. Enter without Shift sends.
    pub fn on_input_key(&mut self, key: &str, shift: bool) -> bool {
        if key == "Enter" && !shift {
            self.submit_message()
        } else {
            false
        }
    }

    // -- Chat ---------------------------------------------------------------

    /// Move the draft into the conversation and show the pending indicator.
    /// Returns the request to send, or `None` for a blank draft.
    pub fn begin_submit(&mut self) -> Option<ChatRequest> {
        let message = self.view.input.trim().to_string();
        if message.is_empty() {
            return None;
        }
        self.view.input.clear();
        self.view.conversation.append_message(Role::User, &message);
        self.view.conversation.show_pending_indicator();
        Some(ChatRequest {
            message,
            model: self.view.selected_model.clone(),
        })
    }

    /// Settle a submission. The pending indicator is always removed.
    pub fn finish_submit(&mut self, result: Result<String, ApiError>) {
        self.view.conversation.clear_pending_indicator();
        match result {
            Ok(reply) => self.view.conversation.append_message(Role::Assistant, &reply),
            Err(e) => {
                warn!(error = %e, "chat request failed");
                self.view
                    .conversation
                    .append_error(&format!("Sorry, there was an error: {e}"));
                self.view
                    .toasts
                    .push(ToastKind::Error, "Failed to get a response");
            }
        }
    }

    /// Submit the draft and wait for the reply.
    pub fn submit_message(&mut self) -> bool {
        let Some(request) = self.begin_submit() else {
            return false;
        };
        let result = self.backend.chat(&request);
        self.finish_submit(result);
        true
    }

    /// Replace the draft with `text` and submit it.
    pub fn send(&mut self, text: &str) -> bool {
        self.view.input = text.to_string();
        self.submit_message()
    }

    // -- Metrics ------------------------------------------------------------

    pub fn open_metrics_detail(&mut self, now: Instant) {
        self.view.open_modal(Modal::Metrics);
        if self.view.metrics.charts().is_none() {
            self.view.metrics.open_charts(self.view.chart_window);
        }
        self.poller.open_detail(now);
    }

    pub fn close_metrics_detail(&mut self, now: Instant) {
        self.view.close_modal(Modal::Metrics);
        self.view.metrics.close_charts();
        self.poller.close_detail(now);
    }

    /// Run the poll due at `now` on the calling thread.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(ticket) = self.poller.due(now) else {
            return false;
        };
        let result = self.backend.system_stats();
        self.apply_stats(ticket, result)
    }

    /// Apply one stats completion. Stale tickets are dropped silently.
    pub fn apply_stats(&mut self, ticket: TickTicket, result: Result<SystemStats, ApiError>) -> bool {
        if !self.poller.is_current(&ticket) {
            debug!(epoch = ticket.epoch, "discarding stale stats completion");
            return false;
        }
        match result {
            Ok(stats) => self.view.metrics.apply(&stats),
            Err(e) => {
                warn!(error = %e, "failed to fetch system stats");
                self.view.metrics.record_failure(&e.to_string());
            }
        }
        true
    }

    // -- Configuration editor ----------------------------------------------

    /// Fetch the configuration and open the editor. On failure the current
    /// form, if any, is left as it was.
    pub fn open_config_editor(&mut self) -> bool {
        match self.backend.load_config() {
            Ok(doc) => {
                self.view.config_form = Some(ConfigForm::render(&doc));
                self.view.open_modal(Modal::Config);
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to load configuration");
                self.view
                    .toasts
                    .push(ToastKind::Error, format!("Failed to load configuration: {e}"));
                false
            }
        }
    }

    /// Edit one control of the open editor.
    pub fn set_config_field(&mut self, name: &str, raw: &str) -> Result<(), FormError> {
        let Some(form) = self.view.config_form.as_mut() else {
            return Err(FormError::UnknownField(name.to_string()));
        };
        form.set(name, raw)
    }

    /// Submit the editor. Success closes it; failure keeps it open and
    /// populated.
    pub fn save_config(&mut self) -> bool {
        let Some(form) = &self.view.config_form else {
            return false;
        };
        let document = form.to_document();
        match self.backend.save_config(&document) {
            Ok(()) => {
                self.view.config_form = None;
                self.view.close_modal(Modal::Config);
                self.view
                    .toasts
                    .push(ToastKind::Success, "Configuration saved successfully");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to save configuration");
                self.view
                    .toasts
                    .push(ToastKind::Error, format!("Failed to save configuration: {e}"));
                false
            }
        }
    }

    // -- Tools and context ---------------------------------------------------

    pub fn activate_tool(&mut self, tool: &str) {
        self.view.tools_dropdown_open = false;
        if context::opens_panel(tool) {
            self.view.visualization.show();
        }
        self.view.context.add_tool(tool);

        match tool {
            "web-search" => self.view.input = WEB_SEARCH_PROMPT.to_string(),
            "code-run" => {
                self.view.visualization.show();
                self.view.visualization.switch_tab("code");
            }
            _ => {}
        }

        self.view.toasts.push(
            ToastKind::Success,
            format!("{} tool activated", context::tool_display_name(tool)),
        );
    }

    pub fn suggested_action(&mut self, action: &str) {
        self.view.input = suggested_prompt(action);
    }

    /// Upload a file and show it as the attached-file chip.
    pub fn attach_file(&mut self, filename: &str, bytes: &[u8]) -> bool {
        match self.backend.upload(filename, bytes) {
            Ok(receipt) => {
                self.view.context.attach_file(&receipt.filename);
                self.view.toasts.push(
                    ToastKind::Success,
                    format!("File \"{}\" uploaded", receipt.filename),
                );
                true
            }
            Err(e) => {
                warn!(error = %e, filename, "upload failed");
                self.view
                    .toasts
                    .push(ToastKind::Error, format!("Failed to upload {filename}: {e}"));
                false
            }
        }
    }

    pub fn remove_context_item(&mut self, index: usize) -> bool {
        self.view.context.remove(index).is_some()
    }

    /// Whether a file is currently attached.
    pub fn has_attachment(&self) -> bool {
        self.view
            .context
            .chips()
            .iter()
            .any(|c| c.kind == FILE_UPLOAD && c.label.starts_with("File: "))
    }

    // -- Theme, models and settings ------------------------------------------

    /// Flip the theme and persist it. A failed write is logged and the
    /// in-memory theme still changes.
    pub fn toggle_theme(&mut self) -> Theme {
        self.set_theme(self.view.theme.toggled());
        self.view.theme
    }

    fn set_theme(&mut self, theme: Theme) {
        self.view.theme = theme;
        if let Err(e) = self.theme_store.save(theme) {
            warn!(error = %e, "failed to persist theme");
        }
    }

    /// Fetch the model list. Keeps the current selection when it is still
    /// selectable, otherwise picks the first enabled model.
    pub fn load_models(&mut self) -> bool {
        match self.backend.models() {
            Ok(models) => {
                self.view.models = models;
                let keep = self
                    .view
                    .selected_model
                    .clone()
                    .is_some_and(|id| self.view.select_model(&id));
                if !keep {
                    self.view.selected_model = self
                        .view
                        .models
                        .iter()
                        .find(|m| !m.disabled)
                        .map(|m| m.id.clone());
                }
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to load models");
                self.view
                    .toasts
                    .push(ToastKind::Warning, format!("Could not load models: {e}"));
                false
            }
        }
    }

    pub fn update_settings(&mut self, settings: &Map<String, Value>) -> bool {
        match self.backend.update_settings(settings) {
            Ok(()) => {
                self.view
                    .toasts
                    .push(ToastKind::Success, "Settings saved successfully");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to update settings");
                self.view
                    .toasts
                    .push(ToastKind::Error, format!("Failed to save settings: {e}"));
                false
            }
        }
    }

    /// Submit the settings modal.
    pub fn save_settings(&mut self, theme: Theme) -> bool {
        self.set_theme(theme);
        let mut settings = Map::new();
        settings.insert("theme".to_string(), Value::String(theme.as_str().to_string()));
        let saved = self.update_settings(&settings);
        if saved {
            self.view.close_modal(Modal::Settings);
        }
        saved
    }

    // -- Modals -------------------------------------------------------------

    pub fn close_modal(&mut self, modal: Modal, now: Instant) {
        match modal {
            Modal::Metrics => self.close_metrics_detail(now),
            other => {
                self.view.close_modal(other);
            }
        }
    }

    pub fn close_all_modals(&mut self, now: Instant) {
        for modal in self.view.close_all_modals() {
            if modal == Modal::Metrics {
                self.close_metrics_detail(now);
            }
        }
    }
}

impl<B> Dashboard<B>
where
    B: Backend + Send + Sync + 'static,
{
    /// Run future stats fetches on worker threads.
    pub fn enable_background_polling(&mut self) {
        if self.worker.is_none() {
            self.worker = Some(PollWorker::new(Arc::clone(&self.backend)));
        }
    }

    /// Periodic housekeeping: expire toasts and start the poll due at
    /// `now`, if any.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.view.toasts.expire(now);
        self.dispatch_due(now)
    }

    /// Hand the poll due at `now` to the worker. Falls back to an inline
    /// poll when background polling is off.
    pub fn dispatch_due(&mut self, now: Instant) -> bool {
        let Some(worker) = &self.worker else {
            return self.poll(now);
        };
        match self.poller.due(now) {
            Some(ticket) => {
                worker.dispatch(ticket);
                true
            }
            None => false,
        }
    }

    /// Apply every completion that has arrived. Returns how many were
    /// applied.
    pub fn drain_completions(&mut self) -> usize {
        let completions = match &self.worker {
            Some(worker) => worker.try_completions(),
            None => return 0,
        };
        completions
            .into_iter()
            .filter(|c| self.apply_stats(c.ticket, c.result.clone()))
            .count()
    }

    /// Wait up to `timeout` for one completion and apply it.
    pub fn wait_for_stats(&mut self, timeout: Duration) -> bool {
        let completion = match &self.worker {
            Some(worker) => worker.wait_completion(timeout),
            None => return false,
        };
        match completion {
            Some(c) => self.apply_stats(c.ticket, c.result),
            None => false,
        }
    }
}

fn modal_by_id(id: &str) -> Option<Modal> {
    [Modal::Settings, Modal::Metrics, Modal::Config]
        .into_iter()
        .find(|m| m.id() == id)
}
