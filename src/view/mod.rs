//! Headless presentation layer of the dashboard.
//!
//! Each facet keeps its own state and renders its own HTML fragment;
//! [`DashboardView`] groups them into the single view tree the
//! [`Dashboard`](crate::dashboard::Dashboard) mutates and
//! [`page::render_page`] turns into a document.

pub mod config_form;
pub mod context;
pub mod conversation;
pub mod format;
pub mod metrics;
pub mod page;
pub mod theme;
pub mod toast;

use crate::api::ModelInfo;
use crate::config::schema::UiConfig;

use config_form::ConfigForm;
use context::{ContextPanel, VisualizationPanel};
use conversation::{Conversation, Role};
use metrics::MetricsView;
use theme::Theme;
use toast::ToastQueue;

pub const WELCOME_MESSAGE: &str = "Hello! Ask me anything, or pick a tool from the sidebar to get started.";

/// Suggested-action buttons under the conversation: `data-action` and label.
pub const SUGGESTED_ACTIONS: &[(&str, &str)] = &[
    ("web-search", "Search the web"),
    ("file-analysis", "Analyze a file"),
    ("coding", "Write code"),
    ("brainstorm", "Brainstorm"),
];

/// Canned prompt a suggested action puts into the message box.
pub fn suggested_prompt(action: &str) -> String {
    match action {
        "web-search" => "Search the web for information about this dashboard's capabilities".to_string(),
        "file-analysis" => "Can you help me analyze a Python file?".to_string(),
        "coding" => "Help me write a script to automate browser tasks".to_string(),
        "brainstorm" => "Let's brainstorm ideas for using AI agents in my workflow".to_string(),
        other => format!("I want to try the {other} feature"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    Settings,
    /// System metrics detail view.
    Metrics,
    /// Configuration editor.
    Config,
}

impl Modal {
    pub fn id(self) -> &'static str {
        match self {
            Self::Settings => "settings-modal",
            Self::Metrics => "metrics-modal",
            Self::Config => "config-modal",
        }
    }
}

/// The whole view tree.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub theme: Theme,
    pub conversation: Conversation,
    pub context: ContextPanel,
    pub visualization: VisualizationPanel,
    pub metrics: MetricsView,
    pub toasts: ToastQueue,
    /// Present while the configuration editor holds a loaded document.
    pub config_form: Option<ConfigForm>,
    pub models: Vec<ModelInfo>,
    pub selected_model: Option<String>,
    /// Draft in the message box.
    pub input: String,
    pub tools_dropdown_open: bool,
    /// Samples per live chart.
    pub chart_window: usize,
    open_modals: Vec<Modal>,
}

impl DashboardView {
    pub fn new(ui: &UiConfig) -> Self {
        Self {
            theme: ui.theme,
            conversation: Conversation::new(ui.show_timestamps),
            context: ContextPanel::default(),
            visualization: VisualizationPanel::default(),
            metrics: MetricsView::default(),
            toasts: ToastQueue::default(),
            config_form: None,
            models: Vec::new(),
            selected_model: None,
            input: String::new(),
            tools_dropdown_open: false,
            chart_window: ui.chart_window,
            open_modals: Vec::new(),
        }
    }

    /// A fresh view greeting the user.
    pub fn welcome(ui: &UiConfig) -> Self {
        let mut view = Self::new(ui);
        view.conversation
            .append_message(Role::Assistant, WELCOME_MESSAGE);
        view
    }

    pub fn open_modal(&mut self, modal: Modal) {
        if !self.open_modals.contains(&modal) {
            self.open_modals.push(modal);
        }
    }

    pub fn close_modal(&mut self, modal: Modal) -> bool {
        let before = self.open_modals.len();
        self.open_modals.retain(|m| *m != modal);
        before != self.open_modals.len()
    }

    /// Close every open modal, returning which ones were open.
    pub fn close_all_modals(&mut self) -> Vec<Modal> {
        std::mem::take(&mut self.open_modals)
    }

    pub fn is_open(&self, modal: Modal) -> bool {
        self.open_modals.contains(&modal)
    }

    pub fn open_modals(&self) -> &[Modal] {
        &self.open_modals
    }

    /// Select a listed, enabled model.
    pub fn select_model(&mut self, id: &str) -> bool {
        let selectable = self.models.iter().any(|m| m.id == id && !m.disabled);
        if selectable {
            self.selected_model = Some(id.to_string());
        }
        selectable
    }
}
