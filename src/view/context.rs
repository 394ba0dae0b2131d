//! Tool sidebar, context chips and the visualization panel.

use super::format::escape_html;

/// Chip kind used for attached files. At most one exists at a time.
pub const FILE_UPLOAD: &str = "file-upload";

/// Tools that open the visualization panel when activated.
const PANEL_TOOLS: &[&str] = &["code-editor", "terminal", "debugger"];

/// Entries of the tools dropdown: `data-tool`, label and icon.
pub const TOOL_OPTIONS: &[(&str, &str, &str)] = &[
    ("web-search", "Web Search", "fa-globe"),
    ("file-upload", "File Upload", "fa-file-upload"),
    ("code-run", "Code Execution", "fa-code"),
    ("code-editor", "Code Editor", "fa-edit"),
    ("terminal", "Terminal", "fa-terminal"),
];

/// Tabs of the visualization panel, in display order.
pub const TABS: &[&str] = &["thinking", "code", "terminal"];

/// A removable tag for an active tool or attached file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextChip {
    pub kind: String,
    pub label: String,
    pub icon: &'static str,
}

impl ContextChip {
    pub fn for_tool(kind: &str) -> Self {
        let (icon, label) = match kind {
            "web-search" => ("fa-globe", "Web search active".to_string()),
            FILE_UPLOAD => ("fa-file-upload", "File upload ready".to_string()),
            "code-run" => ("fa-code", "Code execution environment".to_string()),
            other => ("fa-tools", tool_display_name(other)),
        };
        Self {
            kind: kind.to_string(),
            label,
            icon,
        }
    }

    pub fn for_file(name: &str) -> Self {
        Self {
            kind: FILE_UPLOAD.to_string(),
            label: format!("File: {name}"),
            icon: "fa-file",
        }
    }
}

/// `"code-run"` → `"Code run"`.
pub fn tool_display_name(kind: &str) -> String {
    let spaced = kind.replace('-', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether activating `tool` should reveal the visualization panel.
pub fn opens_panel(tool: &str) -> bool {
    PANEL_TOOLS.contains(&tool)
}

// ---------------------------------------------------------------------------
// Context panel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ContextPanel {
    collapsed: bool,
    chips: Vec<ContextChip>,
}

impl ContextPanel {
    pub fn toggle(&mut self) {
        self.collapsed = !self.collapsed;
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn add_tool(&mut self, kind: &str) {
        if kind == FILE_UPLOAD {
            self.chips.retain(|c| c.kind != FILE_UPLOAD);
        }
        self.chips.push(ContextChip::for_tool(kind));
    }

    /// Attach a file, replacing any previously attached one.
    pub fn attach_file(&mut self, name: &str) {
        self.chips.retain(|c| c.kind != FILE_UPLOAD);
        self.chips.push(ContextChip::for_file(name));
    }

    /// Remove the chip at `index`. Out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<ContextChip> {
        (index < self.chips.len()).then(|| self.chips.remove(index))
    }

    pub fn chips(&self) -> &[ContextChip] {
        &self.chips
    }

    pub fn render_html(&self) -> String {
        let mut html = format!(
            r#"<aside class="tools-sidebar{}"><div class="context-items">"#,
            if self.collapsed { " collapsed" } else { "" }
        );
        for (i, chip) in self.chips.iter().enumerate() {
            html.push_str(&format!(
                concat!(
                    r#"<div class="context-item" data-type="{kind}" data-index="{i}">"#,
                    r#"<i class="fas {icon}"></i><span>{label}</span>"#,
                    r#"<button class="btn btn-transparent btn-sm"><i class="fas fa-times"></i></button>"#,
                    r#"</div>"#
                ),
                kind = escape_html(&chip.kind),
                i = i,
                icon = chip.icon,
                label = escape_html(&chip.label),
            ));
        }
        html.push_str("</div></aside>");
        html
    }
}

// ---------------------------------------------------------------------------
// Visualization panel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct VisualizationPanel {
    visible: bool,
    active_tab: &'static str,
}

impl Default for VisualizationPanel {
    fn default() -> Self {
        Self {
            visible: false,
            active_tab: TABS[0],
        }
    }
}

impl VisualizationPanel {
    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Activate a tab by id. Unknown ids leave the panel as it was.
    pub fn switch_tab(&mut self, id: &str) -> bool {
        match TABS.iter().find(|t| **t == id) {
            Some(tab) => {
                self.active_tab = *tab;
                true
            }
            None => false,
        }
    }

    pub fn active_tab(&self) -> &'static str {
        self.active_tab
    }

    pub fn render_html(&self) -> String {
        let mut html = format!(
            r#"<section class="visualization-panel{}"><div class="tabs">"#,
            if self.visible { "" } else { " hidden" }
        );
        for tab in TABS {
            let active = if *tab == self.active_tab { " active" } else { "" };
            html.push_str(&format!(
                r#"<button class="tab-btn{active}" data-tab="{tab}">{}</button>"#,
                tool_display_name(tab)
            ));
        }
        html.push_str(
            r#"<button class="btn btn-transparent close-viz"><i class="fas fa-times"></i></button></div>"#,
        );
        for tab in TABS {
            let hidden = if *tab == self.active_tab { "" } else { " hidden" };
            html.push_str(&format!(
                r#"<div id="{tab}-tab" class="tab-content{hidden}"></div>"#
            ));
        }
        html.push_str("</section>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tools_get_descriptive_chips() {
        assert_eq!(ContextChip::for_tool("web-search").label, "Web search active");
        assert_eq!(ContextChip::for_tool("code-run").icon, "fa-code");
        let other = ContextChip::for_tool("code-editor");
        assert_eq!(other.label, "Code editor");
        assert_eq!(other.icon, "fa-tools");
    }

    #[test]
    fn display_name_replaces_every_dash() {
        assert_eq!(tool_display_name("remote-shell-session"), "Remote shell session");
        assert_eq!(tool_display_name(""), "");
    }

    #[test]
    fn attaching_a_file_replaces_the_previous_one() {
        let mut panel = ContextPanel::default();
        panel.add_tool("web-search");
        panel.attach_file("a.py");
        panel.attach_file("b.py");

        let labels: Vec<&str> = panel.chips().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Web search active", "File: b.py"]);
    }

    #[test]
    fn chips_keep_order_and_remove_by_index() {
        let mut panel = ContextPanel::default();
        panel.add_tool("web-search");
        panel.add_tool("code-run");
        panel.add_tool("terminal");

        let removed = panel.remove(1).unwrap();
        assert_eq!(removed.kind, "code-run");
        assert!(panel.remove(7).is_none());
        let kinds: Vec<&str> = panel.chips().iter().map(|c| c.kind.as_str()).collect();
        assert_eq!(kinds, vec!["web-search", "terminal"]);
    }

    #[test]
    fn unknown_tab_is_ignored() {
        let mut viz = VisualizationPanel::default();
        assert!(viz.switch_tab("code"));
        assert!(!viz.switch_tab("nope"));
        assert_eq!(viz.active_tab(), "code");
        assert!(viz.render_html().contains(r#"<button class="tab-btn active" data-tab="code">"#));
    }

    #[test]
    fn sidebar_toggle_sets_collapsed_class() {
        let mut panel = ContextPanel::default();
        panel.toggle();
        assert!(panel.render_html().contains("tools-sidebar collapsed"));
    }

    #[test]
    fn panel_renders_close_control_and_hides() {
        let mut viz = VisualizationPanel::default();
        viz.show();
        let html = viz.render_html();
        assert!(html.starts_with(r#"<section class="visualization-panel">"#));
        assert!(html.contains("close-viz"));

        viz.toggle();
        assert!(viz.render_html().starts_with(r#"<section class="visualization-panel hidden">"#));
    }
}
