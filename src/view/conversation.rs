//! The scrollable conversation view.
//!
//! Holds rendered message blocks in display order plus at most one pending
//! indicator. Heights are measured in rendered lines; the viewport keeps a
//! scroll offset that appends pin to the end.

use serde::Serialize;

use super::format::{escape_html, format_message};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn sender(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Assistant",
        }
    }

    fn css_class(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Per-message buttons, as icon classes.
    fn controls(self) -> &'static [&'static str] {
        match self {
            Self::User => &["fa-edit", "fa-ellipsis-v"],
            Self::Assistant => &["fa-copy", "fa-thumbs-up", "fa-thumbs-down", "fa-ellipsis-v"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Message(Role),
    /// A failed request, rendered in the assistant's column.
    Error,
    Pending,
}

/// One rendered entry of the conversation.
#[derive(Debug, Clone)]
pub struct MessageBlock {
    pub kind: BlockKind,
    /// Source text as submitted or received.
    pub text: String,
    pub time: String,
    pub html: String,
    pub height: usize,
}

/// Header row plus spacing around every block.
const BLOCK_CHROME_LINES: usize = 2;

#[derive(Debug, Clone)]
pub struct Conversation {
    blocks: Vec<MessageBlock>,
    scroll_offset: usize,
    show_timestamps: bool,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Conversation {
    pub fn new(show_timestamps: bool) -> Self {
        Self {
            blocks: Vec::new(),
            scroll_offset: 0,
            show_timestamps,
        }
    }

    /// Render and append a message, then scroll to the end.
    pub fn append_message(&mut self, role: Role, text: &str) {
        let time = current_time();
        let html = self.message_html(role, text, &time);
        self.blocks.push(MessageBlock {
            kind: BlockKind::Message(role),
            text: text.to_string(),
            time,
            height: text_height(text),
            html,
        });
        self.scroll_to_end();
    }

    /// Append a visible error entry.
    pub fn append_error(&mut self, text: &str) {
        let time = current_time();
        let html = format!(
            concat!(
                r#"<div class="message assistant error">"#,
                r#"<div class="message-content">"#,
                r#"<div class="message-header"><span class="message-sender">Error</span>{time}</div>"#,
                r#"<div class="message-text"><p><i class="fas fa-exclamation-circle"></i> {body}</p></div>"#,
                r#"</div></div>"#
            ),
            time = self.time_html(&time),
            body = escape_html(text),
        );
        self.blocks.push(MessageBlock {
            kind: BlockKind::Error,
            text: text.to_string(),
            time,
            height: text_height(text),
            html,
        });
        self.scroll_to_end();
    }

    /// Add the pending indicator unless one is already showing.
    pub fn show_pending_indicator(&mut self) {
        if self.has_pending_indicator() {
            return;
        }
        self.blocks.push(MessageBlock {
            kind: BlockKind::Pending,
            text: String::new(),
            time: "Now".to_string(),
            html: concat!(
                r#"<div class="message assistant thinking">"#,
                r#"<div class="message-content">"#,
                r#"<div class="message-header"><span class="message-sender">Assistant</span><span class="message-time">Now</span></div>"#,
                r#"<div class="message-text"><div class="typing-indicator"><span></span><span></span><span></span></div></div>"#,
                r#"</div></div>"#
            )
            .to_string(),
            height: BLOCK_CHROME_LINES,
        });
        self.scroll_to_end();
    }

    /// Remove the pending indicator. No-op when none is showing.
    pub fn clear_pending_indicator(&mut self) {
        self.blocks.retain(|b| b.kind != BlockKind::Pending);
        self.scroll_offset = self.scroll_offset.min(self.content_height());
    }

    pub fn has_pending_indicator(&self) -> bool {
        self.blocks.iter().any(|b| b.kind == BlockKind::Pending)
    }

    pub fn scroll_to_end(&mut self) {
        self.scroll_offset = self.content_height();
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn content_height(&self) -> usize {
        self.blocks.iter().map(|b| b.height).sum()
    }

    pub fn blocks(&self) -> &[MessageBlock] {
        &self.blocks
    }

    /// Message blocks only (no pending indicator or errors).
    pub fn messages(&self) -> impl Iterator<Item = (Role, &str)> {
        self.blocks.iter().filter_map(|b| match b.kind {
            BlockKind::Message(role) => Some((role, b.text.as_str())),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The `#conversation` container with every block.
    pub fn render_html(&self) -> String {
        let mut html = String::from(r#"<div id="conversation" class="conversation">"#);
        for block in &self.blocks {
            html.push_str(&block.html);
        }
        html.push_str("</div>");
        html
    }

    fn message_html(&self, role: Role, text: &str, time: &str) -> String {
        let controls: String = role
            .controls()
            .iter()
            .map(|icon| {
                format!(r#"<button class="btn btn-transparent btn-sm"><i class="fas {icon}"></i></button>"#)
            })
            .collect();

        format!(
            concat!(
                r#"<div class="message {class}">"#,
                r#"<div class="message-content">"#,
                r#"<div class="message-header"><span class="message-sender">{sender}</span>{time}</div>"#,
                r#"<div class="message-text"><p>{body}</p></div>"#,
                r#"</div>"#,
                r#"<div class="message-controls">{controls}</div>"#,
                r#"</div>"#
            ),
            class = role.css_class(),
            sender = role.sender(),
            time = self.time_html(time),
            body = format_message(text),
            controls = controls,
        )
    }

    fn time_html(&self, time: &str) -> String {
        if self.show_timestamps {
            format!(r#"<span class="message-time">{time}</span>"#)
        } else {
            String::new()
        }
    }
}

fn text_height(text: &str) -> usize {
    BLOCK_CHROME_LINES + text.lines().count().max(1)
}

fn current_time() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}
