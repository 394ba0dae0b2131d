//! Light/dark theme preference and its persisted store.
//!
//! The preference is a single word kept in `~/.chatdash/theme`. It is read
//! when the dashboard mounts and rewritten every time the theme toggles.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Icon shown on the toggle button: the sun switches back to light.
    pub fn toggle_icon(self) -> &'static str {
        match self {
            Self::Light => "fa-moon",
            Self::Dark => "fa-sun",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File-backed theme preference.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: Option<PathBuf>,
}

impl ThemeStore {
    /// Store under the per-user state directory.
    pub fn user() -> Self {
        Self {
            path: crate::config::config_dir().map(|dir| dir.join("theme")),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A store that remembers nothing.
    pub fn ephemeral() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The persisted preference, if any. Unreadable or unknown content
    /// counts as no preference.
    pub fn load(&self) -> Option<Theme> {
        let path = self.path.as_ref()?;
        let content = fs::read_to_string(path).ok()?;
        Theme::parse(&content)
    }

    pub fn save(&self, theme: Theme) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create theme directory")?;
        }
        fs::write(path, theme.as_str())
            .with_context(|| format!("failed to persist theme to {}", path.display()))
    }
}
