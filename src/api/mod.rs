//! Client side of the dashboard's HTTP endpoints.
//!
//! [`Backend`] is the seam between the presentation layer and the network:
//! the dashboard only ever talks to a `Backend`, [`HttpBackend`] is the
//! production implementation over `ureq`, and tests substitute scripted
//! fakes.

pub mod client;
pub mod types;

use serde_json::{Map, Value};
use thiserror::Error;

pub use client::HttpBackend;
pub use types::{
    ChatRequest, ConfigDocument, ModelInfo, SystemStats, ToolInfo, UploadReceipt,
};

/// Every way a dashboard request can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Connection refused, DNS, timeout and other I/O failures.
    #[error("request failed: {0}")]
    Transport(String),
    /// Non-2xx reply.
    #[error("server returned HTTP {code}: {message}")]
    Status { code: u16, message: String },
    /// 2xx reply whose body does not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Well-formed reply reporting a failure.
    #[error("{0}")]
    Backend(String),
}

/// The dashboard's view of its backend, one method per endpoint.
pub trait Backend {
    /// `POST /api/chat`: the assistant's reply text.
    fn chat(&self, request: &ChatRequest) -> Result<String, ApiError>;

    /// `GET /api/system/stats`.
    fn system_stats(&self) -> Result<SystemStats, ApiError>;

    /// `GET /api/config`.
    fn load_config(&self) -> Result<ConfigDocument, ApiError>;

    /// `POST /api/config`.
    fn save_config(&self, document: &ConfigDocument) -> Result<(), ApiError>;

    /// `PUT /api/settings`.
    fn update_settings(&self, settings: &Map<String, Value>) -> Result<(), ApiError>;

    /// `GET /api/models`.
    fn models(&self) -> Result<Vec<ModelInfo>, ApiError>;

    /// `GET /api/tools`.
    fn tools(&self) -> Result<Vec<ToolInfo>, ApiError>;

    /// `POST /api/upload`.
    fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadReceipt, ApiError>;
}
