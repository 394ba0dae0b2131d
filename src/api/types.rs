//! Request and response bodies of the dashboard's JSON endpoints.
//!
//! Shared by the client and the reference backend so both sides agree on
//! field names. Response types are lenient: missing fields take defaults.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ApiError;

/// Nested, string-keyed configuration document as exchanged on the wire.
pub type ConfigDocument = Map<String, Value>;

// ---------------------------------------------------------------------------
// /api/chat
// ---------------------------------------------------------------------------

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Reply of `POST /api/chat`.
///
/// Backends answer either `{response}` or `{status, response | error}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatReply {
    pub fn into_result(self) -> Result<String, ApiError> {
        if let Some(error) = self.error {
            return Err(ApiError::Backend(error));
        }
        if let Some(status) = self.status.as_deref()
            && status != "success"
        {
            return Err(ApiError::Backend(format!("chat failed with status '{status}'")));
        }
        self.response
            .ok_or_else(|| ApiError::Malformed("chat reply has no response".to_string()))
    }
}

// ---------------------------------------------------------------------------
// /api/system/stats
// ---------------------------------------------------------------------------

/// Reply of `GET /api/system/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemStats {
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub disk: DiskStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuStats {
    pub percent: f64,
    pub cores: u32,
    /// Current frequency in MHz.
    pub frequency: f64,
    pub per_core: Vec<f64>,
}

/// Byte counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStats {
    pub percent: f64,
    pub total: u64,
    pub available: u64,
    pub used: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskStats {
    pub percent: f64,
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

// ---------------------------------------------------------------------------
// /api/config
// ---------------------------------------------------------------------------

/// Reply of `GET /api/config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `POST /api/config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSubmission {
    pub config: ConfigDocument,
}

/// `{success, error?}` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// /api/settings
// ---------------------------------------------------------------------------

/// Body of `PUT /api/settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub settings: Map<String, Value>,
}

/// Reply of `PUT /api/settings`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsReply {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Map<String, Value>>,
}

// ---------------------------------------------------------------------------
// /api/models, /api/tools, /api/upload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelsReply {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsReply {
    #[serde(default)]
    pub tools: Vec<ToolInfo>,
}

/// Reply of `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub success: bool,
    pub filename: String,
    pub size: u64,
    pub file_id: String,
}

/// `{error}` body attached to non-2xx replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_reply_accepts_both_shapes() {
        let plain: ChatReply = serde_json::from_str(r#"{"response":"hi"}"#).unwrap();
        assert_eq!(plain.into_result().unwrap(), "hi");

        let ok: ChatReply =
            serde_json::from_str(r#"{"status":"success","response":"hey"}"#).unwrap();
        assert_eq!(ok.into_result().unwrap(), "hey");

        let failed: ChatReply =
            serde_json::from_str(r#"{"status":"error","error":"model offline"}"#).unwrap();
        assert_eq!(
            failed.into_result(),
            Err(ApiError::Backend("model offline".to_string()))
        );

        let odd: ChatReply = serde_json::from_str(r#"{"status":"queued"}"#).unwrap();
        assert!(matches!(odd.into_result(), Err(ApiError::Backend(_))));

        let empty: ChatReply = serde_json::from_str("{}").unwrap();
        assert!(matches!(empty.into_result(), Err(ApiError::Malformed(_))));
    }

    #[test]
    fn stats_tolerate_partial_payloads() {
        let stats: SystemStats = serde_json::from_str(
            r#"{"cpu":{"percent":42},"memory":{"percent":10},"disk":{"percent":5}}"#,
        )
        .unwrap();
        assert_eq!(stats.cpu.percent, 42.0);
        assert_eq!(stats.memory.percent, 10.0);
        assert_eq!(stats.disk.percent, 5.0);
        assert!(stats.cpu.per_core.is_empty());

        let nothing: SystemStats = serde_json::from_str("{}").unwrap();
        assert_eq!(nothing, SystemStats::default());
    }

    #[test]
    fn model_flags_default_off() {
        let reply: ModelsReply =
            serde_json::from_str(r#"{"models":[{"id":"a","name":"A"}]}"#).unwrap();
        assert!(!reply.models[0].disabled);
        assert!(reply.models[0].features.is_empty());
    }
}
