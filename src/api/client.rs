//! Synchronous HTTP client for the dashboard backend.
//!
//! Wraps a shared `ureq::Agent` so connections are pooled across the chat,
//! config and polling calls of one dashboard. Non-2xx replies are decoded
//! for their `{error}` body when present.
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::types::{
    Ack, ChatReply, ChatRequest, ConfigDocument, ConfigEnvelope, ConfigSubmission, ErrorBody,
    ModelInfo, ModelsReply, SettingsReply, SettingsUpdate, SystemStats, ToolInfo, ToolsReply,
    UploadReceipt,
};
use super::{ApiError, Backend};
use crate::config::schema::ClientConfig;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpBackend {
    /// Build a client for `base_url`. `timeout` bounds every request.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        // "localhost" may resolve to ::1 first while the server only binds IPv4.
        let base_url = base_url
            .trim_end_matches('/')
            .replace("://localhost", "://127.0.0.1");

        Self {
            base_url,
            agent: builder.build(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms));
        Self::new(&config.base_url, timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self
            .agent
            .get(&self.url(path))
            .call()
            .map_err(from_ureq)?;
        decode(resp)
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let resp = self
            .agent
            .request(method, &self.url(path))
            .send_json(body)
            .map_err(from_ureq)?;
        decode(resp)
    }
}

impl Backend for HttpBackend {
    fn chat(&self, request: &ChatRequest) -> Result<String, ApiError> {
        let reply: ChatReply = self.send_json("POST", "/api/chat", request)?;
        reply.into_result()
    }

    fn system_stats(&self) -> Result<SystemStats, ApiError> {
        self.get_json("/api/system/stats")
    }

    fn load_config(&self) -> Result<ConfigDocument, ApiError> {
        let envelope: ConfigEnvelope = self.get_json("/api/config")?;
        if !envelope.success {
            return Err(ApiError::Backend(
                envelope
                    .error
                    .unwrap_or_else(|| "configuration unavailable".to_string()),
            ));
        }
        envelope
            .config
            .ok_or_else(|| ApiError::Malformed("reply has no config document".to_string()))
    }

    fn save_config(&self, document: &ConfigDocument) -> Result<(), ApiError> {
        let body = ConfigSubmission {
            config: document.clone(),
        };
        let ack: Ack = self.send_json("POST", "/api/config", &body)?;
        if ack.success {
            Ok(())
        } else {
            Err(ApiError::Backend(
                ack.error
                    .unwrap_or_else(|| "configuration was not saved".to_string()),
            ))
        }
    }

    fn update_settings(&self, settings: &Map<String, Value>) -> Result<(), ApiError> {
        let body = SettingsUpdate {
            settings: settings.clone(),
        };
        let reply: SettingsReply = self.send_json("PUT", "/api/settings", &body)?;
        if reply.status == "success" {
            Ok(())
        } else {
            Err(ApiError::Backend(reply.error.unwrap_or_else(|| {
                format!("settings update failed with status '{}'", reply.status)
            })))
        }
    }

    fn models(&self) -> Result<Vec<ModelInfo>, ApiError> {
        let reply: ModelsReply = self.get_json("/api/models")?;
        Ok(reply.models)
    }

    fn tools(&self) -> Result<Vec<ToolInfo>, ApiError> {
        let reply: ToolsReply = self.get_json("/api/tools")?;
        Ok(reply.tools)
    }

    fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadReceipt, ApiError> {
        let resp = self
            .agent
            .post(&self.url("/api/upload"))
            .query("filename", filename)
            .set("Content-Type", "application/octet-stream")
            .send_bytes(bytes)
            .map_err(from_ureq)?;
        decode(resp)
    }
}

fn decode<T: DeserializeOwned>(resp: ureq::Response) -> Result<T, ApiError> {
    resp.into_json()
        .map_err(|e| ApiError::Malformed(e.to_string()))
}

fn from_ureq(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(code, resp) => {
            let message = resp
                .into_json::<ErrorBody>()
                .map(|body| body.error)
                .unwrap_or_else(|_| "no error detail".to_string());
            ApiError::Status { code, message }
        }
        ureq::Error::Transport(transport) => ApiError::Transport(transport.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_normalises_base_url() {
        let client = HttpBackend::new("http://localhost:5000/", None);
        assert_eq!(client.base_url(), "http://127.0.0.1:5000");
        assert_eq!(client.url("/api/chat"), "http://127.0.0.1:5000/api/chat");
    }

    #[test]
    fn client_from_default_config() {
        let client = HttpBackend::from_config(&ClientConfig::default());
        assert_eq!(client.base_url(), "http://127.0.0.1:5000");
    }

    #[test]
    fn unreachable_backend_is_a_transport_error() {
        // Port 9 (discard) is essentially never listening on loopback.
        let client = HttpBackend::new("http://127.0.0.1:9", Some(Duration::from_secs(2)));
        assert!(matches!(client.system_stats(), Err(ApiError::Transport(_))));
    }
}
