//! Scripted in-process backend shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use serde_json::{Map, Value};

use chatdash::api::types::{CpuStats, DiskStats, MemoryStats};
use chatdash::api::{
    ApiError, Backend, ChatRequest, ConfigDocument, ModelInfo, SystemStats, ToolInfo,
    UploadReceipt,
};

/// Backend whose replies are set up front. Every call is recorded.
#[derive(Default)]
pub struct FakeBackend {
    pub chat_reply: Mutex<Option<Result<String, ApiError>>>,
    pub stats: Mutex<Vec<Result<SystemStats, ApiError>>>,
    pub config: Mutex<Option<Result<ConfigDocument, ApiError>>>,
    pub save_result: Mutex<Option<Result<(), ApiError>>>,
    pub models: Mutex<Vec<ModelInfo>>,
    pub calls: Mutex<Vec<String>>,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
    pub saved_documents: Mutex<Vec<ConfigDocument>>,
    pub settings_updates: Mutex<Vec<Map<String, Value>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat_reply(self, reply: Result<String, ApiError>) -> Self {
        *self.chat_reply.lock().unwrap() = Some(reply);
        self
    }

    /// Queue stats replies; the last one repeats.
    pub fn with_stats(self, replies: Vec<Result<SystemStats, ApiError>>) -> Self {
        *self.stats.lock().unwrap() = replies;
        self
    }

    pub fn with_config(self, reply: Result<ConfigDocument, ApiError>) -> Self {
        *self.config.lock().unwrap() = Some(reply);
        self
    }

    pub fn with_save_result(self, result: Result<(), ApiError>) -> Self {
        *self.save_result.lock().unwrap() = Some(result);
        self
    }

    pub fn with_models(self, models: Vec<ModelInfo>) -> Self {
        *self.models.lock().unwrap() = models;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

impl Backend for FakeBackend {
    fn chat(&self, request: &ChatRequest) -> Result<String, ApiError> {
        self.record("chat");
        self.chat_requests.lock().unwrap().push(request.clone());
        self.chat_reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(ApiError::Transport("no chat reply scripted".into())))
    }

    fn system_stats(&self) -> Result<SystemStats, ApiError> {
        self.record("system_stats");
        let mut queue = self.stats.lock().unwrap();
        match queue.len() {
            0 => Err(ApiError::Transport("no stats scripted".into())),
            1 => queue[0].clone(),
            _ => queue.remove(0),
        }
    }

    fn load_config(&self) -> Result<ConfigDocument, ApiError> {
        self.record("load_config");
        self.config
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(ConfigDocument::new()))
    }

    fn save_config(&self, document: &ConfigDocument) -> Result<(), ApiError> {
        self.record("save_config");
        self.saved_documents.lock().unwrap().push(document.clone());
        self.save_result.lock().unwrap().clone().unwrap_or(Ok(()))
    }

    fn update_settings(&self, settings: &Map<String, Value>) -> Result<(), ApiError> {
        self.record("update_settings");
        self.settings_updates.lock().unwrap().push(settings.clone());
        Ok(())
    }

    fn models(&self) -> Result<Vec<ModelInfo>, ApiError> {
        self.record("models");
        Ok(self.models.lock().unwrap().clone())
    }

    fn tools(&self) -> Result<Vec<ToolInfo>, ApiError> {
        self.record("tools");
        Ok(Vec::new())
    }

    fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadReceipt, ApiError> {
        self.record("upload");
        Ok(UploadReceipt {
            success: true,
            filename: filename.to_string(),
            size: bytes.len() as u64,
            file_id: "1".to_string(),
        })
    }
}

pub fn stats(cpu: f64, memory: f64, disk: f64) -> SystemStats {
    SystemStats {
        cpu: CpuStats {
            percent: cpu,
            cores: 4,
            frequency: 2400.0,
            per_core: vec![cpu; 4],
        },
        memory: MemoryStats {
            percent: memory,
            ..MemoryStats::default()
        },
        disk: DiskStats {
            percent: disk,
            ..DiskStats::default()
        },
    }
}

pub fn model(id: &str, disabled: bool) -> ModelInfo {
    ModelInfo {
        id: id.to_string(),
        name: id.to_string(),
        disabled,
        features: Vec::new(),
    }
}
