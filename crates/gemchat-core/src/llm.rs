//! Model client for an Ollama-compatible inference server.
//!
//! The handle is constructed at most once per process behind an async
//! memoization guard and shared read-only afterwards. Construction probes
//! the server and verifies the configured model is present; failure is
//! cached too, so every later dispatch sees the same outcome without
//! retrying.

use std::time::Instant;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::{Config, DevicePreference};

static MODEL: OnceCell<ModelStatus> = OnceCell::const_new();

/// Outcome of the one-time model construction.
pub enum ModelStatus {
    Ready(ModelHandle),
    Failed(String),
}

impl ModelStatus {
    pub fn handle(&self) -> Option<&ModelHandle> {
        match self {
            ModelStatus::Ready(handle) => Some(handle),
            ModelStatus::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ModelStatus::Ready(_) => None,
            ModelStatus::Failed(reason) => Some(reason),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelStatus::Ready(_))
    }
}

/// Constructed inference handle. Immutable after construction.
pub struct ModelHandle {
    client: Client,
    base_url: String,
    pub model: String,
    pub device: DevicePreference,
    pub server_version: String,
    system_prompt: Option<String>,
    max_tokens: Option<u32>,
}

/// One past exchange carried as conversation context.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

/// A completed generation.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: String,
    /// Wall-clock seconds spent on the request.
    pub response_time: f64,
}

/// Loads the model handle once per process and caches the outcome.
pub async fn load_cached(config: &Config) -> &'static ModelStatus {
    MODEL
        .get_or_init(|| async {
            match load(config).await {
                Ok(handle) => {
                    info!(
                        model = %handle.model,
                        device = handle.device.label(),
                        server = %handle.server_version,
                        "model handle ready"
                    );
                    ModelStatus::Ready(handle)
                }
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "model load failed");
                    ModelStatus::Failed(format!("{err:#}"))
                }
            }
        })
        .await
}

/// Constructs a handle: server reachability probe, then model lookup.
pub async fn load(config: &Config) -> Result<ModelHandle> {
    let client = Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;
    let base_url = config.base_url.trim_end_matches('/').to_string();

    let version: VersionResponse = client
        .get(format!("{base_url}/api/version"))
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .with_context(|| format!("Model server at {base_url} is unreachable (is it running?)"))?
        .json()
        .await
        .context("Model server returned an unexpected version payload")?;

    let tags: TagsResponse = client
        .get(format!("{base_url}/api/tags"))
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .context("Failed to list models")?
        .json()
        .await
        .context("Model server returned an unexpected model list")?;

    let names: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
    if !model_listed(&names, &config.model) {
        anyhow::bail!(
            "Model '{}' is not available on {} (try: ollama pull {})",
            config.model,
            base_url,
            config.model
        );
    }

    Ok(ModelHandle {
        client,
        base_url,
        model: config.model.clone(),
        device: config.device,
        server_version: version.version,
        system_prompt: config.effective_system_prompt(),
        max_tokens: config.max_tokens,
    })
}

/// True when `wanted` matches a served model, with or without a tag suffix.
fn model_listed(names: &[String], wanted: &str) -> bool {
    names.iter().any(|name| {
        name == wanted || name.split(':').next() == Some(wanted)
    })
}

impl ModelHandle {
    /// Generates an answer for `question`, carrying `history` as context.
    pub async fn generate(&self, question: &str, history: &[ChatTurn]) -> Result<ChatReply> {
        let mut messages = Vec::with_capacity(history.len() * 2 + 2);
        if let Some(system) = &self.system_prompt {
            messages.push(Message {
                role: "system",
                content: system,
            });
        }
        for turn in history {
            messages.push(Message {
                role: "user",
                content: &turn.question,
            });
            messages.push(Message {
                role: "assistant",
                content: &turn.answer,
            });
        }
        messages.push(Message {
            role: "user",
            content: question,
        });

        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: Options {
                num_predict: self.max_tokens,
                num_gpu: gpu_layers(self.device),
            },
        };

        let started = Instant::now();
        let response: ChatResponse = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .context("Generation request failed")?
            .json()
            .await
            .context("Model server returned an unexpected chat payload")?;

        Ok(ChatReply {
            content: response.message.content,
            response_time: started.elapsed().as_secs_f64(),
        })
    }
}

/// Layer-offload request derived from the device preference.
/// `None` leaves placement to the server.
fn gpu_layers(device: DevicePreference) -> Option<i64> {
    match device {
        DevicePreference::Auto => None,
        DevicePreference::Cpu => Some(0),
        DevicePreference::Gpu => Some(-1),
    }
}

// ----------------------------------------------------------------------
// Wire types
// ----------------------------------------------------------------------

#[derive(Deserialize)]
struct VersionResponse {
    version: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
    options: Options,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_gpu: Option<i64>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_listed_exact_and_base_name() {
        let names = vec!["gemma2:2b".to_string(), "llama3:latest".to_string()];
        assert!(model_listed(&names, "gemma2:2b"));
        assert!(model_listed(&names, "gemma2"));
        assert!(model_listed(&names, "llama3"));
        assert!(!model_listed(&names, "gemma2:9b"));
        assert!(!model_listed(&names, "mistral"));
    }

    #[test]
    fn test_gpu_layers_mapping() {
        assert_eq!(gpu_layers(DevicePreference::Auto), None);
        assert_eq!(gpu_layers(DevicePreference::Cpu), Some(0));
        assert_eq!(gpu_layers(DevicePreference::Gpu), Some(-1));
    }

    #[test]
    fn test_options_serialization_omits_unset_fields() {
        let options = Options {
            num_predict: None,
            num_gpu: Some(0),
        };
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"{"num_gpu":0}"#);
    }

    #[test]
    fn test_tags_response_parses() {
        let payload = r#"{"models":[{"name":"gemma2:2b","size":123},{"name":"llama3:8b"}]}"#;
        let tags: TagsResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(tags.models.len(), 2);
        assert_eq!(tags.models[0].name, "gemma2:2b");
    }

    #[test]
    fn test_chat_response_parses() {
        let payload = r#"{"model":"gemma2:2b","message":{"role":"assistant","content":"hi"},"done":true}"#;
        let response: ChatResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(response.message.content, "hi");
    }

    #[tokio::test]
    async fn test_load_cached_memoizes_failures() {
        // Nothing listens on the probe port, so construction fails; the
        // failure must be cached and returned by reference thereafter.
        let config = Config {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 1,
            ..Config::default()
        };

        let first = load_cached(&config).await;
        let second = load_cached(&config).await;

        assert!(!first.is_ready());
        assert!(first.error().is_some());
        assert!(std::ptr::eq(first, second));
    }
}
