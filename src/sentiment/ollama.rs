//! Ollama-backed sentiment classifier.
//!
//! Sends each text to a local LLM through the Ollama chat API and asks for a
//! one-line JSON verdict. Every request runs under a hard timeout on a small
//! private runtime so a hung model cannot block the caller forever.

use super::{Classification, ClassifierLabel, TextClassifier, DEFAULT_MAX_INPUT_CHARS};
use crate::error::{AnalysisError, AnalysisResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Configuration for the Ollama classifier.
#[derive(Debug, Clone)]
pub struct OllamaClassifierConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub max_input_chars: usize,
}

impl Default for OllamaClassifierConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model_name: "llama3.2:latest".to_string(),
            temperature: 0.0,
            timeout_seconds: 30,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    format: String,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Sentiment classifier that delegates to an Ollama model.
pub struct OllamaClassifier {
    config: OllamaClassifierConfig,
    http_client: reqwest::Client,
    runtime: Runtime,
}

impl OllamaClassifier {
    pub fn new(config: OllamaClassifierConfig) -> Result<Self> {
        info!(
            "Initializing Ollama sentiment classifier with model {} at {}",
            config.model_name, config.ollama_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create classifier runtime")?;

        Ok(Self {
            config,
            http_client,
            runtime,
        })
    }

    async fn send_prompt(&self, text: &str) -> AnalysisResult<String> {
        let url = format!("{}/api/chat", self.config.ollama_url);

        let request = OllamaChatRequest {
            model: self.config.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            stream: false,
            format: "json".to_string(),
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    AnalysisError::Classifier(format!(
                        "Cannot connect to Ollama at {}",
                        self.config.ollama_url
                    ))
                } else {
                    AnalysisError::Classifier(format!("Failed to send request: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Classifier(format!(
                "Ollama API error {}: {}",
                status, body
            )));
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| {
                AnalysisError::Classifier(format!("Failed to parse Ollama response: {}", e))
            })?;

        Ok(chat_response.message.content)
    }
}

impl TextClassifier for OllamaClassifier {
    fn classify(&self, text: &str) -> AnalysisResult<Classification> {
        let timeout = Duration::from_secs(self.config.timeout_seconds);

        let content = self
            .runtime
            .block_on(async { tokio::time::timeout(timeout, self.send_prompt(text)).await })
            .map_err(|_| {
                AnalysisError::Classifier(format!(
                    "Request timed out after {}s",
                    self.config.timeout_seconds
                ))
            })??;

        debug!("Ollama sentiment verdict: {}", content.trim());
        parse_verdict(&content)
    }

    fn max_input_chars(&self) -> usize {
        self.config.max_input_chars
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Extract `{"label": ..., "confidence": ...}` from the model's reply.
fn parse_verdict(content: &str) -> AnalysisResult<Classification> {
    let start = content.find('{');
    let end = content.rfind('}');
    let json_text = match (start, end) {
        (Some(s), Some(e)) if s < e => &content[s..=e],
        _ => {
            return Err(AnalysisError::Classifier(format!(
                "No JSON object in model output: {}",
                content.trim()
            )))
        }
    };

    let json: Value = serde_json::from_str(json_text)
        .map_err(|e| AnalysisError::Classifier(format!("Invalid JSON from model: {}", e)))?;

    let label = match json["label"].as_str().map(|l| l.trim().to_lowercase()) {
        Some(l) if l == "positive" => ClassifierLabel::Positive,
        Some(l) if l == "negative" => ClassifierLabel::Negative,
        Some(l) if l == "neutral" => ClassifierLabel::Neutral,
        other => {
            return Err(AnalysisError::Classifier(format!(
                "Unexpected label from model: {:?}",
                other
            )))
        }
    };

    let confidence = json["confidence"]
        .as_f64()
        .filter(|c| c.is_finite())
        .ok_or_else(|| {
            AnalysisError::Classifier("Missing confidence in model output".to_string())
        })?;

    Ok(Classification {
        label,
        confidence: confidence.clamp(0.0, 1.0),
    })
}

const SYSTEM_PROMPT: &str = r#"You are a sentiment classifier for code review comments.
Classify the sentiment of the user's message.
Reply with exactly one JSON object: {"label": "positive" | "negative", "confidence": <number between 0 and 1>}.
Only output JSON, no explanations."#;
