//! Ollama HTTP client.

use crate::error::{OllamaError, OllamaResult};
use crate::types::*;
use docqa_config::OllamaConfig;
use futures_util::StreamExt;
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Client for interacting with Ollama's API.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    host: String,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a new client from configuration.
    pub fn from_config(config: &OllamaConfig) -> OllamaResult<Self> {
        Self::with_timeout(&config.host, Duration::from_secs(config.timeout_seconds))
    }

    /// Create a new client with default settings.
    pub fn new(host: impl Into<String>) -> OllamaResult<Self> {
        Self::with_timeout(&host.into(), Duration::from_secs(120))
    }

    fn with_timeout(host: &str, timeout: Duration) -> OllamaResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OllamaError::Http)?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Check if Ollama server is available.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.host);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// List all available models.
    pub async fn list_models(&self) -> OllamaResult<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.host);
        debug!("Listing models from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(OllamaError::ApiError {
                status,
                message: text,
            });
        }

        let list: ListModelsResponse = response.json().await?;
        Ok(list.models)
    }

    /// Check if a specific model is available.
    pub async fn has_model(&self, model: &str) -> OllamaResult<bool> {
        let models = self.list_models().await?;
        Ok(model_matches(&models, model))
    }

    /// Generate embeddings for text.
    pub async fn embed(&self, model: &str, text: &str) -> OllamaResult<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.host);
        debug!("Generating embedding with model {} for text length {}", model, text.len());

        let request = EmbeddingRequest {
            model: model.to_string(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let response = check_status(response, model).await?;

        let embedding_response: EmbeddingResponse = response.json().await?;
        if embedding_response.embedding.is_empty() {
            return Err(OllamaError::EmptyEmbedding {
                model: model.to_string(),
            });
        }
        debug!("Generated embedding with {} dimensions", embedding_response.embedding.len());

        Ok(embedding_response.embedding)
    }

    /// Chat completion (non-streaming). Returns the assistant's reply.
    pub async fn chat(&self, request: ChatRequest) -> OllamaResult<String> {
        let url = format!("{}/api/chat", self.host);
        debug!("Chat with model {} ({} messages)", request.model, request.messages.len());

        let mut request = request;
        request.stream = false;

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let response = check_status(response, &request.model).await?;

        let chat_response: ChatResponse = response.json().await?;
        match chat_response.message {
            Some(message) => Ok(message.content),
            None => Err(OllamaError::ParseError(
                "chat response has no message".to_string(),
            )),
        }
    }

    /// Chat completion with streaming.
    ///
    /// The receiver yields pieces of the reply. A failure after the stream
    /// started arrives as a final `Err` item; a clean end just closes the
    /// channel.
    pub async fn chat_stream(
        &self,
        request: ChatRequest,
    ) -> OllamaResult<mpsc::Receiver<OllamaResult<String>>> {
        let url = format!("{}/api/chat", self.host);
        debug!("Starting streaming chat with model {}", request.model);

        let mut request = request;
        request.stream = true;

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let response = check_status(response, &request.model).await?;

        let (tx, rx) = mpsc::channel(100);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            // Lines can be split across network chunks
            let mut pending: Vec<u8> = Vec::new();

            while let Some(chunk_result) = stream.next().await {
                let bytes = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Stream error: {}", e);
                        let _ = tx.send(Err(OllamaError::Http(e))).await;
                        return;
                    }
                };
                pending.extend_from_slice(&bytes);

                while let Some(newline) = pending.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=newline).collect();
                    let line = String::from_utf8_lossy(&line);
                    match forward_line(line.trim(), &tx).await {
                        LineResult::Continue => {}
                        LineResult::Stop => return,
                    }
                }
            }

            let line = String::from_utf8_lossy(&pending);
            let _ = forward_line(line.trim(), &tx).await;
        });

        Ok(rx)
    }

    fn send_error(&self, e: reqwest::Error) -> OllamaError {
        if e.is_connect() {
            OllamaError::ServerNotRunning {
                host: self.host.clone(),
            }
        } else if e.is_timeout() {
            OllamaError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            OllamaError::Http(e)
        }
    }
}

enum LineResult {
    Continue,
    Stop,
}

/// Send the content of one streamed JSON line to the receiver.
async fn forward_line(line: &str, tx: &mpsc::Sender<OllamaResult<String>>) -> LineResult {
    if line.is_empty() {
        return LineResult::Continue;
    }

    if let Ok(error) = serde_json::from_str::<ErrorResponse>(line) {
        warn!("Ollama reported an error mid-stream: {}", error.error);
        let _ = tx.send(Err(OllamaError::Stream(error.error))).await;
        return LineResult::Stop;
    }

    match serde_json::from_str::<ChatResponse>(line) {
        Ok(chunk) => {
            let content = chunk.content();
            if !content.is_empty() && tx.send(Ok(content.to_string())).await.is_err() {
                // Receiver dropped
                return LineResult::Stop;
            }
            if chunk.done {
                LineResult::Stop
            } else {
                LineResult::Continue
            }
        }
        Err(e) => {
            warn!("Failed to parse stream chunk: {}", e);
            LineResult::Continue
        }
    }
}

/// Turn a non-success status into an error.
async fn check_status(response: Response, model: &str) -> OllamaResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    if text.contains("not found") || status.as_u16() == 404 {
        return Err(OllamaError::ModelNotFound {
            model: model.to_string(),
        });
    }

    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.error)
        .unwrap_or(text);
    Err(OllamaError::ApiError {
        status: status.as_u16(),
        message,
    })
}

/// Match either the exact model name or the name without its tag.
fn model_matches(models: &[ModelInfo], model: &str) -> bool {
    models
        .iter()
        .any(|m| m.name == model || m.name.starts_with(&format!("{}:", model)))
}
