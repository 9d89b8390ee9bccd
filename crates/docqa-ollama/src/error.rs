//! Errors from talking to Ollama and querying the knowledge base.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("Ollama server is not running at {host}. Start it with 'ollama serve'.")]
    ServerNotRunning { host: String },

    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Model not found: {model}. Run 'ollama pull {model}' to download it.")]
    ModelNotFound { model: String },

    /// Non-success status with the server's error message.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Model {model} returned an empty embedding")]
    EmptyEmbedding { model: String },

    /// The server gave up part way through a streamed reply.
    #[error("Ollama stopped the reply: {0}")]
    Stream(String),

    #[error("Unexpected response from Ollama: {0}")]
    ParseError(String),

    /// Embeddings in one index must share a dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Retrieval found no chunk above the similarity threshold.
    #[error("No document content is relevant to the question")]
    NoContext,

    #[error("Nothing to index: the corpus has no chunks")]
    EmptyIndex,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OllamaError {
    /// The server or model is missing, so retrying the question will not help.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            OllamaError::ServerNotRunning { .. } | OllamaError::ModelNotFound { .. }
        )
    }
}

pub type OllamaResult<T> = Result<T, OllamaError>;
