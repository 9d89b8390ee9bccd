//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub rag: RagSettings,

    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> ConfigResult<Self> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&paths.config_file)
    }

    /// Load configuration from a specific path.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        debug!("Loading configuration from {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;
        let contents = toml::to_string_pretty(self)?;
        write_file(path, &contents)
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &Path) -> ConfigResult<()> {
        write_file(path, &Self::default_config_string())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# Docqa Configuration
# Ask questions about the documents in a folder

[general]
# Folder scanned for documents (pdf, txt, md, docx, xlsx)
documents_dir = "documents"

[ollama]
# Ollama server address
host = "http://localhost:11434"

# Model used to answer questions
model = "gpt-oss:20b"

# Model for generating embeddings
embedding_model = "nomic-embed-text"

# Request timeout in seconds
timeout_seconds = 120

[ingest]
# Give up on a single load attempt after this many seconds (0 = wait forever)
load_timeout_seconds = 0

[chunking]
# Characters per chunk
chunk_size = 500
# Characters shared between neighbouring chunks
chunk_overlap = 50
# A chunk is not closed before it holds this many new characters
min_chunk_size = 50

[rag]
# Number of chunks retrieved per question
max_context_chunks = 4
# Minimum cosine similarity for a chunk to be used (0.0 - 1.0)
min_similarity = 0.3
# Sampling temperature for answers
temperature = 0.7
# Previous exchanges sent along with a follow-up question
history_turns = 6

[ui]
# Enable colored output
color = true
"#
        .to_string()
    }

    /// Check values that would break ingestion or retrieval.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "chunking.chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.rag.max_context_chunks == 0 {
            return Err(ConfigError::Invalid(
                "rag.max_context_chunks must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.rag.min_similarity) {
            return Err(ConfigError::Invalid(format!(
                "rag.min_similarity must be between 0.0 and 1.0, got {}",
                self.rag.min_similarity
            )));
        }
        if self.ollama.host.trim().is_empty() {
            return Err(ConfigError::Invalid("ollama.host must not be empty".to_string()));
        }
        Ok(())
    }

    /// The documents directory with `~` and environment variables expanded.
    pub fn documents_path(&self) -> PathBuf {
        expand_path(&self.general.documents_dir)
    }
}

/// Write `contents` to `path`, creating parent directories.
fn write_file(path: &Path, contents: &str) -> ConfigResult<()> {
    let write_error = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    std::fs::write(path, contents).map_err(write_error)
}

/// Expand `~` and `$VARS` in a user supplied path.
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub documents_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            documents_dir: "documents".to_string(),
        }
    }
}

/// Ollama LLM settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    pub embedding_model: String,
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            model: "gpt-oss:20b".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            timeout_seconds: 120,
        }
    }
}

/// Document loading settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Per-attempt load timeout in seconds, 0 disables it.
    pub load_timeout_seconds: u64,
}

impl IngestConfig {
    pub fn load_timeout(&self) -> Option<std::time::Duration> {
        match self.load_timeout_seconds {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }
}

/// Text chunking settings, in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            min_chunk_size: 50,
        }
    }
}

/// Retrieval and answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub max_context_chunks: usize,
    pub min_similarity: f32,
    pub temperature: f32,
    pub history_turns: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            max_context_chunks: 4,
            min_similarity: 0.3,
            temperature: 0.7,
            history_turns: 6,
        }
    }
}

/// UI/Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub color: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ollama.host, "http://localhost:11434");
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert_eq!(config.general.documents_dir, "documents");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_string_parses() {
        let config: Config = toml::from_str(&Config::default_config_string()).unwrap();
        assert_eq!(config.rag.max_context_chunks, 4);
        assert_eq!(config.ingest.load_timeout_seconds, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
            [ollama]
            model = "mistral"

            [general]
            documents_dir = "/srv/docs"
            "#
        )
        .unwrap();

        let config = Config::load_from(temp_file.path()).unwrap();

        assert_eq!(config.ollama.model, "mistral");
        assert_eq!(config.documents_path(), PathBuf::from("/srv/docs"));
        // Defaults should still work
        assert_eq!(config.ollama.host, "http://localhost:11434");
        assert_eq!(config.chunking.chunk_size, 500);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.ollama.model, "gpt-oss:20b");
    }

    #[test]
    fn test_load_rejects_invalid_chunking() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
            [chunking]
            chunk_size = 100
            chunk_overlap = 100
            "#
        )
        .unwrap();

        let err = Config::load_from(temp_file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[chunking\nchunk_size = ").unwrap();

        let err = Config::load_from(temp_file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&temp_file.path().display().to_string()));
    }

    #[test]
    fn test_validate_similarity_range() {
        let mut config = Config::default();
        config.rag.min_similarity = 1.5;
        assert!(config.validate().is_err());

        config.rag.min_similarity = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.ingest.load_timeout_seconds = 30;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.ingest.load_timeout_seconds, 30);
        assert_eq!(
            loaded.ingest.load_timeout(),
            Some(std::time::Duration::from_secs(30))
        );
    }

    #[test]
    fn test_load_timeout_disabled() {
        assert_eq!(IngestConfig::default().load_timeout(), None);
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_path("~/documents");
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
