//! Configuration commands.

use super::get_paths;
use anyhow::{Context, Result};
use colored::Colorize;
use docqa_config::Config;

pub fn show() -> Result<()> {
    let paths = get_paths()?;

    println!("{}", "Current Configuration".cyan().bold());
    println!("{}", "─".repeat(50));

    if paths.config_file.exists() {
        let contents =
            std::fs::read_to_string(&paths.config_file).context("Failed to read config file")?;
        println!("{}", contents);
    } else {
        println!(
            "{}",
            "# No config file yet, showing defaults. Run 'docqa init' to create one.".dimmed()
        );
        println!("{}", Config::default_config_string());
    }

    Ok(())
}

pub fn path() -> Result<()> {
    let paths = get_paths()?;
    println!("{}", paths.config_file.display());
    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    let paths = get_paths()?;

    let mut config = Config::load_from(&paths.config_file).context("Failed to load config")?;
    apply(&mut config, key, value)?;

    config
        .save_to(&paths.config_file)
        .context("Failed to save config")?;

    println!("{} Set {} = {}", "✓".green(), key.cyan(), value);

    Ok(())
}

/// Set one dotted key on the configuration.
fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "documents_dir"] => config.general.documents_dir = value.to_string(),
        ["ollama", "model"] => config.ollama.model = value.to_string(),
        ["ollama", "host"] => config.ollama.host = value.to_string(),
        ["ollama", "embedding_model"] => config.ollama.embedding_model = value.to_string(),
        ["ollama", "timeout_seconds"] => {
            config.ollama.timeout_seconds = value.parse().context("Invalid timeout value")?;
        }
        ["ingest", "load_timeout_seconds"] => {
            config.ingest.load_timeout_seconds =
                value.parse().context("Invalid load_timeout_seconds value")?;
        }
        ["chunking", "chunk_size"] => {
            config.chunking.chunk_size = value.parse().context("Invalid chunk_size value")?;
        }
        ["chunking", "chunk_overlap"] => {
            config.chunking.chunk_overlap =
                value.parse().context("Invalid chunk_overlap value")?;
        }
        ["chunking", "min_chunk_size"] => {
            config.chunking.min_chunk_size =
                value.parse().context("Invalid min_chunk_size value")?;
        }
        ["rag", "max_context_chunks"] => {
            config.rag.max_context_chunks =
                value.parse().context("Invalid max_context_chunks value")?;
        }
        ["rag", "min_similarity"] => {
            config.rag.min_similarity = value.parse().context("Invalid min_similarity value")?;
        }
        ["rag", "temperature"] => {
            config.rag.temperature = value.parse().context("Invalid temperature value")?;
        }
        ["rag", "history_turns"] => {
            config.rag.history_turns = value.parse().context("Invalid history_turns value")?;
        }
        ["ui", "color"] => {
            config.ui.color = value.parse().context("Invalid boolean value")?;
        }
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    }

    config.validate()?;
    Ok(())
}
