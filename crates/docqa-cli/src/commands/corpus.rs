//! Loading documents and building the knowledge base, shared by commands.

use super::Target;
use anyhow::{Context, Result};
use colored::Colorize;
use docqa_config::Config;
use docqa_core::LoadedUnit;
use docqa_ingest::{Batch, ChunkConfig, Chunker, IngestError, LoadOutcome, Pipeline, Strategy};
use docqa_ollama::{KnowledgeBase, OllamaClient, RagConfig, SourceReference};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::runtime::Runtime;

/// Run the loading pipeline over the target.
pub fn load(config: &Config, target: &Target) -> Result<Batch> {
    let pipeline = Pipeline::from_config(&config.ingest);

    let batch = match target {
        Target::Directory(dir) => pipeline.run(dir),
        Target::File(file) => pipeline.load_file(file),
    };

    batch.map_err(|e| {
        if matches!(e, IngestError::DirectoryNotFound(_)) {
            anyhow::anyhow!(
                "{}. Create it, pass --dir, or set general.documents_dir with 'docqa config set'.",
                e
            )
        } else {
            anyhow::Error::new(e).context("Failed to load documents")
        }
    })
}

/// Print one line per file and the totals.
pub fn print_report(batch: &Batch) {
    for report in &batch.reports {
        let (marker, detail) = match &report.outcome {
            LoadOutcome::Loaded {
                recovered_from: None,
                ..
            } => ("✓".green(), report.outcome.to_string().normal()),
            LoadOutcome::Loaded { .. } => ("✓".yellow(), report.outcome.to_string().yellow()),
            LoadOutcome::SkippedUnsupported { .. } => ("-".dimmed(), report.outcome.to_string().dimmed()),
            LoadOutcome::FailedPrimary { .. } | LoadOutcome::FailedFallback { .. } => {
                ("✗".red(), report.outcome.to_string().red())
            }
        };
        println!("  {} {} {}", marker, report.file.file_name.white(), detail);
    }

    let summary = batch.summary();
    println!();
    println!(
        "{} {} scanned, {} loaded, {} skipped, {} failed, {} text unit(s)",
        "Summary:".cyan().bold(),
        summary.scanned,
        summary.loaded,
        summary.skipped,
        summary.failed,
        summary.units
    );
}

/// Hand the units over, stopping on an empty corpus.
pub fn into_units(batch: Batch, target: &Target) -> Result<Vec<LoadedUnit>> {
    match batch.into_corpus() {
        Ok(units) => Ok(units),
        Err(IngestError::EmptyCorpus { scanned }) => {
            let location = match target {
                Target::Directory(dir) => dir.display().to_string(),
                Target::File(file) => file.display().to_string(),
            };
            anyhow::bail!(
                "No usable content in {} ({} file(s) scanned). Supported formats: {}.",
                location,
                scanned,
                Strategy::SUPPORTED_EXTENSIONS.join(", ")
            )
        }
        Err(e) => Err(e.into()),
    }
}

/// Chunk and embed the units.
pub fn build_knowledge_base(
    rt: &Runtime,
    config: &Config,
    units: &[LoadedUnit],
    model: Option<String>,
) -> Result<KnowledgeBase> {
    let client =
        OllamaClient::from_config(&config.ollama).context("Failed to create Ollama client")?;

    if !rt.block_on(client.is_available()) {
        anyhow::bail!(
            "Ollama is not running at {}. Start it with 'ollama serve'.",
            config.ollama.host
        );
    }

    let mut rag_config = RagConfig::from_settings(&config.ollama, &config.rag);
    if let Some(model) = model {
        rag_config = rag_config.with_model(model);
    }

    for name in [&rag_config.model, &rag_config.embedding_model] {
        match rt.block_on(client.has_model(name)) {
            Ok(true) => {}
            Ok(false) => println!(
                "{} Model {} is not pulled. Run 'ollama pull {}'.",
                "Warning:".yellow().bold(),
                name.cyan(),
                name
            ),
            Err(e) => tracing::warn!("Could not list models: {}", e),
        }
    }

    let chunker = Chunker::new(ChunkConfig::from_chunking_config(&config.chunking));
    let chunks = chunker.chunk_units(units);

    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Embedding [{bar:40.cyan/blue}] {pos}/{len} chunks")?
            .progress_chars("#>-"),
    );

    let kb = rt
        .block_on(KnowledgeBase::build(client, rag_config, chunks, |done, _| {
            pb.set_position(done as u64)
        }))
        .context("Failed to embed documents")?;

    pb.finish_and_clear();
    println!(
        "{} {} chunks indexed with {}",
        "Ready:".green().bold(),
        kb.index().len(),
        kb.config().embedding_model
    );

    Ok(kb)
}

/// Print the sources of an answer.
pub fn print_sources(sources: &[SourceReference]) {
    if sources.is_empty() {
        return;
    }
    println!("{}", "─".repeat(70));
    println!("{}", "Sources:".cyan().bold());
    for (i, source) in sources.iter().enumerate() {
        println!(
            "  {}. {} (similarity: {:.0}%)",
            i + 1,
            source.source.white(),
            source.similarity * 100.0
        );
        println!("     {}", source.chunk_content.replace('\n', " ").dimmed());
    }
}
