//! Ask command - answer one question about the documents.

use super::chat::{answer, report_error};
use super::{corpus, load_config, SourceArgs};
use anyhow::{Context, Result};
use colored::Colorize;
use docqa_core::Conversation;
use tokio::runtime::Runtime;

/// Run the ask command.
pub fn run(
    question: &str,
    source: &SourceArgs,
    model: Option<String>,
    stream: bool,
    show_sources: bool,
) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        anyhow::bail!("The question is empty.");
    }

    let config = load_config()?;
    let target = source.target(&config);

    let batch = corpus::load(&config, &target)?;
    let summary = batch.summary();
    println!(
        "{} {} of {} file(s), {} text unit(s)",
        "Loaded:".cyan(),
        summary.loaded,
        summary.scanned,
        summary.units
    );
    for report in batch.failures() {
        println!("  {} {}: {}", "✗".red(), report.file.file_name, report.outcome);
    }
    let units = corpus::into_units(batch, &target)?;

    let rt = Runtime::new().context("Failed to create async runtime")?;
    let kb = corpus::build_knowledge_base(&rt, &config, &units, model)?;

    println!();
    println!("{} {}", "Question:".cyan().bold(), question);
    println!("{}", "─".repeat(70));

    let conversation = Conversation::new();
    if let Err(e) = answer(&rt, &kb, question, &conversation, stream, show_sources) {
        report_error(&e);
        if !matches!(e, docqa_ollama::OllamaError::NoContext) {
            anyhow::bail!("Failed to generate answer");
        }
    }

    Ok(())
}
