//! Scan command - load the documents and report per-file outcomes.

use super::{corpus, load_config, SourceArgs, Target};
use anyhow::Result;
use colored::Colorize;
use docqa_ingest::Strategy;

pub fn run(source: &SourceArgs, json: bool) -> Result<()> {
    let config = load_config()?;
    let target = source.target(&config);

    if !json {
        match &target {
            Target::Directory(dir) => println!("{} {}", "Scanning:".cyan(), dir.display()),
            Target::File(file) => println!("{} {}", "Loading:".cyan(), file.display()),
        }
        println!();
    }

    let batch = corpus::load(&config, &target)?;

    if json {
        let output = serde_json::json!({
            "summary": batch.summary(),
            "fingerprint": batch.fingerprint(),
            "files": batch.reports,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    corpus::print_report(&batch);

    if batch.is_empty() {
        println!();
        println!(
            "{} No usable content was found. Supported formats: {}.",
            "Note:".yellow().bold(),
            Strategy::SUPPORTED_EXTENSIONS.join(", ")
        );
    }

    Ok(())
}
