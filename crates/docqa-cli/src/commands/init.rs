//! Initialize Docqa.

use super::get_paths;
use anyhow::{Context, Result};
use colored::Colorize;
use docqa_config::Config;

pub fn run() -> Result<()> {
    let paths = get_paths()?;

    if paths.is_initialized() {
        println!("{} Docqa is already initialized.", "Note:".yellow().bold());
        println!("  Config: {}", paths.config_file.display());
        return Ok(());
    }

    println!("{}", "Initializing Docqa...".cyan().bold());

    paths.ensure_dirs().context("Failed to create directories")?;
    println!("  {} Created directories", "✓".green());

    Config::create_default_file(&paths.config_file).context("Failed to create config file")?;
    println!(
        "  {} Created config: {}",
        "✓".green(),
        paths.config_file.display()
    );

    let config = Config::load_from(&paths.config_file).context("Failed to read new config")?;
    let documents = config.documents_path();
    std::fs::create_dir_all(&documents)
        .with_context(|| format!("Failed to create {}", documents.display()))?;
    println!(
        "  {} Documents folder: {}",
        "✓".green(),
        documents.display()
    );

    println!();
    println!("{}", "Docqa initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Copy pdf, txt, md, docx or xlsx files into the documents folder");
    println!("  2. Check what can be read: {}", "docqa scan".cyan());
    println!("  3. Start asking: {}", "docqa chat".cyan());

    Ok(())
}
