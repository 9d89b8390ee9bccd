//! Docqa CLI - Ask questions about a folder of documents

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::SourceArgs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Docqa - Ask questions about a folder of documents
#[derive(Parser)]
#[command(name = "docqa")]
#[command(author = "Lalo Morales <lalomorales22@github.com>")]
#[command(version)]
#[command(about = "Ask questions about a folder of documents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Docqa (create config and documents folder)
    Init,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Load the documents and report what could be read
    Scan {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive question/answer session
    Chat {
        #[command(flatten)]
        source: SourceArgs,

        /// Model to use for answers (default: from config)
        #[arg(short, long)]
        model: Option<String>,

        /// Stream answers as they're generated
        #[arg(long)]
        stream: bool,

        /// Don't list the sources of each answer
        #[arg(long)]
        no_sources: bool,
    },

    /// Ask a single question
    Ask {
        /// Your question
        question: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Model to use for the answer (default: from config)
        #[arg(short, long)]
        model: Option<String>,

        /// Stream the answer as it's generated
        #[arg(long)]
        stream: bool,

        /// Don't list the sources of the answer
        #[arg(long)]
        no_sources: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the config file location
    Path,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., ollama.model)
        key: String,

        /// Value to set
        value: String,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docqa=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docqa=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(),
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Set { key, value } => commands::config::set(&key, &value),
        },
        Commands::Scan { source, json } => commands::scan::run(&source, json),
        Commands::Chat {
            source,
            model,
            stream,
            no_sources,
        } => commands::chat::run(&source, model, stream, !no_sources),
        Commands::Ask {
            question,
            source,
            model,
            stream,
            no_sources,
        } => commands::ask::run(&question, &source, model, stream, !no_sources),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
