//! Chat command - interactive question answering over the documents.

use super::{corpus, get_paths, load_config, SourceArgs};
use anyhow::{Context, Result};
use colored::Colorize;
use docqa_core::Conversation;
use docqa_ollama::{KnowledgeBase, OllamaError};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

/// One line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput {
    Exit,
    Empty,
    Question(String),
}

impl ChatInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            ChatInput::Empty
        } else if line.eq_ignore_ascii_case("exit") {
            ChatInput::Exit
        } else {
            ChatInput::Question(line.to_string())
        }
    }
}

/// Run the interactive session.
pub fn run(source: &SourceArgs, model: Option<String>, stream: bool, show_sources: bool) -> Result<()> {
    let config = load_config()?;
    let target = source.target(&config);

    let batch = corpus::load(&config, &target)?;
    corpus::print_report(&batch);
    println!();
    let units = corpus::into_units(batch, &target)?;

    let rt = Runtime::new().context("Failed to create async runtime")?;
    let kb = corpus::build_knowledge_base(&rt, &config, &units, model)?;

    let paths = get_paths()?;
    let mut rl = DefaultEditor::new()?;
    let _ = rl.load_history(&paths.history_file);

    println!();
    println!("{}", "Document Chat".cyan().bold());
    println!("{}", "─".repeat(50));
    println!("Ask a question about your documents. Type {} to quit.", "exit".cyan());
    println!();

    let mut conversation = Conversation::new();

    loop {
        let readline = rl.readline(&format!("{} ", "?".green().bold()));
        match readline {
            Ok(line) => match ChatInput::parse(&line) {
                ChatInput::Empty => continue,
                ChatInput::Exit => break,
                ChatInput::Question(question) => {
                    let _ = rl.add_history_entry(question.as_str());
                    match answer(&rt, &kb, &question, &conversation, stream, show_sources) {
                        Ok(reply) => conversation.record(question, reply),
                        Err(e) => {
                            report_error(&e);
                            if e.is_setup_error() {
                                break;
                            }
                        }
                    }
                    println!();
                }
            },
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{} {:?}", "Error:".red(), err);
                break;
            }
        }
    }

    if let Some(parent) = paths.history_file.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = rl.save_history(&paths.history_file);

    if !conversation.is_empty() {
        match save_transcript(&conversation, &paths.transcript_dir) {
            Ok(path) => println!("Transcript saved to {}", path.display().to_string().dimmed()),
            Err(e) => tracing::warn!("Could not save transcript: {:#}", e),
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Answer one question and print it. Returns the full answer text.
pub(crate) fn answer(
    rt: &Runtime,
    kb: &KnowledgeBase,
    question: &str,
    conversation: &Conversation,
    stream: bool,
    show_sources: bool,
) -> Result<String, OllamaError> {
    let (reply, sources) = if stream {
        let mut stream = rt.block_on(kb.ask_stream(question, conversation))?;

        print!("{} ", "Answer:".green().bold());
        io::stdout().flush().ok();

        let mut reply = String::new();
        let streamed = rt.block_on(async {
            while let Some(piece) = stream.receiver.recv().await {
                let piece = piece?;
                print!("{}", piece);
                io::stdout().flush().ok();
                reply.push_str(&piece);
            }
            Ok::<(), OllamaError>(())
        });
        println!();
        // A reply cut short is not recorded as a turn
        streamed?;

        (reply, stream.sources)
    } else {
        let response = rt.block_on(kb.ask(question, conversation))?;

        println!("{}", "Answer:".green().bold());
        println!("{}", response.answer);

        (response.answer, response.sources)
    };

    if show_sources {
        println!();
        corpus::print_sources(&sources);
    }

    Ok(reply)
}

pub(crate) fn report_error(e: &OllamaError) {
    match e {
        OllamaError::NoContext => {
            println!(
                "{} No relevant content found in your documents for this question.",
                "Note:".yellow()
            );
            println!("  Try rephrasing it or mention a specific term from the documents.");
        }
        other => eprintln!("{} {}", "Error:".red(), other),
    }
}

/// Write the conversation as JSON into `dir`.
fn save_transcript(conversation: &Conversation, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).context("Failed to create transcript directory")?;
    let name = format!(
        "chat-{}.json",
        conversation.started_at.format("%Y%m%d-%H%M%S")
    );
    let path = dir.join(name);
    std::fs::write(&path, conversation.to_json()?).context("Failed to write transcript")?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exit_is_case_insensitive() {
        assert_eq!(ChatInput::parse("exit"), ChatInput::Exit);
        assert_eq!(ChatInput::parse("EXIT"), ChatInput::Exit);
        assert_eq!(ChatInput::parse("  Exit \n"), ChatInput::Exit);
    }

    #[test]
    fn test_questions_and_blank_lines() {
        assert_eq!(ChatInput::parse("   "), ChatInput::Empty);
        assert_eq!(
            ChatInput::parse(" How do I exit the wizard? "),
            ChatInput::Question("How do I exit the wizard?".to_string())
        );
        assert_eq!(
            ChatInput::parse("exit now"),
            ChatInput::Question("exit now".to_string())
        );
    }

    #[test]
    fn test_save_transcript() {
        let dir = TempDir::new().unwrap();
        let mut conversation = Conversation::new();
        conversation.record("What is the entity ID?", "The site URL.");

        let path = save_transcript(&conversation, &dir.path().join("transcripts")).unwrap();

        let saved: Conversation =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.turns.len(), 1);
        assert_eq!(saved.turns[0].answer, "The site URL.");
    }
}
