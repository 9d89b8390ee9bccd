//! Docqa Ollama - Ollama integration for embeddings, retrieval, and
//! conversational question answering.
//!
//! This crate provides an async client for Ollama's API, an in-memory
//! vector index, and a [`KnowledgeBase`] that answers follow-up questions
//! against a caller-owned conversation.

mod client;
mod error;
mod index;
pub mod rag;
mod types;

pub use client::OllamaClient;
pub use error::{OllamaError, OllamaResult};
pub use index::{cosine_similarity, IndexedChunk, SearchHit, VectorIndex};
pub use rag::{ContextItem, KnowledgeBase, RagConfig, RagResponse, RagStream, SourceReference};
pub use types::*;
