//! Conversational retrieval over a set of document chunks.

use crate::client::OllamaClient;
use crate::error::{OllamaError, OllamaResult};
use crate::index::VectorIndex;
use crate::types::{ChatMessage, ChatRequest, GenerateOptions};
use docqa_config::{OllamaConfig, RagSettings};
use docqa_core::{Chunk, Conversation, Turn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Configuration for RAG queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Model to use for generation.
    pub model: String,
    /// Model to use for embeddings.
    pub embedding_model: String,
    /// Maximum number of context chunks to include.
    pub max_context_chunks: usize,
    /// Minimum similarity score for context (0.0 to 1.0).
    pub min_similarity: f32,
    /// Temperature for generation (0.0 to 2.0).
    pub temperature: f32,
    /// Prior turns sent along with a question.
    pub history_turns: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self::from_settings(&OllamaConfig::default(), &RagSettings::default())
    }
}

impl RagConfig {
    pub fn from_settings(ollama: &OllamaConfig, rag: &RagSettings) -> Self {
        Self {
            model: ollama.model.clone(),
            embedding_model: ollama.embedding_model.clone(),
            max_context_chunks: rag.max_context_chunks,
            min_similarity: rag.min_similarity,
            temperature: rag.temperature,
            history_turns: rag.history_turns,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// A reference to a source used in the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReference {
    /// File name plus page or sheet, e.g. `report.pdf (page 2)`.
    pub source: String,
    /// The chunk content that was used, shortened.
    pub chunk_content: String,
    /// Similarity score (0.0 to 1.0).
    pub similarity: f32,
}

/// Response from a RAG query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// The question used for retrieval after folding in the history.
    pub standalone_question: String,
    /// Sources used to generate the answer.
    pub sources: Vec<SourceReference>,
}

/// A streamed answer. Pieces of the reply arrive on `receiver`; an `Err`
/// item means the reply was cut short.
pub struct RagStream {
    pub receiver: mpsc::Receiver<OllamaResult<String>>,
    pub standalone_question: String,
    pub sources: Vec<SourceReference>,
}

/// Context item for RAG queries (from vector search results).
#[derive(Debug, Clone)]
pub struct ContextItem {
    /// The text content of the chunk.
    pub content: String,
    /// Similarity score.
    pub similarity: f32,
    /// Where the chunk came from.
    pub source: String,
}

impl ContextItem {
    fn reference(&self) -> SourceReference {
        SourceReference {
            source: self.source.clone(),
            chunk_content: truncate_content(&self.content, 200),
            similarity: self.similarity,
        }
    }
}

/// Build the system prompt for answering.
pub fn build_system_prompt() -> String {
    r#"You are a helpful assistant that answers questions about the user's documents using the provided context.

Guidelines:
- Base your answers on the context provided
- If the context doesn't contain enough information, say that you don't know
- Be concise but thorough
- When relevant, mention which source(s) your answer is based on
- Do not make up information not present in the context"#
        .to_string()
}

/// Messages asking the model to rewrite a follow-up as a standalone question.
pub fn build_condense_messages(question: &str, history: &[Turn]) -> Vec<ChatMessage> {
    let mut prompt = String::from(
        "Given the following conversation and a follow up question, rephrase the follow up \
         question to be a standalone question. Reply with the question only.\n\n",
    );
    prompt.push_str("Chat History:\n");
    for turn in history {
        prompt.push_str(&format!("Human: {}\nAssistant: {}\n", turn.question, turn.answer));
    }
    prompt.push_str(&format!("\nFollow Up Input: {}\nStandalone question:", question));

    vec![ChatMessage::user(prompt)]
}

/// Messages for the answering call: system prompt, prior turns, then the
/// question with its context.
pub fn build_answer_messages(
    question: &str,
    context: &[ContextItem],
    history: &[Turn],
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(build_system_prompt())];

    for turn in history {
        messages.push(ChatMessage::user(&turn.question));
        messages.push(ChatMessage::assistant(&turn.answer));
    }

    let mut prompt = String::new();
    prompt.push_str("Use the following context to answer the question. If the context doesn't contain relevant information, say so.\n\n");
    prompt.push_str("Context:\n");
    prompt.push_str("─────────────────────────────────────\n");

    for (i, item) in context.iter().enumerate() {
        prompt.push_str(&format!("\n[{}] From: {}\n", i + 1, item.source));
        prompt.push_str(&item.content);
        prompt.push('\n');
    }

    prompt.push_str("\n─────────────────────────────────────\n\n");
    prompt.push_str(&format!("Question: {}\n\n", question));
    prompt.push_str("Answer:");

    messages.push(ChatMessage::user(prompt));
    messages
}

/// Embedded chunks plus the client used to query them.
///
/// Immutable once built. Conversation state lives in the [`Conversation`]
/// passed to each call, so one knowledge base can serve several sessions.
pub struct KnowledgeBase {
    client: OllamaClient,
    config: RagConfig,
    index: VectorIndex,
}

impl KnowledgeBase {
    /// Embed every chunk. `progress` is called with (done, total) after each
    /// embedding.
    pub async fn build<F>(
        client: OllamaClient,
        config: RagConfig,
        chunks: Vec<Chunk>,
        mut progress: F,
    ) -> OllamaResult<Self>
    where
        F: FnMut(usize, usize),
    {
        if chunks.is_empty() {
            return Err(OllamaError::EmptyIndex);
        }

        let total = chunks.len();
        let mut index = VectorIndex::new();
        for (i, chunk) in chunks.into_iter().enumerate() {
            let embedding = client.embed(&config.embedding_model, &chunk.content).await?;
            index.insert(chunk, embedding)?;
            progress(i + 1, total);
        }

        info!(
            "Indexed {} chunks ({} dimensions) with {}",
            index.len(),
            index.dimensions().unwrap_or(0),
            config.embedding_model
        );

        Ok(Self {
            client,
            config,
            index,
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Fold the conversation into `question`. Without history the question
    /// is returned unchanged.
    pub async fn standalone_question(
        &self,
        question: &str,
        conversation: &Conversation,
    ) -> OllamaResult<String> {
        let history = conversation.recent(self.config.history_turns);
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let request = ChatRequest::new(&self.config.model, build_condense_messages(question, history))
            .with_options(GenerateOptions::new().with_temperature(0.0));
        let rewritten = self.client.chat(request).await?;
        let rewritten = rewritten.trim();

        if rewritten.is_empty() {
            Ok(question.to_string())
        } else {
            debug!("Condensed {:?} into {:?}", question, rewritten);
            Ok(rewritten.to_string())
        }
    }

    /// The chunks most relevant to `query`.
    pub async fn retrieve(&self, query: &str) -> OllamaResult<Vec<ContextItem>> {
        let embedding = self
            .client
            .embed(&self.config.embedding_model, query)
            .await?;

        let context: Vec<ContextItem> = self
            .index
            .search(
                &embedding,
                self.config.max_context_chunks,
                self.config.min_similarity,
            )
            .into_iter()
            .map(|hit| ContextItem {
                content: hit.chunk.content.clone(),
                similarity: hit.similarity,
                source: hit.chunk.label(),
            })
            .collect();

        debug!("Retrieved {} context chunk(s) for {:?}", context.len(), query);
        Ok(context)
    }

    /// Answer a question in the context of a conversation.
    ///
    /// The caller records the exchange afterwards with
    /// [`Conversation::record`].
    pub async fn ask(&self, question: &str, conversation: &Conversation) -> OllamaResult<RagResponse> {
        let (standalone_question, context) = self.prepare(question, conversation).await?;
        let history = conversation.recent(self.config.history_turns);

        let request = ChatRequest::new(
            &self.config.model,
            build_answer_messages(&standalone_question, &context, history),
        )
        .with_options(GenerateOptions::new().with_temperature(self.config.temperature));

        let answer = self.client.chat(request).await?;

        Ok(RagResponse {
            answer: answer.trim().to_string(),
            standalone_question,
            sources: context.iter().map(ContextItem::reference).collect(),
        })
    }

    /// Like [`KnowledgeBase::ask`] but the answer is streamed.
    pub async fn ask_stream(
        &self,
        question: &str,
        conversation: &Conversation,
    ) -> OllamaResult<RagStream> {
        let (standalone_question, context) = self.prepare(question, conversation).await?;
        let history = conversation.recent(self.config.history_turns);

        let request = ChatRequest::new(
            &self.config.model,
            build_answer_messages(&standalone_question, &context, history),
        )
        .with_stream(true)
        .with_options(GenerateOptions::new().with_temperature(self.config.temperature));

        let receiver = self.client.chat_stream(request).await?;

        Ok(RagStream {
            receiver,
            standalone_question,
            sources: context.iter().map(ContextItem::reference).collect(),
        })
    }

    async fn prepare(
        &self,
        question: &str,
        conversation: &Conversation,
    ) -> OllamaResult<(String, Vec<ContextItem>)> {
        let standalone = self.standalone_question(question, conversation).await?;
        let context = self.retrieve(&standalone).await?;
        if context.is_empty() {
            return Err(OllamaError::NoContext);
        }
        Ok((standalone, context))
    }
}

/// Truncate content to a maximum length, adding ellipsis if needed.
fn truncate_content(content: &str, max_len: usize) -> String {
    if content.chars().count() <= max_len {
        content.to_string()
    } else {
        let truncated: String = content.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
