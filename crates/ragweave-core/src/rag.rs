//! Retrieval-augmented answering.
//!
//! The pipeline is: retrieve the top chunks for a question, join them into a
//! context block, wrap the question and context in a guarded prompt, and
//! hand the prompt to a completion backend.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreError;
use crate::store::{RetrievedChunk, Retriever};

/// Separator placed between retrieved chunks in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Fully qualified reference to a search service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePath {
    pub database: String,
    pub schema: String,
    pub service: String,
}

impl ServicePath {
    /// Parse `database.schema.service_name`.
    pub fn parse(path: &str) -> Result<Self, CoreError> {
        let parts: Vec<&str> = path.split('.').map(str::trim).collect();
        match parts.as_slice() {
            [db, schema, service]
                if !db.is_empty() && !schema.is_empty() && !service.is_empty() =>
            {
                Ok(Self {
                    database: db.to_string(),
                    schema: schema.to_string(),
                    service: service.to_string(),
                })
            }
            _ => Err(CoreError::InvalidServicePath(path.to_string())),
        }
    }
}

impl std::fmt::Display for ServicePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.schema, self.service)
    }
}

/// A language-model completion backend.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Answer plus the chunks it was conditioned on.
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<RetrievedChunk>,
}

pub fn build_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Wrap a question and its retrieved context in a prompt that keeps the
/// model inside the supplied documents.
pub fn build_prompt(question: &str, context: &str) -> String {
    let context = if context.trim().is_empty() {
        "(no matching documents were found)"
    } else {
        context
    };
    format!(
        "You are an assistant that answers questions about the user's documents.\n\
         \n\
         RULES:\n\
         1. Use only the information in the CONTEXT section below.\n\
         2. If the context does not contain the answer, reply: \
         \"I don't have enough information in the documents to answer that.\"\n\
         3. If the question is unrelated to the documents, reply: \
         \"I can only answer questions about the provided documents.\"\n\
         4. Do not invent facts or draw on outside knowledge.\n\
         \n\
         CONTEXT:\n\
         {context}\n\
         \n\
         QUESTION: {question}\n\
         \n\
         Give a clear answer grounded in the context above."
    )
}

/// Quote a string for use inside a single-quoted SQL literal.
pub fn escape_sql_literal(s: &str) -> String {
    s.replace('\'', "''")
}

/// SQL that runs a completion in the warehouse.
pub fn completion_sql(model: &str, prompt: &str) -> String {
    format!(
        "SELECT SNOWFLAKE.CORTEX.COMPLETE('{}', '{}')",
        escape_sql_literal(model),
        escape_sql_literal(prompt)
    )
}

/// Retrieve, prompt, complete.
pub async fn answer_question(
    retriever: &dyn Retriever,
    completer: &dyn Completer,
    question: &str,
    limit: usize,
) -> Result<RagAnswer> {
    if limit == 0 {
        bail!("retrieval limit must be >= 1");
    }
    if question.trim().is_empty() {
        bail!("question must not be empty");
    }

    let sources = retriever.retrieve(question, limit).await?;
    let prompt = build_prompt(question, &build_context(&sources));
    let answer = completer.complete(&prompt).await?;

    Ok(RagAnswer { answer, sources })
}
