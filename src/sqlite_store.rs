//! SQLite-backed [`ChunkStore`] and [`Retriever`].
//!
//! Documents and chunks live in plain tables; chunk text is mirrored into
//! an FTS5 table so retrieval can rank with `bm25`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::{Row, SqliteConnection, SqlitePool};

use ragweave_core::models::{Chunk, ChunkType, Document};
use ragweave_core::store::{query_terms, ChunkStore, RetrievedChunk, Retriever, WriteMode};

use crate::config::Config;
use crate::{db, migrate};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database and apply migrations.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// FTS5 query matching any of the query's terms.
fn fts_query(query: &str) -> Option<String> {
    let terms = query_terms(query);
    if terms.is_empty() {
        return None;
    }
    Some(
        terms
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(" OR "),
    )
}

async fn insert_documents(
    conn: &mut SqliteConnection,
    docs: &[Document],
    mode: WriteMode,
    now: i64,
) -> Result<()> {
    if mode == WriteMode::Replace {
        sqlx::query("DELETE FROM documents").execute(&mut *conn).await?;
    }

    for doc in docs {
        sqlx::query(
            r#"
            INSERT INTO documents (doc_id, file_name, file_type, file_size,
                                   extracted_text, word_count, char_count, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(doc.doc_id)
        .bind(&doc.file_name)
        .bind(doc.file_type.as_str())
        .bind(doc.file_size as i64)
        .bind(&doc.extracted_text)
        .bind(doc.word_count as i64)
        .bind(doc.char_count as i64)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_chunks(
    conn: &mut SqliteConnection,
    chunks: &[Chunk],
    mode: WriteMode,
    now: i64,
) -> Result<()> {
    if mode == WriteMode::Replace {
        sqlx::query("DELETE FROM chunks_fts").execute(&mut *conn).await?;
        sqlx::query("DELETE FROM chunks").execute(&mut *conn).await?;
    }

    for chunk in chunks {
        let inserted = sqlx::query(
            r#"
            INSERT INTO chunks (chunk_id, doc_id, file_name, chunk_text,
                                chunk_size, chunk_type, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(chunk.chunk_id)
        .bind(chunk.doc_id)
        .bind(&chunk.file_name)
        .bind(&chunk.chunk_text)
        .bind(chunk.chunk_size as i64)
        .bind(chunk.chunk_type.as_str())
        .bind(now)
        .execute(&mut *conn)
        .await?;

        sqlx::query("INSERT INTO chunks_fts (row_id, chunk_text) VALUES (?, ?)")
            .bind(inserted.last_insert_rowid())
            .bind(&chunk.chunk_text)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl ChunkStore for SqliteStore {
    async fn write_documents(&self, docs: &[Document], mode: WriteMode) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;
        insert_documents(&mut *tx, docs, mode, now).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn write_chunks(&self, chunks: &[Chunk], mode: WriteMode) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;
        insert_chunks(&mut *tx, chunks, mode, now).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn write_run(&self, docs: &[Document], chunks: &[Chunk], mode: WriteMode) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;
        insert_documents(&mut *tx, docs, mode, now).await?;
        insert_chunks(&mut *tx, chunks, mode, now).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn max_document_id(&self) -> Result<i64> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(doc_id) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(max.unwrap_or(0))
    }

    async fn max_chunk_id(&self) -> Result<i64> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(chunk_id) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(max.unwrap_or(0))
    }

    async fn list_chunks(&self) -> Result<Vec<Chunk>> {
        let rows = sqlx::query(
            r#"
            SELECT chunk_id, doc_id, file_name, chunk_text, chunk_size, chunk_type
            FROM chunks
            ORDER BY chunk_id, row_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let label: String = row.get("chunk_type");
                let chunk_type = ChunkType::parse(&label)
                    .ok_or_else(|| anyhow!("unknown chunk_type in database: {}", label))?;
                let chunk_size: i64 = row.get("chunk_size");
                Ok(Chunk {
                    chunk_id: row.get("chunk_id"),
                    doc_id: row.get("doc_id"),
                    file_name: row.get("file_name"),
                    chunk_text: row.get("chunk_text"),
                    chunk_size: chunk_size as usize,
                    chunk_type,
                })
            })
            .collect()
    }

    async fn count_chunks(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl Retriever for SqliteStore {
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievedChunk>> {
        let Some(match_expr) = fts_query(query) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            r#"
            SELECT c.chunk_text, c.file_name
            FROM chunks_fts
            JOIN chunks c ON c.row_id = chunks_fts.row_id
            WHERE chunks_fts MATCH ?
            ORDER BY rank
            LIMIT ?
            "#,
        )
        .bind(&match_expr)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| RetrievedChunk {
                text: row.get("chunk_text"),
                source: row.get("file_name"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fts_query_quotes_terms() {
        assert_eq!(
            fts_query("Battery life? \"AND\" drop").as_deref(),
            Some("\"battery\" OR \"life\" OR \"and\" OR \"drop\"")
        );
        assert_eq!(fts_query("?!"), None);
    }
}
