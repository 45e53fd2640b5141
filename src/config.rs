use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use ragweave_core::chunk::{ChunkingMode, ChunkingOptions};
use ragweave_core::store::WriteMode;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub agent: Option<AgentConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default)]
    pub mode: ChunkingMode,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_chunk_size() -> usize {
    200
}
fn default_overlap() -> usize {
    50
}

impl ChunkingConfig {
    pub fn options(&self) -> ChunkingOptions {
        match self.mode {
            ChunkingMode::Window => ChunkingOptions::window(self.chunk_size, self.overlap),
            ChunkingMode::PerDocument => ChunkingOptions::per_document(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default)]
    pub write_mode: WriteMode,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            write_mode: WriteMode::Replace,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("docs")
}

fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.txt".to_string(),
        "**/*.md".to_string(),
        "**/*.pdf".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    3
}

/// Which body framing the agent endpoint is asked for.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentTransport {
    /// `data: {json}` lines terminated by `[DONE]`.
    #[default]
    Stream,
    /// One JSON array of event records.
    Batch,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub base_url: String,
    pub database: String,
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub transport: AgentTransport,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl AgentConfig {
    /// `{base_url}/api/v2/databases/{db}/schemas/{schema}/agents/{name}:run`
    pub fn endpoint(&self) -> String {
        format!(
            "{}/api/v2/databases/{}/schemas/{}/agents/{}:run",
            self.base_url.trim_end_matches('/'),
            self.database,
            self.schema,
            self.name
        )
    }

    fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            anyhow::bail!("agent.base_url must start with http:// or https://");
        }
        for (field, value) in [
            ("database", &self.database),
            ("schema", &self.schema),
            ("name", &self.name),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("agent.{} must not be empty", field);
            }
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("agent.timeout_secs must be > 0");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    config
        .chunking
        .options()
        .validate()
        .with_context(|| "Invalid [chunking] section")?;

    // Validate retrieval
    if !(1..=50).contains(&config.retrieval.limit) {
        anyhow::bail!("retrieval.limit must be in [1, 50]");
    }

    if config.ingest.include_globs.is_empty() {
        anyhow::bail!("ingest.include_globs must not be empty");
    }

    if let Some(agent) = &config.agent {
        agent.validate()?;
    }

    Ok(config)
}
