//! TOML configuration.
//!
//! Every section is optional; a missing file section takes the defaults
//! below. After parsing, `TOP_K`, `CHUNK_TOKENS`, and `CHUNK_OVERLAP`
//! from the environment override the file when they parse, and the
//! result is validated.
//!
//! ```toml
//! [chunking]
//! chunk_tokens = 512
//! chunk_overlap = 64
//!
//! [retrieval]
//! top_k = 6
//! graph_threshold = 3
//!
//! [vector]
//! backend = "sqlite"            # memory | sqlite
//! path = "./data/vectors.sqlite"
//!
//! [graph]
//! backend = "neo4j"             # memory | neo4j
//! uri = "bolt://localhost:7687"
//! user = "neo4j"
//! password_env = "NEO4J_PASSWORD"
//!
//! [embedding]
//! provider = "ollama"           # stub | openai | ollama | local
//! model = "nomic-embed-text"
//! dims = 768
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config path used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./config/desk.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub vector: VectorConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_tokens")]
    pub chunk_tokens: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_tokens: default_chunk_tokens(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_tokens() -> usize {
    512
}
fn default_chunk_overlap() -> usize {
    64
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_graph_threshold")]
    pub graph_threshold: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            graph_threshold: default_graph_threshold(),
        }
    }
}

fn default_top_k() -> usize {
    6
}
fn default_graph_threshold() -> u64 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct VectorConfig {
    #[serde(default = "default_memory_backend")]
    pub backend: String,
    #[serde(default = "default_vector_path")]
    pub path: PathBuf,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: default_vector_path(),
        }
    }
}

fn default_memory_backend() -> String {
    "memory".to_string()
}
fn default_vector_path() -> PathBuf {
    PathBuf::from("./data/vectors.sqlite")
}

#[derive(Debug, Deserialize, Clone)]
pub struct GraphConfig {
    #[serde(default = "default_memory_backend")]
    pub backend: String,
    #[serde(default = "default_neo4j_uri")]
    pub uri: String,
    #[serde(default = "default_neo4j_user")]
    pub user: String,
    /// Name of the environment variable holding the password.
    #[serde(default = "default_password_env")]
    pub password_env: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            uri: default_neo4j_uri(),
            user: default_neo4j_user(),
            password_env: default_password_env(),
        }
    }
}

fn default_neo4j_uri() -> String {
    "bolt://localhost:7687".to_string()
}
fn default_neo4j_user() -> String {
    "neo4j".to_string()
}
fn default_password_env() -> String {
    "NEO4J_PASSWORD".to_string()
}

impl GraphConfig {
    /// Read the password from `password_env`.
    pub fn password(&self) -> Result<String> {
        std::env::var(&self.password_env)
            .with_context(|| format!("{} environment variable not set", self.password_env))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    /// Base URL for the `ollama` provider.
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dims: default_dims(),
            url: default_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_provider() -> String {
    "stub".to_string()
}
fn default_model() -> String {
    "nomic-embed-text".to_string()
}
fn default_dims() -> usize {
    384
}
fn default_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_max_retries() -> u32 {
    2
}

/// Load, override from the process environment, and validate.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content, |key| std::env::var(key).ok())
}

/// Load `path` if given, else the default path if it exists, else defaults.
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                load_config(default)
            } else {
                tracing::debug!("no config file at {}; using defaults", DEFAULT_CONFIG_PATH);
                let mut config = Config::default();
                apply_overrides(&mut config, |key| std::env::var(key).ok());
                validate(&config)?;
                Ok(config)
            }
        }
    }
}

/// Parse TOML text, apply overrides from `lookup`, and validate.
pub fn parse_config<F>(content: &str, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: Config =
        toml::from_str(content).with_context(|| "Failed to parse config file")?;
    apply_overrides(&mut config, lookup);
    validate(&config)?;
    Ok(config)
}

/// Apply `TOP_K`, `CHUNK_TOKENS`, and `CHUNK_OVERLAP`. Values that do not
/// parse, or are out of range, are ignored.
pub fn apply_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let positive = |key: &str| {
        lookup(key)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0)
    };
    if let Some(v) = positive("TOP_K") {
        config.retrieval.top_k = v;
    }
    if let Some(v) = positive("CHUNK_TOKENS") {
        config.chunking.chunk_tokens = v;
    }
    if let Some(v) = lookup("CHUNK_OVERLAP").and_then(|v| v.trim().parse::<usize>().ok()) {
        config.chunking.chunk_overlap = v;
    }
}

pub fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_tokens == 0 {
        bail!("chunking.chunk_tokens must be > 0");
    }
    if config.retrieval.top_k < 1 {
        bail!("retrieval.top_k must be >= 1");
    }
    if config.retrieval.graph_threshold < 1 {
        bail!("retrieval.graph_threshold must be >= 1");
    }

    match config.vector.backend.as_str() {
        "memory" | "sqlite" => {}
        other => bail!(
            "Unknown vector backend: '{}'. Must be memory or sqlite.",
            other
        ),
    }
    match config.graph.backend.as_str() {
        "memory" | "neo4j" => {}
        other => bail!("Unknown graph backend: '{}'. Must be memory or neo4j.", other),
    }
    match config.embedding.provider.as_str() {
        "stub" | "openai" | "ollama" | "local" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be stub, openai, ollama, or local.",
            other
        ),
    }
    if config.embedding.dims == 0 {
        bail!("embedding.dims must be > 0");
    }
    if config.embedding.model.trim().is_empty() {
        bail!("embedding.model must not be empty");
    }
    Ok(())
}
