use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

const ENV_PREFIX: &str = "DOCSIFT";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: IngestConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub statements: StatementConfig,
}

impl AppConfig {
    /// Load configuration from defaults and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(None, ENV_PREFIX)
    }

    /// Load configuration from environment with custom prefix
    pub fn load_from_env(prefix: &str) -> Result<Self, ConfigError> {
        Self::build(None, prefix)
    }

    /// Load configuration from file with environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::build(Some(path.as_ref()), ENV_PREFIX)
    }

    fn build(path: Option<&Path>, prefix: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("statements.keywords"),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject values the pipeline and analytics cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        self.pipeline.validate()?;
        self.summarizer.validate()?;
        self.analytics.validate()?;
        if self.statements.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(AppError::validation("at least one statement keyword is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Memory,
}

/// Where documents, extracted text and blobs are kept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_blob_dir")]
    pub blob_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
            blob_dir: default_blob_dir(),
        }
    }
}

impl StorageConfig {
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            backend: StorageBackend::Json,
            data_dir: root.to_path_buf(),
            blob_dir: root.join("uploads"),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("corpus.json")
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".docsift")
}

fn default_blob_dir() -> PathBuf {
    PathBuf::from(".docsift/uploads")
}

/// Per-upload pipeline limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_max_document_size")]
    pub max_document_size: usize,
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_document_size: default_max_document_size(),
            parallelism: default_parallelism(),
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.max_document_size == 0 {
            return Err(AppError::validation("max_document_size must be greater than 0"));
        }
        if self.parallelism == 0 {
            return Err(AppError::validation("parallelism must be greater than 0"));
        }
        Ok(())
    }
}

fn default_max_document_size() -> usize {
    50 * 1024 * 1024 // 50MB
}

fn default_parallelism() -> usize {
    num_cpus::get().clamp(1, 8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SummarizerBackend {
    #[default]
    Extractive,
    Http,
}

/// Chunking and length parameters for summarization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default)]
    pub backend: SummarizerBackend,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_chunk_words")]
    pub chunk_words: usize,
    #[serde(default = "default_min_chunk_words")]
    pub min_chunk_words: usize,
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            backend: SummarizerBackend::default(),
            endpoint: None,
            api_token: None,
            chunk_words: default_chunk_words(),
            min_chunk_words: default_min_chunk_words(),
            min_length: default_min_length(),
            max_length: default_max_length(),
        }
    }
}

impl SummarizerConfig {
    pub fn with_chunk_words(mut self, words: usize) -> Self {
        self.chunk_words = words;
        self
    }

    pub fn with_lengths(mut self, min_length: usize, max_length: usize) -> Self {
        self.min_length = min_length;
        self.max_length = max_length;
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_words == 0 {
            return Err(AppError::validation("chunk_words must be greater than 0"));
        }
        if self.min_chunk_words > self.chunk_words {
            return Err(AppError::validation("min_chunk_words cannot exceed chunk_words"));
        }
        if self.min_length > self.max_length {
            return Err(AppError::validation("min_length cannot exceed max_length"));
        }
        if self.backend == SummarizerBackend::Http && self.endpoint.is_none() {
            return Err(AppError::validation("the http summarizer requires an endpoint"));
        }
        Ok(())
    }
}

fn default_chunk_words() -> usize {
    900
}

fn default_min_chunk_words() -> usize {
    30
}

fn default_min_length() -> usize {
    30
}

fn default_max_length() -> usize {
    130
}

/// Optical character recognition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_tesseract_path")]
    pub tesseract_path: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: default_tesseract_path(),
            language: default_language(),
        }
    }
}

fn default_tesseract_path() -> String {
    "tesseract".to_string()
}

fn default_language() -> String {
    "eng".to_string()
}

/// Corpus analytics parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_contamination")]
    pub contamination: f64,
    #[serde(default = "default_max_clusters")]
    pub max_clusters: usize,
    #[serde(default = "default_n_init")]
    pub n_init: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            contamination: default_contamination(),
            max_clusters: default_max_clusters(),
            n_init: default_n_init(),
            seed: None,
        }
    }
}

impl AnalyticsConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(AppError::validation("contamination must be in (0, 0.5]"));
        }
        if self.max_clusters == 0 {
            return Err(AppError::validation("max_clusters must be greater than 0"));
        }
        if self.n_init == 0 {
            return Err(AppError::validation("n_init must be greater than 0"));
        }
        Ok(())
    }
}

fn default_contamination() -> f64 {
    0.2
}

fn default_max_clusters() -> usize {
    3
}

fn default_n_init() -> usize {
    10
}

/// Keywords that mark a sentence as a policy statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementConfig {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

impl Default for StatementConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
        }
    }
}

fn default_keywords() -> Vec<String> {
    vec!["policy".to_string(), "rule".to_string(), "directive".to_string()]
}
