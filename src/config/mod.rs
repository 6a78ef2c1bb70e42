//! Configuration management for Concord
//!
//! Loads a TOML file, applies `CONCORD_SECTION__KEY` environment overrides and
//! validates the result. Trust policy (source weights, authority order) lives
//! here so it can change without rebuilding the binary.

use crate::analysis::ChatClientConfig;
use crate::corpus::{AuthorityPolicy, SourceClass, SourceWeights};
use crate::error::{ConcordError, Result};
use crate::pipeline::PipelineSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod validator;

pub use validator::ConfigValidator;

pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub reranker: RerankerConfig,
    pub reasoning: ReasoningConfig,
    pub authority: AuthorityConfig,
    pub corpus: CorpusConfig,
    pub report: ReportConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    pub batch_size: usize,
}

/// Retrieval and weighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub rerank_top_k: usize,
    /// Source class name -> similarity multiplier
    pub source_weights: BTreeMap<String, f32>,
    /// Weight for classes missing from `source_weights`
    #[serde(default = "default_weight")]
    pub default_weight: f32,
}

fn default_weight() -> f32 {
    crate::corpus::NEUTRAL_WEIGHT
}

/// Reranker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    /// "bge-reranker-base", "jina-reranker-v1-turbo-en" or "term-overlap"
    pub model: String,
}

/// Reasoning service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Authority order, highest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityConfig {
    pub order: Vec<String>,
}

/// Corpus location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    pub data_dir: PathBuf,
}

/// Query log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub log_path: PathBuf,
    pub preview_chars: usize,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConcordError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConcordError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse, apply env overrides and validate
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConcordError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: CONCORD_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    fn apply_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("CONCORD_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        let parse_usize = |value: &str| {
            value
                .parse::<usize>()
                .map_err(|_| ConcordError::InvalidConfigValue {
                    path: path.to_string(),
                    message: format!("Cannot parse '{}' as an integer", value),
                })
        };

        match path {
            "EMBEDDING__MODEL" => self.embedding.model = value.to_string(),
            "RERANKER__MODEL" => self.reranker.model = value.to_string(),
            "REASONING__MODEL" => self.reasoning.model = value.to_string(),
            "REASONING__BASE_URL" => self.reasoning.base_url = value.to_string(),
            "REASONING__TIMEOUT_SECS" => {
                self.reasoning.timeout_secs = parse_usize(value)? as u64;
            }
            "RETRIEVAL__TOP_K" => self.retrieval.top_k = parse_usize(value)?,
            "RETRIEVAL__RERANK_TOP_K" => self.retrieval.rerank_top_k = parse_usize(value)?,
            "CORPUS__DATA_DIR" => self.corpus.data_dir = PathBuf::from(value),
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Source weights as typed policy
    pub fn source_weights(&self) -> Result<SourceWeights> {
        Ok(SourceWeights::from_named(&self.retrieval.source_weights)?
            .with_fallback(self.retrieval.default_weight))
    }

    /// Authority order as typed policy
    pub fn authority_policy(&self) -> Result<AuthorityPolicy> {
        let order = self
            .authority
            .order
            .iter()
            .map(|name| name.parse::<SourceClass>())
            .collect::<Result<Vec<_>>>()?;
        AuthorityPolicy::new(order)
    }

    pub fn pipeline_settings(&self) -> Result<PipelineSettings> {
        Ok(PipelineSettings {
            retrieve_top_k: self.retrieval.top_k,
            rerank_top_k: self.retrieval.rerank_top_k,
            source_weights: self.source_weights()?,
        })
    }

    /// Chat client settings; the API key is read from `api_key_env` if set
    pub fn chat_client_config(&self) -> ChatClientConfig {
        let api_key = std::env::var(&self.reasoning.api_key_env)
            .ok()
            .filter(|key| !key.is_empty());

        ChatClientConfig {
            base_url: self.reasoning.base_url.clone(),
            model: self.reasoning.model.clone(),
            api_key,
            temperature: self.reasoning.temperature,
            timeout: Duration::from_secs(self.reasoning.timeout_secs),
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConcordError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("concord").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        let source_weights = SourceClass::ALL
            .iter()
            .map(|class| (class.as_str().to_string(), SourceWeights::default().weight(*class)))
            .collect();

        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
            },
            embedding: EmbeddingConfig {
                model: "all-MiniLM-L6-v2".to_string(),
                batch_size: 32,
            },
            retrieval: RetrievalConfig {
                top_k: 5,
                rerank_top_k: 3,
                source_weights,
                default_weight: default_weight(),
            },
            reranker: RerankerConfig {
                model: "bge-reranker-base".to_string(),
            },
            reasoning: ReasoningConfig {
                base_url: "http://localhost:1234/v1".to_string(),
                model: "qwen2.5-vl-7b".to_string(),
                api_key_env: "CONCORD_REASONING_API_KEY".to_string(),
                temperature: 0.2,
                timeout_secs: 60,
            },
            authority: AuthorityConfig {
                order: AuthorityPolicy::default()
                    .order()
                    .iter()
                    .map(|class| class.as_str().to_string())
                    .collect(),
            },
            corpus: CorpusConfig {
                data_dir: PathBuf::from("data"),
            },
            report: ReportConfig {
                log_path: PathBuf::from("rag_logs.jsonl"),
                preview_chars: crate::report::DEFAULT_PREVIEW_CHARS,
            },
        }
    }
}
