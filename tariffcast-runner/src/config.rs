//! Serializable pipeline configuration.
//!
//! Every section has defaults, so an empty TOML document is a valid config:
//!
//! ```toml
//! [embedding]
//! dimension = 64
//!
//! [regressor]
//! ridge_lambda = 1.0
//! seed = 42
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use tariffcast_core::flow::TradeFlowConfig;
use tariffcast_core::graph::GraphSettings;
use tariffcast_core::text::ExtractorConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dimension: usize,
    /// Use a caller-supplied sentence encoder when one is registered.
    pub prefer_encoder: bool,
    /// Frequency-vectorizer vocabulary size; defaults to `dimension`.
    pub max_vocabulary: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: 64,
            prefer_encoder: true,
            max_vocabulary: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Documents generated for the synthetic fallback corpus.
    pub synthetic_corpus_size: usize,
    pub seed: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            synthetic_corpus_size: 200,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegressorConfig {
    pub ridge_lambda: f64,
    pub max_training_routes: usize,
    pub seed: u64,
}

impl Default for RegressorConfig {
    fn default() -> Self {
        Self {
            ridge_lambda: 1.0,
            max_training_routes: 5000,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PredictionConfig {
    pub max_alternative_sources: usize,
    /// Countries used when a policy names none.
    pub demo_pair: [String; 2],
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            max_alternative_sources: 5,
            demo_pair: ["United States".to_string(), "China".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Hyperparameters for every pipeline layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub embedding: EmbeddingConfig,
    pub extraction: ExtractionConfig,
    pub graph: GraphSettings,
    pub regressor: RegressorConfig,
    pub prediction: PredictionConfig,
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.dimension == 0 {
            return Err(ConfigError::Invalid("embedding.dimension must be > 0".into()));
        }
        if self.embedding.max_vocabulary == Some(0) {
            return Err(ConfigError::Invalid("embedding.max_vocabulary must be > 0".into()));
        }
        if self.extraction.synthetic_corpus_size == 0 {
            return Err(ConfigError::Invalid(
                "extraction.synthetic_corpus_size must be > 0".into(),
            ));
        }
        let lambda = self.regressor.ridge_lambda;
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "regressor.ridge_lambda must be finite and >= 0, got {lambda}"
            )));
        }
        if self.regressor.max_training_routes == 0 {
            return Err(ConfigError::Invalid(
                "regressor.max_training_routes must be > 0".into(),
            ));
        }
        if self.prediction.max_alternative_sources == 0 {
            return Err(ConfigError::Invalid(
                "prediction.max_alternative_sources must be > 0".into(),
            ));
        }
        let min = self.graph.min_trade_value;
        if !min.is_finite() || min < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "graph.min_trade_value must be finite and >= 0, got {min}"
            )));
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash of the serialized config.
    pub fn config_hash(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            embedding_dimension: self.embedding.dimension,
            max_vocabulary: self
                .embedding
                .max_vocabulary
                .unwrap_or(self.embedding.dimension),
            synthetic_corpus_size: self.extraction.synthetic_corpus_size,
            seed: self.extraction.seed,
        }
    }

    pub fn trade_flow_config(&self) -> TradeFlowConfig {
        TradeFlowConfig {
            ridge_lambda: self.regressor.ridge_lambda,
            max_training_routes: self.regressor.max_training_routes,
            seed: self.regressor.seed,
            max_alternative_sources: self.prediction.max_alternative_sources,
            demo_pair: self.prediction.demo_pair.clone(),
        }
    }
}
