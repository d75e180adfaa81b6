//! Tariffcast Runner — pipeline orchestration, configuration, data loading.
//!
//! This crate builds on `tariffcast-core` to provide:
//! - TOML pipeline configuration with validation and a config hash
//! - Historical trade CSV loading with a seeded synthetic fallback
//! - The six-stage `PipelineOrchestrator` (fit, predict, graph retrain)
//! - Prediction and fit-report types with per-stage confidence
//! - `tracing` subscriber setup

pub mod config;
pub mod data_loader;
pub mod logging;
pub mod pipeline;
pub mod result;

pub use config::{
    ConfigError, EmbeddingConfig, ExtractionConfig, LogFormat, LoggingConfig, PipelineConfig,
    PredictionConfig, RegressorConfig,
};
pub use data_loader::{load_trade_records, synthetic_trade_records, LoadError, LoadedTradeData};
pub use logging::{init_from_config, init_logging};
pub use pipeline::{PipelineError, PipelineOrchestrator, PipelineTrainingData};
pub use result::{ConfidenceScores, FitReport, PipelinePrediction, StageFitOutcome};
