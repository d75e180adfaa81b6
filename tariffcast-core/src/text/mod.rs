//! Policy text → structured features.
//!
//! - `patterns`: ordered regex/keyword tables (HS codes, rates, urgency, multilateral)
//! - `tfidf`: frequency vectorizer trained by `PolicyFeatureExtractor::fit`
//! - `scaler`: numeric-feature standardisation
//! - `embedder`: three-strategy text embedding with silent degradation
//! - `extractor`: the POLICY stage
//! - `synthetic`: seeded corpus for the auto-fit fallback

pub mod embedder;
pub mod extractor;
pub mod features;
pub mod patterns;
pub mod scaler;
pub mod synthetic;
pub mod tfidf;

use thiserror::Error;

pub use embedder::{
    Embedder, Embedding, EmbeddingStrategy, EncoderError, SentenceEncoder, TextEmbedder,
};
pub use extractor::{ExtractorConfig, FitOrigin, PolicyFeatureExtractor};
pub use features::{ExtractionOutcome, PolicyFeatures, PolicyType, TemporalFeatures};
pub use scaler::StandardScaler;
pub use tfidf::TfidfVectorizer;

/// Errors from fitting the text models. Never raised by `transform`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractionError {
    #[error("policy corpus is empty")]
    EmptyCorpus,
    #[error("corpus produced an empty vocabulary")]
    EmptyVocabulary,
}
