//! POLICY stage: tariff shock → `PolicyFeatures`.
//!
//! `fit` trains the frequency vectorizer and the numeric-feature scaler on a
//! policy corpus. `transform` never fails: malformed input degrades to empty
//! feature sets tagged `PartialExtraction`.
//!
//! Unlike every other stage, calling `transform` before `fit` is not an error.
//! The extractor fits itself once on a seeded synthetic corpus and flags every
//! result produced that way with `auto_fitted = true`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use super::embedder::{Embedder, SentenceEncoder};
use super::features::{
    extraction_confidence, ExtractionOutcome, PolicyFeatures, PolicyType, TemporalFeatures,
};
use super::patterns::{
    extract_hs_codes, extract_rates, has_multilateral_keyword, normalize_hs_code, urgency_score,
    MAX_RATE, MIN_RATE,
};
use super::scaler::StandardScaler;
use super::synthetic::generate_policy_corpus;
use super::tfidf::TfidfVectorizer;
use super::ExtractionError;
use crate::countries::{find_countries, normalize_country};
use crate::domain::TariffShock;
use crate::rng::RngHierarchy;
use crate::stage::{LayerState, Stage, StageError, StageKind};

/// Hyperparameters for the POLICY stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    pub embedding_dimension: usize,
    pub max_vocabulary: usize,
    pub synthetic_corpus_size: usize,
    pub seed: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            embedding_dimension: 64,
            max_vocabulary: 64,
            synthetic_corpus_size: 200,
            seed: 42,
        }
    }
}

/// Where the fitted text models came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitOrigin {
    /// `fit` with a caller-supplied corpus.
    Corpus { documents: usize },
    /// `fit` without a corpus, or `force_fitted`.
    SyntheticDefault { documents: usize },
    /// Implicit fit triggered by `transform` on an unfitted extractor.
    AutoFit { documents: usize },
}

#[derive(Debug)]
struct FittedPolicyModel {
    embedder: Embedder,
    scaler: StandardScaler,
    origin: FitOrigin,
}

pub struct PolicyFeatureExtractor {
    config: ExtractorConfig,
    encoder: Option<Arc<dyn SentenceEncoder>>,
    model: OnceLock<FittedPolicyModel>,
    failed: bool,
}

impl PolicyFeatureExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            encoder: None,
            model: OnceLock::new(),
            failed: false,
        }
    }

    /// Plug in a learned sentence encoder. Takes effect at the next fit.
    pub fn with_encoder(mut self, encoder: Arc<dyn SentenceEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn fit_origin(&self) -> Option<FitOrigin> {
        self.model.get().map(|m| m.origin)
    }

    /// Train the vectorizer and scaler on `corpus`.
    ///
    /// A corpus with no usable vocabulary still fits: the embedder simply
    /// resolves to the statistical strategy.
    pub fn fit_corpus<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<(), ExtractionError> {
        if corpus.is_empty() {
            self.failed = true;
            return Err(ExtractionError::EmptyCorpus);
        }
        let model = self.build_model(
            corpus,
            FitOrigin::Corpus {
                documents: corpus.len(),
            },
        );
        self.install(model);
        Ok(())
    }

    fn fit_synthetic(&mut self) {
        let corpus = self.synthetic_corpus();
        let model = self.build_model(
            &corpus,
            FitOrigin::SyntheticDefault {
                documents: corpus.len(),
            },
        );
        self.install(model);
    }

    fn install(&mut self, model: FittedPolicyModel) {
        info!(
            origin = ?model.origin,
            capability = %model.embedder.capability(),
            "policy extractor fitted"
        );
        self.model = OnceLock::from(model);
        self.failed = false;
    }

    fn synthetic_corpus(&self) -> Vec<String> {
        generate_policy_corpus(
            &RngHierarchy::new(self.config.seed),
            self.config.synthetic_corpus_size.max(1),
        )
    }

    fn build_model<S: AsRef<str>>(&self, corpus: &[S], origin: FitOrigin) -> FittedPolicyModel {
        let vectorizer = match TfidfVectorizer::fit(corpus, self.config.max_vocabulary) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, "frequency vectorizer unavailable, using statistical embedding");
                None
            }
        };
        let rows: Vec<Vec<f64>> = corpus
            .iter()
            .map(|doc| text_summary_row(doc.as_ref()))
            .collect();
        let scaler =
            StandardScaler::fit(&rows).unwrap_or_else(|| StandardScaler::identity(SUMMARY_WIDTH));
        FittedPolicyModel {
            embedder: Embedder::resolve(
                self.config.embedding_dimension,
                self.encoder.clone(),
                vectorizer,
            ),
            scaler,
            origin,
        }
    }

    fn model(&self, shock: &TariffShock) -> &FittedPolicyModel {
        self.model.get_or_init(|| {
            warn!(
                shock = %shock.tariff_id,
                "policy extractor used before fit, auto-fitting on synthetic corpus"
            );
            let corpus = self.synthetic_corpus();
            self.build_model(
                &corpus,
                FitOrigin::AutoFit {
                    documents: corpus.len(),
                },
            )
        })
    }

    /// Extract structured features from one shock. Never fails.
    pub fn transform(&self, shock: &TariffShock) -> PolicyFeatures {
        let model = self.model(shock);
        let text = shock.policy_text.as_str();
        let mut reasons: Vec<String> = Vec::new();
        if text.trim().is_empty() {
            reasons.push("empty policy text".to_string());
        }

        // HS codes: text first, then explicit codes from the shock.
        let mut hs_codes: BTreeSet<String> = extract_hs_codes(text).into_iter().collect();
        for raw in shock.hs_codes.iter().flatten() {
            match normalize_hs_code(raw.trim()) {
                Some(code) => {
                    hs_codes.insert(code);
                }
                None => reasons.push(format!("ignored malformed HS code '{raw}'")),
            }
        }

        let extracted = extract_rates(text);
        if !extracted.rejected.is_empty() {
            reasons.push(format!(
                "discarded {} out-of-range rate(s)",
                extracted.rejected.len()
            ));
        }
        let first_text_rate = extracted.rates.first().copied();
        let mut tariff_rates = extracted.rates;
        if let Some(rate) = shock.rate_change {
            if !in_rate_range(rate) {
                reasons.push(format!("explicit rate {rate} outside [0, 200]"));
            } else if !tariff_rates.contains(&rate) {
                tariff_rates.push(rate);
            }
        }

        let affected_countries = find_countries(text);
        let policy_type =
            PolicyType::classify(affected_countries.len(), has_multilateral_keyword(text));
        let urgency = urgency_score(text);

        // Only rates found in the text spread to every named country; an
        // explicit shock rate applies to the origin alone.
        let mut country_tariff_map = BTreeMap::new();
        match first_text_rate {
            Some(first) if !affected_countries.is_empty() => {
                for country in &affected_countries {
                    country_tariff_map.insert(country.clone(), first);
                }
            }
            _ => {
                if let Some(rate) = shock.rate_change.filter(|r| in_rate_range(*r)) {
                    country_tariff_map.insert(normalize_country(&shock.origin_country), rate);
                }
            }
        }
        for (country, rate) in shock.country_tariff_map.iter().flatten() {
            if in_rate_range(*rate) {
                country_tariff_map.insert(normalize_country(country), *rate);
            } else {
                reasons.push(format!("ignored out-of-range rate {rate} for {country}"));
            }
        }

        let embedding = model.embedder.embed(text);
        if embedding.strategy != model.embedder.capability() && !text.trim().is_empty() {
            reasons.push(format!(
                "embedding degraded from {} to {}",
                model.embedder.capability(),
                embedding.strategy
            ));
        }

        let extraction_confidence = extraction_confidence(
            hs_codes.len(),
            tariff_rates.len(),
            affected_countries.len(),
            urgency,
        );
        let numeric_summary = model.scaler.transform(&summary_row(
            hs_codes.len(),
            &tariff_rates,
            affected_countries.len(),
            urgency,
        ));

        debug!(
            shock = %shock.tariff_id,
            hs = hs_codes.len(),
            rates = tariff_rates.len(),
            countries = affected_countries.len(),
            ?policy_type,
            "policy features extracted"
        );

        PolicyFeatures {
            hs_codes,
            tariff_rates,
            affected_countries,
            country_tariff_map,
            policy_type,
            urgency_score: urgency,
            embedding,
            temporal: TemporalFeatures::from_dates(shock.effective_date, shock.announced_on),
            extraction_confidence,
            numeric_summary,
            outcome: ExtractionOutcome::from_reasons(reasons),
            auto_fitted: matches!(model.origin, FitOrigin::AutoFit { .. }),
        }
    }
}

impl Stage for PolicyFeatureExtractor {
    type Input = TariffShock;
    type Output = PolicyFeatures;
    type TrainingData = [String];

    fn kind(&self) -> StageKind {
        StageKind::Policy
    }

    fn state(&self) -> LayerState {
        if self.failed {
            LayerState::Failed
        } else if self.model.get().is_some() {
            LayerState::Fitted
        } else {
            LayerState::NotFitted
        }
    }

    fn fit(&mut self, data: Option<&[String]>) -> Result<(), StageError> {
        match data {
            Some(corpus) => self.fit_corpus(corpus).map_err(|e| StageError::Fit {
                stage: StageKind::Policy,
                reason: e.to_string(),
            }),
            None => {
                self.fit_synthetic();
                Ok(())
            }
        }
    }

    fn force_fitted(&mut self) {
        self.fit_synthetic();
    }

    /// Auto-fits instead of returning `NotFitted`.
    fn predict(&self, input: &TariffShock) -> Result<PolicyFeatures, StageError> {
        Ok(self.transform(input))
    }

    fn confidence(&self, output: &PolicyFeatures) -> f64 {
        output.extraction_confidence.clamp(0.0, 1.0)
    }

    fn fallback_output(&self, input: &TariffShock) -> PolicyFeatures {
        let embedder = Embedder::statistical(self.config.embedding_dimension);
        PolicyFeatures::degraded(
            embedder.embed(&input.policy_text),
            TemporalFeatures::from_dates(input.effective_date, input.announced_on),
            "policy stage failed",
        )
    }
}

// ─── Numeric summary ─────────────────────────────────────────────────

const SUMMARY_WIDTH: usize = 6;

fn in_rate_range(rate: f64) -> bool {
    rate.is_finite() && (MIN_RATE..=MAX_RATE).contains(&rate)
}

fn summary_row(hs: usize, rates: &[f64], countries: usize, urgency: f64) -> Vec<f64> {
    let mean = if rates.is_empty() {
        0.0
    } else {
        rates.iter().sum::<f64>() / rates.len() as f64
    };
    let max = rates.iter().copied().fold(0.0, f64::max);
    vec![hs as f64, rates.len() as f64, countries as f64, urgency, mean, max]
}

fn text_summary_row(text: &str) -> Vec<f64> {
    summary_row(
        extract_hs_codes(text).len(),
        &extract_rates(text).rates,
        find_countries(text).len(),
        urgency_score(text),
    )
}
