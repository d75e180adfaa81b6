//! Policy extraction scenarios.
//!
//! GIVEN/WHEN/THEN style coverage of the POLICY stage from the public API.

use chrono::NaiveDate;
use tariffcast_core::domain::TariffShock;
use tariffcast_core::stage::{LayerState, Stage};
use tariffcast_core::text::{
    ExtractionOutcome, ExtractorConfig, PolicyFeatureExtractor, PolicyType,
};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 9).unwrap()
}

fn config() -> ExtractorConfig {
    ExtractorConfig {
        embedding_dimension: 32,
        max_vocabulary: 32,
        synthetic_corpus_size: 50,
        seed: 11,
    }
}

#[test]
fn given_bilateral_announcement_when_extracted_then_all_signals_found() {
    // GIVEN a fitted extractor and the canonical announcement
    let mut ex = PolicyFeatureExtractor::new(config());
    ex.fit(None).unwrap();
    let shock = TariffShock::new(
        "scenario-1",
        "The United States will impose a 25% tariff on imports from China under HS code 8517",
        "CN",
        "US",
        date(),
    );

    // WHEN
    let f = ex.transform(&shock);

    // THEN
    assert!(f.hs_codes.contains("8517"));
    assert!(f.tariff_rates.contains(&25.0));
    assert!(f.affected_countries.contains("China"));
    assert!(f.affected_countries.contains("United States"));
    assert_eq!(f.policy_type, PolicyType::Bilateral);
    assert_eq!(f.embedding.values.len(), 32);
    assert!(f.extraction_confidence > 0.0 && f.extraction_confidence <= 1.0);
}

#[test]
fn given_unfitted_extractor_when_predict_then_auto_fits_and_flags_result() {
    // GIVEN
    let ex = PolicyFeatureExtractor::new(config());
    assert_eq!(ex.state(), LayerState::NotFitted);

    // WHEN
    let f = ex
        .predict(&TariffShock::new("s2", "Tariffs on steel from Japan", "JP", "US", date()))
        .expect("auto-fit must not raise");

    // THEN
    assert!(f.auto_fitted);
    assert_eq!(ex.state(), LayerState::Fitted);
}

#[test]
fn given_same_seed_when_auto_fitting_twice_then_results_match() {
    let shock = TariffShock::new("s3", "Emergency 15% duties on Mexico autos", "MX", "US", date());
    let a = PolicyFeatureExtractor::new(config()).transform(&shock);
    let b = PolicyFeatureExtractor::new(config()).transform(&shock);
    assert_eq!(a, b);
}

#[test]
fn given_multilateral_keyword_when_extracted_then_type_is_multilateral() {
    let mut ex = PolicyFeatureExtractor::new(config());
    ex.fit(None).unwrap();
    let f = ex.transform(&TariffShock::new(
        "s4",
        "WTO members agree to cap duties on Japan solar panels at 5%",
        "JP",
        "US",
        date(),
    ));
    assert_eq!(f.policy_type, PolicyType::Multilateral);
}

#[test]
fn given_gibberish_when_extracted_then_empty_sets_not_error() {
    let mut ex = PolicyFeatureExtractor::new(config());
    ex.fit(None).unwrap();
    let f = ex.transform(&TariffShock::new("s5", "qwerty zxcv", "??", "??", date()));
    assert!(f.hs_codes.is_empty());
    assert!(f.tariff_rates.is_empty());
    assert!(f.affected_countries.is_empty());
    assert_eq!(f.outcome, ExtractionOutcome::Complete);
}

#[test]
fn given_announcement_date_when_extracted_then_lead_time_is_measured() {
    let mut ex = PolicyFeatureExtractor::new(config());
    ex.fit(None).unwrap();
    let shock = TariffShock::new("s6", "10% tariff on Canada lumber", "CA", "US", date())
        .announced(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    let f = ex.transform(&shock);
    assert_eq!(f.temporal.days_until_effective, 30);
    assert_eq!(f.temporal.quarter, 2);
}
