//! Property tests for core invariants.
//!
//! Uses proptest to verify:
//! 1. Graph determinism — identical rows build identical edge weights
//! 2. Missing routes — features for an absent edge are the fixed defaults
//! 3. Flow scaling — `b·(1+2t)` for any base and tariff rate
//! 4. Reallocation matrix — square, zero diagonal
//! 5. Extraction bounds — confidence, urgency and rates stay in range

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use proptest::prelude::*;
use tariffcast_core::domain::{TariffShock, TradeRecord};
use tariffcast_core::flow::{scale_flow_change, TradeFlowConfig, TradeFlowPredictor};
use tariffcast_core::graph::{route_features, GraphSettings, GraphStore, TradeNetworkGraph};
use tariffcast_core::stage::Stage;
use tariffcast_core::text::{ExtractorConfig, PolicyFeatureExtractor, PolicyFeatures};

const COUNTRIES: &[&str] = &[
    "United States",
    "China",
    "Mexico",
    "Canada",
    "Japan",
    "Germany",
    "Vietnam",
];

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_record() -> impl Strategy<Value = TradeRecord> {
    (
        0..COUNTRIES.len(),
        0..COUNTRIES.len(),
        prop::sample::select(vec!["8517", "7208", "1201", "8703", "3004"]),
        1.0..1e6_f64,
        0.0..0.5_f64,
        1.0..90.0_f64,
    )
        .prop_filter("no domestic trade", |(o, d, ..)| o != d)
        .prop_map(|(o, d, hs, value, cost, lead)| TradeRecord {
            origin: COUNTRIES[o].to_string(),
            destination: COUNTRIES[d].to_string(),
            hs_code: hs.to_string(),
            trade_value: value,
            transport_cost: cost,
            lead_time: lead,
            year: 2023,
        })
}

fn arb_records() -> impl Strategy<Value = Vec<TradeRecord>> {
    prop::collection::vec(arb_record(), 1..40)
}

fn extractor() -> PolicyFeatureExtractor {
    let mut ex = PolicyFeatureExtractor::new(ExtractorConfig {
        embedding_dimension: 16,
        max_vocabulary: 16,
        synthetic_corpus_size: 20,
        seed: 3,
    });
    ex.fit(None).unwrap();
    ex
}

fn shock(text: &str) -> TariffShock {
    TariffShock::new(
        "prop",
        text,
        "China",
        "United States",
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
    )
}

// ── 1. Graph determinism ─────────────────────────────────────────────

proptest! {
    #[test]
    fn rebuild_yields_identical_weights(rows in arb_records()) {
        let a = TradeNetworkGraph::build(&rows, GraphSettings::default()).unwrap();
        let b = TradeNetworkGraph::build(&rows, GraphSettings::default()).unwrap();
        prop_assert_eq!(a.countries(), b.countries());
        let wa: Vec<_> = a.routes().map(|r| a.edge_at(r).clone()).collect();
        let wb: Vec<_> = b.routes().map(|r| b.edge_at(r).clone()).collect();
        prop_assert_eq!(wa, wb);
    }

    #[test]
    fn edge_weights_are_non_negative(rows in arb_records()) {
        let g = TradeNetworkGraph::build(&rows, GraphSettings::default()).unwrap();
        for r in g.routes() {
            let e = g.edge_at(r);
            prop_assert!(e.trade_volume >= 0.0);
            prop_assert!(e.transport_cost >= 0.0);
            prop_assert!(e.lead_time >= 0.0);
        }
    }
}

// ── 2. Missing routes ────────────────────────────────────────────────

proptest! {
    #[test]
    fn absent_edge_features_are_defaults(rows in arb_records(), hs in "[0-9]{2,6}") {
        let g = TradeNetworkGraph::build(&rows, GraphSettings::default()).unwrap();
        let f = route_features(&g, "Atlantis", "Lemuria", Some(&hs));
        prop_assert_eq!(f, [0.0, 0.1, 30.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }
}

// ── 3. Flow scaling ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn flow_change_scales_linearly(base in -1.0..1.0_f64, rate in 0.0..2.0_f64) {
        let scaled = scale_flow_change(base, rate);
        prop_assert!((scaled - base * (1.0 + 2.0 * rate)).abs() < 1e-12);
    }
}

// ── 4. Reallocation matrix ───────────────────────────────────────────

fn predict_flow(rows: &[TradeRecord], features: &PolicyFeatures) -> tariffcast_core::flow::TradeFlowPrediction {
    let store = Arc::new(GraphStore::new(GraphSettings::default()));
    let mut p = TradeFlowPredictor::new(TradeFlowConfig::default(), store);
    p.fit(Some(rows)).unwrap();
    p.predict(features).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn matrix_is_square_with_zero_diagonal(rows in arb_records(), rate in 1u32..100) {
        let features = extractor().transform(&shock(&format!("A {rate}% tariff on goods from China")));
        let out = predict_flow(&rows, &features);
        let m = &out.reallocation_matrix;
        let known: BTreeSet<&str> = rows
            .iter()
            .flat_map(|r| [r.origin.as_str(), r.destination.as_str()])
            .collect();
        prop_assert_eq!(m.dimension(), known.len());
        prop_assert!(m.is_square());
        prop_assert!(m.diagonal_is_zero());
        for score in out.disruption_scores.values() {
            prop_assert!((0.0..=1.0).contains(score));
        }
    }
}

// ── 5. Extraction bounds ─────────────────────────────────────────────

proptest! {
    #[test]
    fn extraction_never_panics_and_stays_bounded(text in ".{0,200}") {
        let f = extractor().transform(&shock(&text));
        prop_assert!((0.0..=1.0).contains(&f.extraction_confidence));
        prop_assert!((0.0..=1.0).contains(&f.urgency_score));
        prop_assert!(f.tariff_rates.iter().all(|r| (0.0..=200.0).contains(r)));
        prop_assert!(f.hs_codes.iter().all(|c| (2..=10).contains(&c.len())));
        prop_assert_eq!(f.embedding.values.len(), 16);
    }
}
