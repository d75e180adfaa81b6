//! Tariffcast Core — tariff shock types, policy text extraction, trade network,
//! trade-flow prediction and downstream impact layers.
//!
//! This crate contains every pipeline stage:
//! - Domain types (tariff shocks, historical trade rows, ids and hashes)
//! - The `Stage` trait and per-stage fit state machine
//! - POLICY: regex/keyword extraction plus a three-strategy text embedder
//! - Trade network graph with a versioned single-writer store
//! - TRADE_FLOW: ridge regressors over route features, disruption and reallocation
//! - INDUSTRY / FIRM / CONSUMER / GEOPOLITICAL fixed-coefficient layers

pub mod countries;
pub mod domain;
pub mod flow;
pub mod graph;
pub mod layers;
pub mod rng;
pub mod stage;
pub mod text;
