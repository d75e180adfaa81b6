//! Route feature vector used by the trade-flow regressors.
//!
//! `[log1p(edge volume), transport cost, lead time, log1p(origin volume),
//!   log1p(destination volume), HS chapter, centrality(origin),
//!   centrality(destination)]`

use super::network::TradeNetworkGraph;

pub const ROUTE_FEATURE_WIDTH: usize = 8;

/// Transport cost reported for a route with no edge.
pub const MISSING_EDGE_TRANSPORT_COST: f64 = 0.1;
/// Lead time (days) reported for a route with no edge.
pub const MISSING_EDGE_LEAD_TIME: f64 = 30.0;

/// Features for a route with no edge in the graph. Not configurable.
pub const MISSING_ROUTE_FEATURES: [f64; ROUTE_FEATURE_WIDTH] = [
    0.0,
    MISSING_EDGE_TRANSPORT_COST,
    MISSING_EDGE_LEAD_TIME,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
];

/// Two-digit HS chapter as a number; 0 when absent or malformed.
pub fn hs_chapter(hs_code: Option<&str>) -> u32 {
    hs_code
        .filter(|c| c.len() >= 2)
        .and_then(|c| c.get(..2))
        .and_then(|c| c.parse().ok())
        .unwrap_or(0)
}

pub fn route_features(
    graph: &TradeNetworkGraph,
    origin: &str,
    destination: &str,
    hs_code: Option<&str>,
) -> [f64; ROUTE_FEATURE_WIDTH] {
    let Some(edge) = graph.edge(origin, destination) else {
        return MISSING_ROUTE_FEATURES;
    };
    let volume = |c: &str| graph.node(c).map(|n| n.trade_volume).unwrap_or(0.0);
    [
        edge.trade_volume.ln_1p(),
        edge.transport_cost,
        edge.lead_time,
        volume(origin).ln_1p(),
        volume(destination).ln_1p(),
        hs_chapter(hs_code) as f64,
        graph.degree_centrality(origin),
        graph.degree_centrality(destination),
    ]
}
