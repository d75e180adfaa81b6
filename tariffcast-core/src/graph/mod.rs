//! Trade network graph, its versioned store, and route features.

pub mod features;
pub mod network;
pub mod store;

pub use features::{
    hs_chapter, route_features, MISSING_EDGE_LEAD_TIME, MISSING_EDGE_TRANSPORT_COST,
    MISSING_ROUTE_FEATURES, ROUTE_FEATURE_WIDTH,
};
pub use network::{CountryNode, GraphError, GraphSettings, RouteRef, TradeEdge, TradeNetworkGraph};
pub use store::{GraphSnapshot, GraphStore};
