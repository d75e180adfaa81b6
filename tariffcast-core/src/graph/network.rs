//! Trade network — directed weighted graph over countries.
//!
//! Built once from historical trade rows and never mutated afterwards.
//! Rows are aggregated per (origin, destination): trade value summed,
//! transport cost and lead time averaged. A node's trade volume is the sum
//! of every edge touching it. Nodes and edges keep first-appearance order
//! of the input rows, so two builds from identical rows are identical.

use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::countries::normalize_country;
use crate::domain::{dataset_hash, DatasetHash, TradeRecord};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    #[error("trade dataset is empty")]
    EmptyDataset,
    #[error("no trade rows at or above the minimum trade value {min_trade_value}")]
    NothingAboveThreshold { min_trade_value: f64 },
    #[error("row {row} has a non-finite or negative weight")]
    InvalidWeight { row: usize },
}

/// Thresholds used when building the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Rows with a smaller trade value are dropped before aggregation.
    pub min_trade_value: f64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            min_trade_value: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryNode {
    pub name: String,
    pub trade_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEdge {
    pub trade_volume: f64,
    pub transport_cost: f64,
    pub lead_time: f64,
    /// Number of rows aggregated into this edge.
    pub record_count: usize,
    /// HS codes seen on this route, in first-appearance order.
    pub hs_codes: Vec<String>,
}

/// A directed route by position in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRef {
    pub edge: EdgeIndex,
    pub origin: NodeIndex,
    pub destination: NodeIndex,
}

#[derive(Debug, Clone)]
pub struct TradeNetworkGraph {
    graph: DiGraph<CountryNode, TradeEdge>,
    index: HashMap<String, NodeIndex>,
    settings: GraphSettings,
    dataset_hash: DatasetHash,
    source_rows: usize,
}

#[derive(Default)]
struct EdgeAccumulator {
    value: f64,
    cost: f64,
    lead: f64,
    count: usize,
    hs_codes: Vec<String>,
}

impl TradeNetworkGraph {
    /// Graph with no nodes. Every route lookup returns the defaults.
    pub fn empty(settings: GraphSettings) -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            settings,
            dataset_hash: DatasetHash::empty(),
            source_rows: 0,
        }
    }

    /// Build the graph from historical rows. All-or-nothing: any invalid row
    /// rejects the whole dataset.
    pub fn build(records: &[TradeRecord], settings: GraphSettings) -> Result<Self, GraphError> {
        if records.is_empty() {
            return Err(GraphError::EmptyDataset);
        }
        if let Some(row) = records.iter().position(|r| !r.is_valid()) {
            return Err(GraphError::InvalidWeight { row });
        }

        // Aggregate in first-appearance order.
        let mut order: Vec<(String, String)> = Vec::new();
        let mut acc: HashMap<(String, String), EdgeAccumulator> = HashMap::new();
        let mut self_trade = 0usize;
        for record in records
            .iter()
            .filter(|r| r.trade_value >= settings.min_trade_value)
        {
            let origin = normalize_country(&record.origin);
            let destination = normalize_country(&record.destination);
            if origin == destination {
                self_trade += 1;
                continue;
            }
            let key = (origin, destination);
            let entry = acc.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                EdgeAccumulator::default()
            });
            entry.value += record.trade_value;
            entry.cost += record.transport_cost;
            entry.lead += record.lead_time;
            entry.count += 1;
            let hs = record.hs_code.trim();
            if !hs.is_empty() && !entry.hs_codes.iter().any(|c| c == hs) {
                entry.hs_codes.push(hs.to_string());
            }
        }
        if self_trade > 0 {
            warn!(rows = self_trade, "dropped domestic trade rows");
        }
        if order.is_empty() {
            return Err(GraphError::NothingAboveThreshold {
                min_trade_value: settings.min_trade_value,
            });
        }

        let mut graph = DiGraph::with_capacity(order.len(), order.len());
        let mut index: HashMap<String, NodeIndex> = HashMap::new();
        let mut node_for = |graph: &mut DiGraph<CountryNode, TradeEdge>, name: &str| {
            *index.entry(name.to_string()).or_insert_with(|| {
                graph.add_node(CountryNode {
                    name: name.to_string(),
                    trade_volume: 0.0,
                })
            })
        };

        for key in &order {
            let Some(a) = acc.get(key) else { continue };
            let o = node_for(&mut graph, &key.0);
            let d = node_for(&mut graph, &key.1);
            let n = a.count.max(1) as f64;
            graph.add_edge(
                o,
                d,
                TradeEdge {
                    trade_volume: a.value,
                    transport_cost: a.cost / n,
                    lead_time: a.lead / n,
                    record_count: a.count,
                    hs_codes: a.hs_codes.clone(),
                },
            );
            graph[o].trade_volume += a.value;
            graph[d].trade_volume += a.value;
        }

        let built = Self {
            graph,
            index,
            settings,
            dataset_hash: dataset_hash(records),
            source_rows: records.len(),
        };
        info!(
            rows = records.len(),
            nodes = built.node_count(),
            edges = built.edge_count(),
            hash = %built.dataset_hash,
            "trade network built"
        );
        Ok(built)
    }

    // ─── Queries ──────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    pub fn dataset_hash(&self) -> &DatasetHash {
        &self.dataset_hash
    }

    pub fn source_rows(&self) -> usize {
        self.source_rows
    }

    /// Country names in node order.
    pub fn countries(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|n| self.graph[n].name.as_str())
            .collect()
    }

    /// Position of `country` in node order.
    pub fn node_position(&self, country: &str) -> Option<usize> {
        self.index.get(country).map(|n| n.index())
    }

    pub fn contains(&self, country: &str) -> bool {
        self.index.contains_key(country)
    }

    pub fn node(&self, country: &str) -> Option<&CountryNode> {
        self.index.get(country).map(|n| &self.graph[*n])
    }

    pub fn node_name(&self, node: NodeIndex) -> &str {
        &self.graph[node].name
    }

    pub fn edge(&self, origin: &str, destination: &str) -> Option<&TradeEdge> {
        let o = *self.index.get(origin)?;
        let d = *self.index.get(destination)?;
        self.graph.find_edge(o, d).map(|e| &self.graph[e])
    }

    pub fn edge_at(&self, route: RouteRef) -> &TradeEdge {
        &self.graph[route.edge]
    }

    /// All routes in insertion order.
    pub fn routes(&self) -> impl Iterator<Item = RouteRef> + '_ {
        self.graph.edge_indices().filter_map(move |edge| {
            let (origin, destination) = self.graph.edge_endpoints(edge)?;
            Some(RouteRef {
                edge,
                origin,
                destination,
            })
        })
    }

    /// Routes with either endpoint in `countries`, in insertion order.
    pub fn routes_touching(&self, countries: &BTreeSet<String>) -> Vec<RouteRef> {
        self.routes()
            .filter(|r| {
                countries.contains(self.node_name(r.origin))
                    || countries.contains(self.node_name(r.destination))
            })
            .collect()
    }

    /// `(in-degree + out-degree) / (n - 1)`; 0 for unknown countries or
    /// single-node graphs.
    pub fn degree_centrality(&self, country: &str) -> f64 {
        let Some(&node) = self.index.get(country) else {
            return 0.0;
        };
        let n = self.graph.node_count();
        if n < 2 {
            return 0.0;
        }
        let degree = self.graph.edges_directed(node, Direction::Incoming).count()
            + self.graph.edges_directed(node, Direction::Outgoing).count();
        degree as f64 / (n - 1) as f64
    }

    /// Other origins with an existing edge into `destination`, in insertion
    /// order, at most `cap`.
    pub fn alternative_sources(&self, origin: &str, destination: &str, cap: usize) -> Vec<String> {
        let Some(&dest) = self.index.get(destination) else {
            return Vec::new();
        };
        let mut incoming: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(dest, Direction::Incoming)
            .map(|e| (e.id(), e.source()))
            .collect();
        incoming.sort_by_key(|(edge, _)| edge.index());
        incoming
            .into_iter()
            .map(|(_, source)| self.node_name(source))
            .filter(|name| *name != origin)
            .take(cap)
            .map(str::to_string)
            .collect()
    }

    /// Sum of all edge volumes.
    pub fn total_trade_volume(&self) -> f64 {
        self.graph.edge_weights().map(|e| e.trade_volume).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(o: &str, d: &str, hs: &str, value: f64, cost: f64, lead: f64) -> TradeRecord {
        TradeRecord {
            origin: o.into(),
            destination: d.into(),
            hs_code: hs.into(),
            trade_value: value,
            transport_cost: cost,
            lead_time: lead,
            year: 2023,
        }
    }

    fn sample() -> Vec<TradeRecord> {
        vec![
            rec("China", "United States", "8517", 100.0, 0.1, 20.0),
            rec("China", "United States", "8471", 300.0, 0.3, 40.0),
            rec("Mexico", "United States", "8703", 50.0, 0.05, 5.0),
            rec("Vietnam", "United States", "8517", 20.0, 0.08, 30.0),
            rec("United States", "China", "1201", 80.0, 0.12, 35.0),
        ]
    }

    #[test]
    fn aggregates_by_route() {
        let g = TradeNetworkGraph::build(&sample(), GraphSettings::default()).unwrap();
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 4);
        let e = g.edge("China", "United States").unwrap();
        assert_eq!(e.trade_volume, 400.0);
        assert!((e.transport_cost - 0.2).abs() < 1e-12);
        assert_eq!(e.lead_time, 30.0);
        assert_eq!(e.record_count, 2);
        assert_eq!(e.hs_codes, vec!["8517".to_string(), "8471".to_string()]);
    }

    #[test]
    fn node_volume_sums_touching_edges() {
        let g = TradeNetworkGraph::build(&sample(), GraphSettings::default()).unwrap();
        assert_eq!(g.node("China").unwrap().trade_volume, 480.0);
        assert_eq!(g.node("United States").unwrap().trade_volume, 550.0);
        assert_eq!(g.total_trade_volume(), 550.0);
    }

    #[test]
    fn country_names_are_normalised() {
        let rows = vec![rec("CN", "usa", "8517", 1.0, 0.1, 10.0)];
        let g = TradeNetworkGraph::build(&rows, GraphSettings::default()).unwrap();
        assert!(g.edge("China", "United States").is_some());
    }

    #[test]
    fn rebuild_is_deterministic() {
        let a = TradeNetworkGraph::build(&sample(), GraphSettings::default()).unwrap();
        let b = TradeNetworkGraph::build(&sample(), GraphSettings::default()).unwrap();
        assert_eq!(a.countries(), b.countries());
        let wa: Vec<_> = a.routes().map(|r| a.edge_at(r).clone()).collect();
        let wb: Vec<_> = b.routes().map(|r| b.edge_at(r).clone()).collect();
        assert_eq!(wa, wb);
        assert_eq!(a.dataset_hash(), b.dataset_hash());
    }

    #[test]
    fn invalid_row_rejects_whole_dataset() {
        let mut rows = sample();
        rows.push(rec("Japan", "China", "7208", -5.0, 0.1, 10.0));
        assert_eq!(
            TradeNetworkGraph::build(&rows, GraphSettings::default()).unwrap_err(),
            GraphError::InvalidWeight { row: 5 }
        );
        assert_eq!(
            TradeNetworkGraph::build(&[], GraphSettings::default()).unwrap_err(),
            GraphError::EmptyDataset
        );
    }

    #[test]
    fn threshold_drops_small_rows() {
        let settings = GraphSettings {
            min_trade_value: 60.0,
        };
        let g = TradeNetworkGraph::build(&sample(), settings).unwrap();
        assert!(g.edge("Vietnam", "United States").is_none());
        assert!(!g.contains("Mexico"));
    }

    #[test]
    fn centrality_and_alternatives() {
        let g = TradeNetworkGraph::build(&sample(), GraphSettings::default()).unwrap();
        // US: 3 incoming + 1 outgoing over 3 other nodes.
        assert!((g.degree_centrality("United States") - 4.0 / 3.0).abs() < 1e-12);
        assert_eq!(g.degree_centrality("Atlantis"), 0.0);
        assert_eq!(
            g.alternative_sources("China", "United States", 5),
            vec!["Mexico".to_string(), "Vietnam".to_string()]
        );
        assert_eq!(g.alternative_sources("China", "United States", 1).len(), 1);
        assert!(g.alternative_sources("China", "Atlantis", 5).is_empty());
    }

    #[test]
    fn routes_touching_affected() {
        let g = TradeNetworkGraph::build(&sample(), GraphSettings::default()).unwrap();
        let affected: BTreeSet<String> = ["Mexico".to_string()].into_iter().collect();
        let routes = g.routes_touching(&affected);
        assert_eq!(routes.len(), 1);
        assert_eq!(g.node_name(routes[0].origin), "Mexico");
    }
}
