//! Versioned single-writer / multi-reader holder for the trade network.
//!
//! Readers take an `Arc` snapshot and keep it for the whole prediction.
//! A rebuild constructs the new graph outside the read lock, then swaps the
//! pointer under a brief write lock, so a reader sees either the old graph or
//! the new one. A failed rebuild leaves the current graph untouched.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use super::network::{GraphError, GraphSettings, TradeNetworkGraph};
use crate::domain::{GraphVersion, TradeRecord};

#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    pub version: GraphVersion,
    pub graph: Arc<TradeNetworkGraph>,
}

#[derive(Debug)]
pub struct GraphStore {
    current: RwLock<GraphSnapshot>,
    writer: Mutex<()>,
}

impl GraphStore {
    /// Store holding an empty graph at version 0.
    pub fn new(settings: GraphSettings) -> Self {
        Self {
            current: RwLock::new(GraphSnapshot {
                version: GraphVersion::default(),
                graph: Arc::new(TradeNetworkGraph::empty(settings)),
            }),
            writer: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.current.read().clone()
    }

    pub fn version(&self) -> GraphVersion {
        self.current.read().version
    }

    /// Build a new graph from `records` and publish it.
    ///
    /// Concurrent rebuilds are serialised by the writer lock.
    pub fn rebuild(&self, records: &[TradeRecord]) -> Result<GraphSnapshot, GraphError> {
        self.rebuild_then(records, |_| Ok::<(), GraphError>(()))
            .map(|(snapshot, ())| snapshot)
    }

    /// Build a candidate graph, run `on_built` against it, and publish it
    /// only if both succeed. Readers never see a candidate that `on_built`
    /// rejected.
    pub fn rebuild_then<T, E>(
        &self,
        records: &[TradeRecord],
        on_built: impl FnOnce(&GraphSnapshot) -> Result<T, E>,
    ) -> Result<(GraphSnapshot, T), E>
    where
        E: From<GraphError> + std::fmt::Display,
    {
        let _writer = self.writer.lock();
        let (version, settings) = {
            let current = self.current.read();
            (current.version, current.graph.settings().clone())
        };
        let candidate = TradeNetworkGraph::build(records, settings)
            .map(|graph| GraphSnapshot {
                version: version.next(),
                graph: Arc::new(graph),
            })
            .map_err(E::from);
        let result = candidate.and_then(|snapshot| {
            let extra = on_built(&snapshot)?;
            Ok((snapshot, extra))
        });
        match result {
            Ok((snapshot, extra)) => {
                *self.current.write() = snapshot.clone();
                info!(version = %snapshot.version, "trade network published");
                Ok((snapshot, extra))
            }
            Err(e) => {
                warn!(error = %e, %version, "graph rebuild failed, keeping current graph");
                Err(e)
            }
        }
    }
}
