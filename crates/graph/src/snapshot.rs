//! Immutable graph snapshots and their single-writer store.
//!
//! The current snapshot is the only shared resource between the rebuild
//! loop and its readers. Publication is one `watch` send of a new `Arc`:
//! readers holding an old generation keep a complete, consistent graph, and
//! every read after a publish observes that generation or a newer one.

use crate::layout::assign_positions;
use crate::types::{BomGraph, EdgeKind, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub kind: NodeKind,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<String>,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeView {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

/// Raw descriptor plus source document pointer, for "open full document"
/// actions on the rendering surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDetails {
    #[serde(rename = "sourceDocument")]
    pub source_document: String,
    pub descriptor: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub generation: u64,
    pub nodes: BTreeMap<String, NodeView>,
    pub edges: Vec<EdgeView>,
    pub details: BTreeMap<String, NodeDetails>,
}

impl GraphSnapshot {
    /// The valid degenerate state: nodes but no edges, or nothing at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            generation: 0,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            details: BTreeMap::new(),
        }
    }

    /// Serializable view of a finished graph. Ordered maps and sorted edges
    /// make equal graphs serialize byte-for-byte equal.
    #[must_use]
    pub fn from_graph(graph: &BomGraph) -> Self {
        let positions = assign_positions(graph);

        let mut nodes = BTreeMap::new();
        let mut details = BTreeMap::new();
        for (_, record) in graph.nodes() {
            let position = positions.get(&record.id);
            nodes.insert(
                record.id.clone(),
                NodeView {
                    kind: record.kind,
                    name: record.name.clone(),
                    version: record.version.clone(),
                    split: record.split.clone(),
                    label: record.label.clone(),
                    x: position.map(|p| p.0),
                    y: position.map(|p| p.1),
                },
            );
            if let Some(provenance) = &record.provenance {
                details.insert(
                    record.id.clone(),
                    NodeDetails {
                        source_document: provenance.source_path.display().to_string(),
                        descriptor: provenance.descriptor.clone(),
                    },
                );
            }
        }

        let mut edges: Vec<EdgeView> = graph
            .edges()
            .map(|(from, to, kind)| EdgeView {
                from: from.id.clone(),
                to: to.id.clone(),
                kind,
            })
            .collect();
        edges.sort();

        Self {
            generation: 0,
            nodes,
            edges,
            details,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Content equality, ignoring the generation counter.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.edges == other.edges && self.details == other.details
    }
}

/// Single-owner snapshot store. Written exclusively by the reconstruction
/// loop; read-only for everyone else, so one reference swap replaces a whole
/// generation without locking.
pub struct SnapshotStore {
    tx: watch::Sender<Arc<GraphSnapshot>>,
    _rx: watch::Receiver<Arc<GraphSnapshot>>,
}

impl SnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(Arc::new(GraphSnapshot::empty()));
        Self { tx, _rx: rx }
    }

    /// Install `snapshot` as the next generation and return it.
    pub fn publish(&self, mut snapshot: GraphSnapshot) -> Arc<GraphSnapshot> {
        snapshot.generation = self.current().generation + 1;
        let snapshot = Arc::new(snapshot);
        self.tx.send_replace(snapshot.clone());
        snapshot
    }

    #[must_use]
    pub fn current(&self) -> Arc<GraphSnapshot> {
        self.tx.borrow().clone()
    }

    /// Change stream for readers that want to re-render on new generations.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<GraphSnapshot>> {
        self.tx.subscribe()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
