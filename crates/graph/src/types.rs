use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Model,
    Dataset,
    Library,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeKind {
    #[serde(rename = "depends_on")]
    DependsOn,
    #[serde(rename = "model-lineage")]
    ModelLineage,
    #[serde(rename = "dataset-lineage")]
    DatasetLineage,
    #[serde(rename = "uses-dataset")]
    UsesDataset,
}

/// Where a node's display data came from: the first document that described
/// it, kept even when later documents overwrite the display fields.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub source_path: PathBuf,
    pub descriptor: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct NodeRecord {
    /// Canonical reference (models/datasets) or library local id.
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub version: String,
    pub split: Option<String>,
    pub label: String,
    pub provenance: Option<Provenance>,
}

#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub kind: EdgeKind,
}

/// In-memory relationship graph for one rebuild. The edge-key set lives and
/// dies with the graph, making duplicate insertion a no-op within a rebuild
/// without any global state.
#[derive(Debug, Default)]
pub struct BomGraph {
    pub graph: DiGraph<NodeRecord, EdgeRecord>,
    index: HashMap<String, NodeIndex>,
    edge_keys: HashSet<(NodeIndex, NodeIndex, EdgeKind)>,
}

impl BomGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn find_node(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    #[must_use]
    pub fn get_node(&self, idx: NodeIndex) -> Option<&NodeRecord> {
        self.graph.node_weight(idx)
    }

    /// Insert or update a node keyed by its id. The last document read wins
    /// for display fields; the first-seen provenance is kept alongside.
    pub fn upsert_node(&mut self, record: NodeRecord) -> NodeIndex {
        if let Some(&idx) = self.index.get(&record.id) {
            if let Some(existing) = self.graph.node_weight_mut(idx) {
                let provenance = existing.provenance.take().or(record.provenance.clone());
                *existing = NodeRecord {
                    provenance,
                    ..record
                };
            }
            return idx;
        }
        let id = record.id.clone();
        let idx = self.graph.add_node(record);
        self.index.insert(id, idx);
        idx
    }

    /// Insert an edge unless an identical `(from, to, kind)` already exists.
    /// Returns whether the edge was new.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind) -> bool {
        if !self.edge_keys.insert((from, to, kind)) {
            return false;
        }
        self.graph.add_edge(from, to, EdgeRecord { kind });
        true
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &NodeRecord)> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx).map(|node| (idx, node)))
    }

    /// All edges as `(from, to, kind)` record triples.
    pub fn edges(&self) -> impl Iterator<Item = (&NodeRecord, &NodeRecord, EdgeKind)> {
        self.graph.edge_references().filter_map(|edge| {
            let from = self.graph.node_weight(edge.source())?;
            let to = self.graph.node_weight(edge.target())?;
            Some((from, to, edge.weight().kind))
        })
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: &str, name: &str) -> NodeRecord {
        NodeRecord {
            id: id.to_string(),
            kind: NodeKind::Model,
            name: name.to_string(),
            version: "1.0".to_string(),
            split: None,
            label: name.to_string(),
            provenance: None,
        }
    }

    #[test]
    fn upsert_keeps_first_provenance_and_last_display() {
        let mut graph = BomGraph::new();
        let mut first = record("models://net/1.0", "net");
        first.provenance = Some(Provenance {
            source_path: "first.json".into(),
            descriptor: serde_json::json!({"name": "net"}),
        });
        let idx = graph.upsert_node(first);

        let mut second = record("models://net/1.0", "net-renamed");
        second.provenance = Some(Provenance {
            source_path: "second.json".into(),
            descriptor: serde_json::json!({"name": "net-renamed"}),
        });
        let idx_again = graph.upsert_node(second);

        assert_eq!(idx, idx_again);
        assert_eq!(graph.node_count(), 1);
        let node = graph.get_node(idx).unwrap();
        assert_eq!(node.name, "net-renamed");
        let provenance = node.provenance.as_ref().unwrap();
        assert_eq!(provenance.source_path, PathBuf::from("first.json"));
    }

    #[test]
    fn duplicate_edge_insertion_is_a_noop() {
        let mut graph = BomGraph::new();
        let a = graph.upsert_node(record("models://a/1", "a"));
        let b = graph.upsert_node(record("models://b/1", "b"));

        assert!(graph.add_edge(a, b, EdgeKind::ModelLineage));
        assert!(!graph.add_edge(a, b, EdgeKind::ModelLineage));
        assert_eq!(graph.edge_count(), 1);

        // A different kind between the same nodes is a different edge.
        assert!(graph.add_edge(a, b, EdgeKind::DependsOn));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn edge_kind_wire_names() {
        assert_eq!(
            serde_json::to_value(EdgeKind::DependsOn).unwrap(),
            "depends_on"
        );
        assert_eq!(
            serde_json::to_value(EdgeKind::ModelLineage).unwrap(),
            "model-lineage"
        );
    }
}
