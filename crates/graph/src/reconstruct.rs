use crate::alias::AliasTable;
use crate::error::Result;
use crate::resolve::Resolver;
use crate::types::{BomGraph, EdgeKind, NodeKind, NodeRecord, Provenance};
use bomref_protocol::{display_name, Document, PrimaryKind, RelationTag};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconstructStats {
    /// Documents that contributed to the graph.
    pub documents: usize,
    /// Files skipped as malformed or lacking a usable primary descriptor.
    pub skipped: usize,
    /// External pointers dropped by the resolver.
    pub unresolved: usize,
    /// Edge insertions absorbed as duplicates.
    pub duplicate_edges: usize,
}

#[derive(Debug)]
pub struct Reconstruction {
    pub graph: BomGraph,
    pub stats: ReconstructStats,
}

/// Rebuilds one graph from the documents under a root directory. Identity
/// comes from document content; filenames are never interpreted.
pub struct Reconstructor {
    root: PathBuf,
}

impl Reconstructor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Two-pass reconstruction: nodes and aliases first, then edges. Runs to
    /// completion on whatever subset of the documents is readable.
    pub fn scan(&self) -> Result<Reconstruction> {
        let mut stats = ReconstructStats::default();
        let mut parsed: Vec<(PathBuf, serde_json::Value, Document)> = Vec::new();

        for path in self.document_paths()? {
            match read_document(&path) {
                Ok((value, document)) => parsed.push((path, value, document)),
                Err(reason) => {
                    stats.skipped += 1;
                    log::warn!("skipping {}: {reason}", path.display());
                }
            }
        }
        stats.documents = parsed.len();

        // Pass 1: nodes and alias table.
        let mut graph = BomGraph::new();
        let mut aliases = AliasTable::new();
        for (path, value, document) in &parsed {
            let id = document.primary_reference();
            let record = primary_record(&id, path, value, document);
            graph.upsert_node(record);
            aliases.register(&id);
        }

        // Pass 2: local dependency adjacency, then external pointers.
        let resolver = Resolver::new(&aliases);
        for (path, _, document) in &parsed {
            let from_id = document.primary_reference();
            let Some(from) = graph.find_node(&from_id) else {
                continue;
            };

            for local_id in document.direct_dependency_ids() {
                let Some(component) = document.component(local_id) else {
                    log::warn!(
                        "dangling local dependency {local_id} in {}",
                        path.display()
                    );
                    continue;
                };
                // Dependency targets are discovered in-line with their
                // owner's document; this is the one place a previously
                // unseen node may be created.
                let lib = graph.upsert_node(library_record(component));
                if !graph.add_edge(from, lib, EdgeKind::DependsOn) {
                    stats.duplicate_edges += 1;
                }
            }

            for pointer in &document.primary.external_references {
                match resolver.resolve(&pointer.target_reference) {
                    Ok(resolved) => {
                        let Some(target) = graph.find_node(&resolved.node_id) else {
                            continue;
                        };
                        let (edge_from, edge_to, kind) =
                            classify_pointer(pointer.relation_tag, from, target);
                        if !graph.add_edge(edge_from, edge_to, kind) {
                            stats.duplicate_edges += 1;
                        }
                    }
                    Err(unresolved) => {
                        stats.unresolved += 1;
                        log::warn!(
                            "unresolved reference {} in {} (attempted: {})",
                            unresolved.raw,
                            path.display(),
                            unresolved.attempted.join(", ")
                        );
                    }
                }
            }
        }

        log::info!(
            "reconstructed graph from {}: {} nodes, {} edges ({} documents, {} skipped, {} unresolved)",
            self.root.display(),
            graph.node_count(),
            graph.edge_count(),
            stats.documents,
            stats.skipped,
            stats.unresolved
        );
        Ok(Reconstruction { graph, stats })
    }

    /// JSON files directly under the root, in sorted order so repeated scans
    /// of an unchanged set replay identically.
    fn document_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "json")
            {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }
}

/// Read and classify one document file. The error string distinguishes the
/// two skip reasons for diagnostics.
fn read_document(path: &Path) -> std::result::Result<(serde_json::Value, Document), String> {
    let bytes = std::fs::read(path).map_err(|e| format!("unreadable: {e}"))?;
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| format!("malformed document: {e}"))?;
    let document: Document = serde_json::from_value(value.clone())
        .map_err(|e| format!("no usable primary descriptor: {e}"))?;
    Ok((value, document))
}

fn primary_record(
    id: &str,
    path: &Path,
    value: &serde_json::Value,
    document: &Document,
) -> NodeRecord {
    let primary = &document.primary;
    let kind = match primary.kind {
        PrimaryKind::Model => NodeKind::Model,
        PrimaryKind::Dataset => NodeKind::Dataset,
    };
    let name = display_name(&primary.name).to_string();
    NodeRecord {
        id: id.to_string(),
        kind,
        label: format!("{name}\n{}", primary.version),
        name,
        version: primary.version.clone(),
        split: primary.split.clone(),
        provenance: Some(Provenance {
            source_path: path.to_path_buf(),
            descriptor: value.get("primary").cloned().unwrap_or_default(),
        }),
    }
}

fn library_record(component: &bomref_protocol::ComponentDescriptor) -> NodeRecord {
    let name = display_name(&component.name).to_string();
    NodeRecord {
        id: component.local_id.clone(),
        kind: NodeKind::Library,
        label: format!("{name}\n{}", component.version),
        name,
        version: component.version.clone(),
        split: None,
        provenance: None,
    }
}

/// Edge direction and type from a pointer's relation tag. Parent-side and
/// child-side assertions of one link collapse onto the same key.
fn classify_pointer(
    tag: RelationTag,
    self_node: petgraph::graph::NodeIndex,
    target: petgraph::graph::NodeIndex,
) -> (
    petgraph::graph::NodeIndex,
    petgraph::graph::NodeIndex,
    EdgeKind,
) {
    match tag {
        RelationTag::ParentModel => (target, self_node, EdgeKind::ModelLineage),
        RelationTag::ChildModel => (self_node, target, EdgeKind::ModelLineage),
        RelationTag::ParentDataset => (target, self_node, EdgeKind::DatasetLineage),
        RelationTag::ChildDataset => (self_node, target, EdgeKind::DatasetLineage),
        RelationTag::UsesDataset => (self_node, target, EdgeKind::UsesDataset),
        RelationTag::UsedByModel => (target, self_node, EdgeKind::UsesDataset),
    }
}
