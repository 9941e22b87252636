//! Metadata source boundary.
//!
//! The metadata store itself is an external collaborator; this module only
//! defines the feed the compiler consumes, plus a scenario-file
//! implementation for driving the pipeline from a JSON fixture. Scenario
//! entities live in a keyed map and relationships refer to those keys, so a
//! typo fails fast instead of silently dropping an edge.

use crate::error::{CompileError, Result};
use crate::version::version_key;
use bomref_protocol::{Entity, EntityKind, Relationship};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Everything a compile run needs from the metadata store.
#[derive(Debug, Clone, Default)]
pub struct PipelineMetadata {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub pipelines: Vec<Pipeline>,
}

/// A named context: the subset of entities attributed to one pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub name: String,
    pub members: Vec<Entity>,
}

pub trait MetadataSource {
    fn load(&self) -> Result<PipelineMetadata>;
}

/// JSON scenario file.
pub struct ScenarioFile {
    path: PathBuf,
}

impl ScenarioFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MetadataSource for ScenarioFile {
    fn load(&self) -> Result<PipelineMetadata> {
        let bytes = std::fs::read(&self.path)?;
        let scenario: Scenario = serde_json::from_slice(&bytes)?;
        let metadata = scenario.resolve()?;
        log::info!(
            "loaded scenario {}: {} entities, {} relationships, {} pipelines",
            self.path.display(),
            metadata.entities.len(),
            metadata.relationships.len(),
            metadata.pipelines.len()
        );
        Ok(metadata)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    entities: BTreeMap<String, Entity>,
    #[serde(default)]
    pipelines: BTreeMap<String, PipelineDecl>,
    #[serde(default)]
    relationships: Vec<RelationshipDecl>,
}

#[derive(Debug, Clone, Deserialize)]
struct PipelineDecl {
    #[serde(default)]
    members: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RelationshipDecl {
    DependsOn { owner: String, target: String },
    ModelLineage { parent: String, child: String },
    DatasetLineage { parent: String, child: String },
    UsesDataset { model: String, dataset: String },
}

impl Scenario {
    pub fn resolve(self) -> Result<PipelineMetadata> {
        let lookup = |key: &str| -> Result<Entity> {
            self.entities
                .get(key)
                .cloned()
                .ok_or_else(|| CompileError::UnknownEntityKey(key.to_string()))
        };

        let mut relationships = Vec::new();
        for decl in &self.relationships {
            relationships.push(resolve_relationship(decl, &lookup)?);
        }

        let entities: Vec<Entity> = self.entities.values().cloned().collect();
        derive_lineage(&entities, &mut relationships);

        let mut pipelines = Vec::new();
        for (name, decl) in &self.pipelines {
            let members = decl
                .members
                .iter()
                .map(|key| lookup(key))
                .collect::<Result<Vec<_>>>()?;
            pipelines.push(Pipeline {
                name: name.clone(),
                members,
            });
        }

        Ok(PipelineMetadata {
            entities,
            relationships,
            pipelines,
        })
    }
}

fn resolve_relationship<F>(decl: &RelationshipDecl, lookup: &F) -> Result<Relationship>
where
    F: Fn(&str) -> Result<Entity>,
{
    let invalid = |message: String| CompileError::InvalidScenario(message);
    match decl {
        RelationshipDecl::DependsOn { owner, target } => {
            let owner = lookup(owner)?;
            let target = lookup(target)?;
            if !owner.is_primary() {
                return Err(invalid(format!(
                    "depends_on owner {} must be a model or dataset",
                    owner.name()
                )));
            }
            if target.kind() != EntityKind::Library {
                return Err(invalid(format!(
                    "depends_on target {} must be a library",
                    target.name()
                )));
            }
            Ok(Relationship::DependsOn { owner, target })
        }
        RelationshipDecl::ModelLineage { parent, child } => {
            let parent = lookup(parent)?;
            let child = lookup(child)?;
            if parent.kind() != EntityKind::Model || child.kind() != EntityKind::Model {
                return Err(invalid("model_lineage endpoints must be models".to_string()));
            }
            Ok(Relationship::ModelLineage { parent, child })
        }
        RelationshipDecl::DatasetLineage { parent, child } => {
            let parent = lookup(parent)?;
            let child = lookup(child)?;
            if parent.kind() != EntityKind::Dataset || child.kind() != EntityKind::Dataset {
                return Err(invalid(
                    "dataset_lineage endpoints must be datasets".to_string(),
                ));
            }
            Ok(Relationship::DatasetLineage { parent, child })
        }
        RelationshipDecl::UsesDataset { model, dataset } => {
            let model = lookup(model)?;
            let dataset = lookup(dataset)?;
            if model.kind() != EntityKind::Model || dataset.kind() != EntityKind::Dataset {
                return Err(invalid(
                    "uses_dataset must link a model to a dataset".to_string(),
                ));
            }
            Ok(Relationship::UsesDataset { model, dataset })
        }
    }
}

/// Link adjacent versions of a name group parent -> child when the scenario
/// declares no lineage for that pair. Derived edges become part of the
/// relationship set like any declared edge.
fn derive_lineage(entities: &[Entity], relationships: &mut Vec<Relationship>) {
    let mut groups: BTreeMap<(EntityKind, &str), Vec<&Entity>> = BTreeMap::new();
    for entity in entities.iter().filter(|e| e.is_primary()) {
        groups
            .entry((entity.kind(), entity.name()))
            .or_default()
            .push(entity);
    }

    for chain in groups.values_mut() {
        chain.sort_by_key(|e| version_key(e.version()));
        for pair in chain.windows(2) {
            let (parent, child) = (pair[0], pair[1]);
            if has_lineage_between(relationships, parent, child) {
                continue;
            }
            log::debug!(
                "derived lineage {} -> {}",
                bomref_protocol::reference(parent),
                bomref_protocol::reference(child)
            );
            let derived = match parent.kind() {
                EntityKind::Model => Relationship::ModelLineage {
                    parent: parent.clone(),
                    child: child.clone(),
                },
                _ => Relationship::DatasetLineage {
                    parent: parent.clone(),
                    child: child.clone(),
                },
            };
            relationships.push(derived);
        }
    }
}

fn has_lineage_between(relationships: &[Relationship], a: &Entity, b: &Entity) -> bool {
    relationships.iter().any(|r| match r {
        Relationship::ModelLineage { parent, child }
        | Relationship::DatasetLineage { parent, child } => {
            (parent == a && child == b) || (parent == b && child == a)
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scenario(json: &str) -> Scenario {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn resolves_keys_to_entities() {
        let metadata = scenario(
            r#"{
                "entities": {
                    "net": {"kind": "model", "name": "net", "version": "1.0"},
                    "numpy": {"kind": "library", "name": "numpy", "version": "1.26"}
                },
                "relationships": [
                    {"type": "depends_on", "owner": "net", "target": "numpy"}
                ]
            }"#,
        )
        .resolve()
        .unwrap();

        assert_eq!(metadata.entities.len(), 2);
        assert_eq!(metadata.relationships.len(), 1);
    }

    #[test]
    fn unknown_key_fails_fast() {
        let err = scenario(
            r#"{
                "entities": {},
                "relationships": [
                    {"type": "depends_on", "owner": "missing", "target": "missing"}
                ]
            }"#,
        )
        .resolve()
        .unwrap_err();
        assert!(matches!(err, CompileError::UnknownEntityKey(key) if key == "missing"));
    }

    #[test]
    fn mistyped_endpoint_is_invalid() {
        let err = scenario(
            r#"{
                "entities": {
                    "net": {"kind": "model", "name": "net", "version": "1.0"},
                    "demo": {"kind": "dataset", "name": "demo", "version": "1"}
                },
                "relationships": [
                    {"type": "model_lineage", "parent": "net", "child": "demo"}
                ]
            }"#,
        )
        .resolve()
        .unwrap_err();
        assert!(matches!(err, CompileError::InvalidScenario(_)));
    }

    #[test]
    fn derives_lineage_for_undeclared_version_chain() {
        let metadata = scenario(
            r#"{
                "entities": {
                    "v1": {"kind": "model", "name": "net", "version": "1.0.0"},
                    "v2": {"kind": "model", "name": "net", "version": "1.1.0"},
                    "v10": {"kind": "model", "name": "net", "version": "1.10.0"}
                }
            }"#,
        )
        .resolve()
        .unwrap();

        // 1.0.0 -> 1.1.0 -> 1.10.0, numerically ordered.
        let lineage: Vec<_> = metadata
            .relationships
            .iter()
            .filter_map(|r| match r {
                Relationship::ModelLineage { parent, child } => {
                    Some((parent.version().to_string(), child.version().to_string()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            lineage,
            vec![
                ("1.0.0".to_string(), "1.1.0".to_string()),
                ("1.1.0".to_string(), "1.10.0".to_string()),
            ]
        );
    }

    #[test]
    fn declared_lineage_suppresses_derivation_for_that_pair() {
        let metadata = scenario(
            r#"{
                "entities": {
                    "v1": {"kind": "model", "name": "net", "version": "1.0.0"},
                    "v2": {"kind": "model", "name": "net", "version": "1.1.0"}
                },
                "relationships": [
                    {"type": "model_lineage", "parent": "v1", "child": "v2"}
                ]
            }"#,
        )
        .resolve()
        .unwrap();
        let lineage_count = metadata
            .relationships
            .iter()
            .filter(|r| matches!(r, Relationship::ModelLineage { .. }))
            .count();
        assert_eq!(lineage_count, 1);
    }

    #[test]
    fn libraries_never_join_lineage_chains() {
        let metadata = scenario(
            r#"{
                "entities": {
                    "l1": {"kind": "library", "name": "numpy", "version": "1.25"},
                    "l2": {"kind": "library", "name": "numpy", "version": "1.26"}
                }
            }"#,
        )
        .resolve()
        .unwrap();
        assert!(metadata.relationships.is_empty());
    }
}
