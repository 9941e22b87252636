//! Document wire format.
//!
//! One JSON object per primary entity (model or dataset). A document is
//! self-contained: direct library dependencies are embedded as components
//! with a local adjacency entry, while lineage and model/dataset usage are
//! expressed as typed external pointers carrying canonical references.

use crate::{reference, Entity};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of the primary descriptor. Libraries never appear here; they are
/// embedded components only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryKind {
    Model,
    Dataset,
}

/// Typed tag on an external pointer, read back by the reconstructor to
/// classify edge type and direction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum RelationTag {
    ParentModel,
    ChildModel,
    ParentDataset,
    ChildDataset,
    UsesDataset,
    UsedByModel,
}

/// Cross-document pointer: a canonical reference plus its relation tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct ExternalPointer {
    #[serde(rename = "relationTag")]
    pub relation_tag: RelationTag,
    #[serde(rename = "targetReference")]
    pub target_reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PrimaryDescriptor {
    pub kind: PrimaryKind,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<String>,
    /// Canonical reference of this entity, equal to `reference(entity())`.
    pub identifier: String,
    #[serde(
        rename = "externalReferences",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub external_references: Vec<ExternalPointer>,
}

impl PrimaryDescriptor {
    /// Entity described by this descriptor. The kind tag is decided here,
    /// once, from the parsed `kind` field.
    #[must_use]
    pub fn entity(&self) -> Entity {
        match self.kind {
            PrimaryKind::Model => Entity::Model {
                name: self.name.clone(),
                version: self.version.clone(),
            },
            PrimaryKind::Dataset => Entity::Dataset {
                name: self.name.clone(),
                version: self.version.clone(),
                split: self.split.clone(),
            },
        }
    }
}

/// Embedded library descriptor, addressed by local id from the adjacency
/// list only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ComponentDescriptor {
    pub name: String,
    pub version: String,
    #[serde(rename = "localId")]
    pub local_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Document {
    pub primary: PrimaryDescriptor,
    /// Local adjacency: primary local id -> embedded library local ids.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentDescriptor>,
}

impl Document {
    /// Canonical reference of the primary, recomputed from the parsed
    /// descriptor rather than trusted from the `identifier` field.
    #[must_use]
    pub fn primary_reference(&self) -> String {
        reference(&self.primary.entity())
    }

    #[must_use]
    pub fn component(&self, local_id: &str) -> Option<&ComponentDescriptor> {
        self.components.iter().find(|c| c.local_id == local_id)
    }

    /// Library local ids the primary depends on, in adjacency order.
    #[must_use]
    pub fn direct_dependency_ids(&self) -> &[String] {
        self.dependencies
            .get(&self.primary.identifier)
            .map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_document() -> Document {
        let identifier = "models://net/1.0.0".to_string();
        Document {
            primary: PrimaryDescriptor {
                kind: PrimaryKind::Model,
                name: "net".to_string(),
                version: "1.0.0".to_string(),
                split: None,
                identifier: identifier.clone(),
                external_references: vec![ExternalPointer {
                    relation_tag: RelationTag::ChildModel,
                    target_reference: "models://net/1.1.0".to_string(),
                }],
            },
            dependencies: BTreeMap::from([(identifier, vec!["lib:numpy@1.26".to_string()])]),
            components: vec![ComponentDescriptor {
                name: "numpy".to_string(),
                version: "1.26".to_string(),
                local_id: "lib:numpy@1.26".to_string(),
            }],
        }
    }

    #[test]
    fn wire_field_names() {
        let value = serde_json::to_value(sample_document()).unwrap();
        assert_eq!(value["primary"]["kind"], "model");
        assert_eq!(
            value["primary"]["externalReferences"][0]["relationTag"],
            "child-model"
        );
        assert_eq!(
            value["primary"]["externalReferences"][0]["targetReference"],
            "models://net/1.1.0"
        );
        assert_eq!(value["components"][0]["localId"], "lib:numpy@1.26");
    }

    #[test]
    fn relation_tags_round_trip_kebab_case() {
        for (tag, wire) in [
            (RelationTag::ParentModel, "parent-model"),
            (RelationTag::ChildModel, "child-model"),
            (RelationTag::ParentDataset, "parent-dataset"),
            (RelationTag::ChildDataset, "child-dataset"),
            (RelationTag::UsesDataset, "uses-dataset"),
            (RelationTag::UsedByModel, "used-by-model"),
        ] {
            assert_eq!(serde_json::to_value(tag).unwrap(), wire);
        }
    }

    #[test]
    fn primary_reference_recomputed_from_fields() {
        let mut doc = sample_document();
        // Drifted identifier must not win over the parsed fields.
        doc.primary.identifier = "models://renamed/9.9".to_string();
        assert_eq!(doc.primary_reference(), "models://net/1.0.0");
    }

    #[test]
    fn direct_dependency_ids_follow_primary_adjacency() {
        let doc = sample_document();
        assert_eq!(doc.direct_dependency_ids(), ["lib:numpy@1.26"]);

        let mut foreign = doc.clone();
        foreign.primary.identifier = "models://other/1.0".to_string();
        assert!(foreign.direct_dependency_ids().is_empty());
    }

    #[test]
    fn minimal_document_parses_without_optional_sections() {
        let doc: Document = serde_json::from_str(
            r#"{"primary": {"kind": "dataset", "name": "demo", "version": "1",
                 "identifier": "data://demo/1"}}"#,
        )
        .unwrap();
        assert!(doc.components.is_empty());
        assert!(doc.dependencies.is_empty());
        assert_eq!(doc.primary_reference(), "data://demo/1");
    }
}
