use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A pipeline entity. The kind is decided once, at parse time, and never
/// re-inferred downstream.
///
/// Identity is the full `(kind, name, version[, split])` tuple.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Model {
        name: String,
        version: String,
    },
    Dataset {
        name: String,
        version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        split: Option<String>,
    },
    Library {
        name: String,
        version: String,
    },
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Model,
    Dataset,
    Library,
}

impl Entity {
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Model { .. } => EntityKind::Model,
            Self::Dataset { .. } => EntityKind::Dataset,
            Self::Library { .. } => EntityKind::Library,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Model { name, .. } | Self::Dataset { name, .. } | Self::Library { name, .. } => {
                name
            }
        }
    }

    #[must_use]
    pub fn version(&self) -> &str {
        match self {
            Self::Model { version, .. }
            | Self::Dataset { version, .. }
            | Self::Library { version, .. } => version,
        }
    }

    #[must_use]
    pub fn split(&self) -> Option<&str> {
        match self {
            Self::Dataset { split, .. } => split.as_deref(),
            _ => None,
        }
    }

    /// Models and datasets get their own document; libraries are only ever
    /// embedded.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        matches!(self, Self::Model { .. } | Self::Dataset { .. })
    }
}

/// A directed relationship between two entities.
///
/// A relationship is only materialized in output when both endpoints belong
/// to the active selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Relationship {
    DependsOn { owner: Entity, target: Entity },
    ModelLineage { parent: Entity, child: Entity },
    DatasetLineage { parent: Entity, child: Entity },
    UsesDataset { model: Entity, dataset: Entity },
}

impl Relationship {
    /// Both endpoints, source first.
    #[must_use]
    pub const fn endpoints(&self) -> (&Entity, &Entity) {
        match self {
            Self::DependsOn { owner, target } => (owner, target),
            Self::ModelLineage { parent, child } | Self::DatasetLineage { parent, child } => {
                (parent, child)
            }
            Self::UsesDataset { model, dataset } => (model, dataset),
        }
    }

    /// True when `entity` is one of the two endpoints.
    #[must_use]
    pub fn touches(&self, entity: &Entity) -> bool {
        let (a, b) = self.endpoints();
        a == entity || b == entity
    }
}
