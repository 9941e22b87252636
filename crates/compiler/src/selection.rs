use crate::error::{CompileError, Result};
use crate::source::PipelineMetadata;
use bomref_protocol::Entity;
use std::collections::BTreeSet;

/// The export filter: the set of entities one compile run may reference.
/// Relationships whose partner endpoint falls outside the selection are
/// silently omitted from output, so every emitted document stays consistent
/// when read in isolation.
#[derive(Debug, Clone)]
pub struct Selection {
    members: BTreeSet<Entity>,
}

impl Selection {
    /// Every entity the metadata source knows about.
    #[must_use]
    pub fn all(metadata: &PipelineMetadata) -> Self {
        Self {
            members: metadata.entities.iter().cloned().collect(),
        }
    }

    /// Entities attributed to one named pipeline. Unknown names are a
    /// caller error, surfaced immediately.
    pub fn for_context(metadata: &PipelineMetadata, context: &str) -> Result<Self> {
        let pipeline = metadata
            .pipelines
            .iter()
            .find(|p| p.name == context)
            .ok_or_else(|| CompileError::UnknownContext(context.to_string()))?;
        Ok(Self {
            members: pipeline.members.iter().cloned().collect(),
        })
    }

    /// An explicit entity set, for single-document exports.
    #[must_use]
    pub fn from_entities<I>(entities: I) -> Self
    where
        I: IntoIterator<Item = Entity>,
    {
        Self {
            members: entities.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, entity: &Entity) -> bool {
        self.members.contains(entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.members.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Pipeline;

    fn model(name: &str, version: &str) -> Entity {
        Entity::Model {
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    fn metadata() -> PipelineMetadata {
        PipelineMetadata {
            entities: vec![model("a", "1"), model("b", "1")],
            relationships: Vec::new(),
            pipelines: vec![Pipeline {
                name: "demo".to_string(),
                members: vec![model("a", "1")],
            }],
        }
    }

    #[test]
    fn all_takes_every_entity() {
        let selection = Selection::all(&metadata());
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn context_filter_narrows_to_members() {
        let selection = Selection::for_context(&metadata(), "demo").unwrap();
        assert!(selection.contains(&model("a", "1")));
        assert!(!selection.contains(&model("b", "1")));
    }

    #[test]
    fn unknown_context_is_an_error() {
        let err = Selection::for_context(&metadata(), "nope").unwrap_err();
        assert!(matches!(err, CompileError::UnknownContext(name) if name == "nope"));
    }
}
