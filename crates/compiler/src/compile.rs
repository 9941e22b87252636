use crate::error::{CompileError, Result};
use crate::selection::Selection;
use crate::source::PipelineMetadata;
use crate::write::{safe_filename, safe_token};
use bomref_protocol::{
    display_name, library_local_id, reference, ComponentDescriptor, Document, Entity, EntityKind,
    ExternalPointer, PrimaryDescriptor, PrimaryKind, RelationTag, Relationship,
};
use std::collections::{BTreeMap, BTreeSet};

/// One compiled document plus the filename stem it should be written under.
/// The stem is presentation only; identity always lives in the content.
#[derive(Debug, Clone)]
pub struct CompiledDocument {
    pub file_stem: String,
    pub document: Document,
}

/// Emits one self-contained document per selected model or dataset.
pub struct DocumentCompiler<'a> {
    metadata: &'a PipelineMetadata,
}

impl<'a> DocumentCompiler<'a> {
    #[must_use]
    pub const fn new(metadata: &'a PipelineMetadata) -> Self {
        Self { metadata }
    }

    pub fn compile(&self, selection: &Selection) -> Result<Vec<CompiledDocument>> {
        check_collisions(selection)?;

        let mut documents = Vec::new();
        let mut used_stems: BTreeMap<String, usize> = BTreeMap::new();
        for (index, entity) in selection.iter().filter(|e| e.is_primary()).enumerate() {
            let document = self.compile_one(entity, selection);
            let stem = file_stem(entity, index, &mut used_stems);
            documents.push(CompiledDocument {
                file_stem: stem,
                document,
            });
        }
        log::info!(
            "compiled {} documents from {} selected entities",
            documents.len(),
            selection.len()
        );
        Ok(documents)
    }

    fn compile_one(&self, entity: &Entity, selection: &Selection) -> Document {
        let identifier = reference(entity);

        let mut components = Vec::new();
        let mut dependency_ids = Vec::new();
        for relationship in &self.metadata.relationships {
            let Relationship::DependsOn { owner, target } = relationship else {
                continue;
            };
            if owner != entity || !selection.contains(target) {
                continue;
            }
            let local_id = library_local_id(target.name(), target.version());
            if dependency_ids.contains(&local_id) {
                continue;
            }
            components.push(ComponentDescriptor {
                name: display_name(target.name()).to_string(),
                version: target.version().trim().to_string(),
                local_id: local_id.clone(),
            });
            dependency_ids.push(local_id);
        }
        components.sort_by(|a, b| a.local_id.cmp(&b.local_id));
        dependency_ids.sort();

        let mut dependencies = BTreeMap::new();
        if !dependency_ids.is_empty() {
            dependencies.insert(identifier.clone(), dependency_ids);
        }

        let external_references = self.external_pointers(entity, selection);

        let kind = match entity.kind() {
            EntityKind::Model => PrimaryKind::Model,
            _ => PrimaryKind::Dataset,
        };
        Document {
            primary: PrimaryDescriptor {
                kind,
                name: display_name(entity.name()).to_string(),
                version: entity.version().trim().to_string(),
                split: entity.split().map(str::to_string),
                identifier,
                external_references,
            },
            dependencies,
            components,
        }
    }

    /// External pointers for `entity`, one per relationship whose partner is
    /// also selected. Partner outside the selection: silently omitted, so no
    /// dangling pointer is ever written.
    fn external_pointers(&self, entity: &Entity, selection: &Selection) -> Vec<ExternalPointer> {
        let mut pointers = BTreeSet::new();
        for relationship in &self.metadata.relationships {
            let tagged = match relationship {
                Relationship::ModelLineage { parent, child } => {
                    lineage_pointer(entity, parent, child, RelationTag::ParentModel, RelationTag::ChildModel)
                }
                Relationship::DatasetLineage { parent, child } => lineage_pointer(
                    entity,
                    parent,
                    child,
                    RelationTag::ParentDataset,
                    RelationTag::ChildDataset,
                ),
                Relationship::UsesDataset { model, dataset } => {
                    if entity == model {
                        Some((RelationTag::UsesDataset, dataset))
                    } else if entity == dataset {
                        Some((RelationTag::UsedByModel, model))
                    } else {
                        None
                    }
                }
                Relationship::DependsOn { .. } => None,
            };
            if let Some((relation_tag, partner)) = tagged {
                if selection.contains(partner) {
                    pointers.insert(ExternalPointer {
                        relation_tag,
                        target_reference: reference(partner),
                    });
                }
            }
        }
        pointers.into_iter().collect()
    }
}

fn lineage_pointer<'e>(
    entity: &Entity,
    parent: &'e Entity,
    child: &'e Entity,
    parent_tag: RelationTag,
    child_tag: RelationTag,
) -> Option<(RelationTag, &'e Entity)> {
    if entity == child {
        // The child's document points up at its parent.
        Some((parent_tag, parent))
    } else if entity == parent {
        Some((child_tag, child))
    } else {
        None
    }
}

/// Distinct selected entities must not normalize to one reference; merging
/// them silently would corrupt every document that points at either.
fn check_collisions(selection: &Selection) -> Result<()> {
    let mut seen: BTreeMap<String, &Entity> = BTreeMap::new();
    for entity in selection.iter() {
        let id = reference(entity);
        if let Some(previous) = seen.get(id.as_str()) {
            if *previous != entity {
                return Err(CompileError::ReferenceCollision {
                    reference: id,
                    first: describe(previous),
                    second: describe(entity),
                });
            }
        } else {
            seen.insert(id, entity);
        }
    }
    Ok(())
}

fn describe(entity: &Entity) -> String {
    format!("{:?} {}@{}", entity.kind(), entity.name(), entity.version())
}

fn file_stem(entity: &Entity, index: usize, used: &mut BTreeMap<String, usize>) -> String {
    let base = format!(
        "{}-{}",
        safe_filename(display_name(entity.name())),
        safe_token(entity.version(), &index.to_string())
    );
    let count = used.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base
    } else {
        format!("{base}-{count}")
    }
}
