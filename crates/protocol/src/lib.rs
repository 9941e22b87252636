//! # BOM Protocol
//!
//! Shared data model for BOM compilation and graph reconstruction.
//!
//! ## Architecture
//!
//! ```text
//! Entity / Relationship
//!     │
//!     ├──> Canonical Reference (models://name/version, data://name/version[/split])
//!     │      └─ stable cross-document identity + resolver transforms
//!     │
//!     └──> Document (wire format)
//!            ├─ primary descriptor (identifier, external pointers)
//!            ├─ dependencies (local adjacency)
//!            └─ components (embedded libraries)
//! ```
//!
//! The compiler emits documents from entities; the reconstructor reads them
//! back. Both sides share this crate so that what the compiler names, the
//! resolver can always find.

mod document;
mod entity;
mod reference;

pub use document::{
    ComponentDescriptor, Document, ExternalPointer, PrimaryDescriptor, PrimaryKind, RelationTag,
};
pub use entity::{Entity, EntityKind, Relationship};
pub use reference::{
    add_name_qualifier, append_default_split, display_name, library_local_id, reference,
    split_reference, strip_name_qualifier, strip_split, DATASET_QUALIFIER, DATA_SCHEME,
    DEFAULT_SPLIT, MODEL_SCHEME, NAME_PLACEHOLDER,
};
