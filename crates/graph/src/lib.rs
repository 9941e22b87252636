//! # BOM Graph
//!
//! Reconstructs the entity relationship graph from an unordered collection
//! of BOM documents.
//!
//! ## Architecture
//!
//! ```text
//! Document directory
//!     │
//!     ├──> Reconstructor (two passes)
//!     │      ├─ pass 1: nodes + alias table
//!     │      └─ pass 2: dependency adjacency + resolved external pointers
//!     │
//!     ├──> Resolver (ordered fallback chain)
//!     │      exact → case fold → qualifier stripped → default split
//!     │
//!     ├──> Layout Assigner (version-chain columns, dependency circles)
//!     │
//!     └──> Snapshot Store (atomic Arc swap, one writer, many readers)
//! ```
//!
//! No error while reading documents is fatal: malformed files are skipped,
//! unresolvable pointers drop only their edge, and the worst outcome is a
//! smaller graph plus diagnostics.

mod alias;
mod error;
mod layout;
mod reconstruct;
mod resolve;
mod snapshot;
mod types;

pub use alias::AliasTable;
pub use error::{GraphError, Result};
pub use layout::{assign_positions, BASE_RADIUS, COLUMN_SPACING, RADIUS_STEP, ROW_SPACING};
pub use reconstruct::{ReconstructStats, Reconstruction, Reconstructor};
pub use resolve::{Resolved, ResolutionStep, Resolver, Unresolved};
pub use snapshot::{EdgeView, GraphSnapshot, NodeDetails, NodeView, SnapshotStore};
pub use types::{BomGraph, EdgeKind, EdgeRecord, NodeKind, NodeRecord, Provenance};
