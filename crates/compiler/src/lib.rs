//! # BOM Compiler
//!
//! Turns pipeline metadata into self-contained BOM documents.
//!
//! ## Pipeline
//!
//! ```text
//! Metadata source (scenario file)
//!     │
//!     ├──> Selection (all entities, or one named pipeline)
//!     │
//!     ├──> Document Compiler
//!     │      ├─ one document per model/dataset
//!     │      ├─ embed direct library dependencies
//!     │      └─ external pointers only when both endpoints are selected
//!     │
//!     └──> Document Writer (atomic, one JSON file per document)
//! ```
//!
//! Compiler-side failures (unknown pipeline, reference collisions, invalid
//! scenarios) are surfaced immediately; tolerating bad input is the
//! reconstructor's job, not the compiler's.

mod compile;
mod error;
mod selection;
mod source;
mod version;
mod write;

pub use compile::{CompiledDocument, DocumentCompiler};
pub use error::{CompileError, Result};
pub use selection::Selection;
pub use source::{MetadataSource, Pipeline, PipelineMetadata, ScenarioFile};
pub use version::{version_key, VersionPart};
pub use write::{
    clean_documents, safe_filename, safe_token, write_documents, DOCUMENT_SUFFIX,
};
