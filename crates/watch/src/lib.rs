//! # BOM Watch
//!
//! Event-driven reconstruction loop.
//!
//! ```text
//! Document directory
//!     │ notify events / explicit triggers
//!     ▼
//! Debounce + coalesce (at most one pending rebuild)
//!     │
//!     ▼
//! Reconstructor::scan  ──>  GraphSnapshot  ──>  SnapshotStore (atomic publish)
//! ```
//!
//! One rebuild runs to completion before the next begins; triggers arriving
//! mid-rebuild collapse into a single follow-up run. Once a rebuild
//! completes, all subsequent reads observe that generation or a newer one.

mod error;
mod watcher;

pub use error::{Result, WatchError};
pub use watcher::{DocumentWatcher, DocumentWatcherConfig, RebuildUpdate};
