//! Immutable, self-contained copies of a form's public content.
//!
//! A snapshot is built from the live authoring graph at publish (or draft-save) time
//! and stored verbatim in `form_versions`. Everything downstream of the version store
//! reads snapshots, never the live tables.

pub mod builder;
pub mod types;

pub use builder::{build_snapshot, FormGraph};
pub use types::{
    CanvasPosition, FormMetadata, FormSnapshot, SnapshotEdge, SnapshotError, SnapshotOption,
    SnapshotQuestion,
};
