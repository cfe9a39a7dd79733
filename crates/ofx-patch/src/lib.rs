//! OFX Patch Engine
//!
//! Ordered partial-update operations applied to a resolved record.
//!
//! # Core Concepts
//!
//! - [`PatchOperation`]: One `{op, path, value}` instruction
//! - [`FieldPath`]: Dotted address of a field in the record's serialized form
//! - [`parse_operations`]: Reads a bare operation list or a `PatchOp` envelope
//! - [`PatchPlan`]: Operations bound to their target, applied one at a time
//!
//! Operations commit individually. A failing operation aborts the rest of
//! the list but does not undo the ones before it.
//!
//! # Example
//!
//! ```rust
//! use ofx_patch::PatchPlan;
//! use ofx_resource::{entities::Group, ResourceId, SharedRecord};
//!
//! let group = SharedRecord::new(Group::new("before").with_id(ResourceId::new("g1")));
//! let plan = PatchPlan::parse(
//!     group.clone(),
//!     r#"[ { "op": "replace", "path": "displayName", "value": "after" } ]"#,
//! )
//! .unwrap();
//!
//! plan.apply().unwrap();
//! assert_eq!(group.read().display_name.as_deref(), Some("after"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod engine;
mod error;
mod operation;
mod path;

// Re-exports
pub use engine::{apply_operation, apply_to_document, PatchPlan};
pub use error::PatchError;
pub use operation::{parse_operations, PatchOp, PatchOperation};
pub use path::{FieldPath, FilterValue, PathError, Segment, ValueFilter};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
