//! Chart editing core
//!
//! - `fields`: input identifier table and defaults
//! - `draft`: per-chart buffer of uncommitted edits
//! - `merge`: draft + stored chart into a full write payload

pub mod draft;
pub mod fields;
pub mod merge;

pub use draft::{Draft, DraftKey, DraftStore};
pub use fields::{default_for, generate_mrn, static_default, DefaultContext, FieldId, FieldPath};
pub use merge::merge;
