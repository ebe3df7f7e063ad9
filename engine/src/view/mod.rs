//! View layer
//!
//! State is projected into a typed markup tree by [`render`]; hosts receive
//! the tree through a `ViewSink` and materialize it however they like.

pub mod markup;
pub mod render;

pub use markup::{el, text, Element, Node};
pub use render::{recovery_view, render, render_or_recover};
