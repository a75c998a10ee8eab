//! Data model types.
//!
//! `file` holds the provider's wire format; `component` and `style` hold
//! what the pipeline hands back to callers.

mod component;
mod file;
mod style;

pub use component::{Component, Image};
pub use file::{ComponentMeta, FileDocument, Node, NodeType, Rect, StyleMeta, StyleType};
pub use style::{StyleEntry, Styles};
