//! Mutable DOM tree
//!
//! An arena-backed document addressed by [`NodeId`] handles, with the typed
//! element taxonomy and XPath-based node identity built on top.

mod document;
mod element;
mod node;
pub mod xpath;

pub use document::{Ancestors, Document, QuirksMode, Subtree};
pub use element::{is_void_tag, ElementKind};
pub use node::{ElementData, NodeData, NodeId};
