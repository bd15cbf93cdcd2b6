//! The syntax tree consumed by the semantic model.
//!
//! Nodes live in a flat arena owned by [`SyntaxTree`] and are addressed by
//! typed [`Id`](id::Id)s. Every node has a span, a parent link and, for
//! statements, the documentation comments written right above it.

pub mod id;
pub mod node;
pub mod tree;
pub mod visit;

#[cfg(any(test, feature = "fixture"))]
pub mod fixture;

pub mod prelude {
    pub use crate::id::{Id, NodeId, SyntaxId};
    pub use crate::node::{self, Node, NodeKind, Symbol};
    pub use crate::tree::{SyntaxTree, TreeBuilder};
    pub use crate::visit::{Event, EventStack, Visitor};
}
