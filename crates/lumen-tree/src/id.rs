use std::{fmt, hash::Hash, marker::PhantomData};

use lumen_span::{Loc, SourceId, Span};
use lumen_utils::convert::TryAsRef;
use serde::{Deserialize, Serialize};

use crate::{node::Node, tree::SyntaxTree};

pub type NodeId = Id<Node>;

pub struct Id<T> {
    id: u32,
    t: PhantomData<fn() -> T>,
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq(&other.id)
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.id)
    }
}

impl<T> Id<T> {
    pub(crate) fn new(id: u32) -> Self {
        Self { id, t: PhantomData }
    }

    pub(crate) fn from_usize(id: usize) -> Self {
        Self::new(id as u32)
    }

    pub fn as_usize(&self) -> usize {
        self.id as usize
    }

    /// Forgets the node type, every id can be widened to a [`NodeId`].
    pub fn erase(self) -> NodeId {
        Id::new(self.id)
    }

    pub fn get(self, tree: &SyntaxTree) -> &T
    where
        Node: TryAsRef<T>,
    {
        tree.node(self)
    }

    pub fn span(self, tree: &SyntaxTree) -> Span {
        tree.span(self.erase())
    }

    pub fn loc(self, tree: &SyntaxTree) -> Loc {
        tree.loc(self.erase())
    }
}

impl NodeId {
    /// Narrows an untyped id, `None` if the node is of another kind.
    pub fn cast<T>(self, tree: &SyntaxTree) -> Option<Id<T>>
    where
        Node: TryAsRef<T>,
    {
        TryAsRef::<T>::try_as_ref(tree.raw(self)).map(|_| Id::new(self.id))
    }
}

/// Identity of a syntax node across the whole project.
///
/// Anonymous constructs (closures, table literals, table type annotations)
/// use it as their synthetic owner key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SyntaxId {
    pub source: SourceId,
    pub node: u32,
}

impl SyntaxId {
    pub fn new<T>(source: SourceId, id: Id<T>) -> Self {
        Self {
            source,
            node: id.id,
        }
    }

    pub fn node(self) -> NodeId {
        Id::new(self.node)
    }
}

impl fmt::Debug for SyntaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SyntaxId({}:{})", self.source, self.node)
    }
}

impl fmt::Display for SyntaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.source, self.node)
    }
}
