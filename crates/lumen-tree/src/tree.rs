use std::collections::HashMap;

use lumen_span::{Loc, SourceId, Span};
use lumen_utils::convert::TryAsRef;

use crate::{
    id::{Id, NodeId, SyntaxId},
    node::{Comment, Node, NodeKind, Source, Stat},
};

/// Builds a [`SyntaxTree`] bottom up.
///
/// Nodes inserted with [`TreeBuilder::insert`] get their span from their
/// children, or, without children, the next free slot of an internal cursor.
/// Inserting leaves in source order therefore yields positions in source
/// order. Parsers that know real offsets use [`TreeBuilder::insert_at`].
#[derive(Debug)]
pub struct TreeBuilder {
    source: SourceId,
    nodes: Vec<Node>,
    spans: Vec<Span>,
    comments: HashMap<NodeId, Vec<Id<Comment>>>,
    cursor: usize,
}

impl TreeBuilder {
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            nodes: Vec::new(),
            spans: Vec::new(),
            comments: HashMap::new(),
            cursor: 0,
        }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn insert<T>(&mut self, node: T) -> Id<T>
    where
        Node: From<T>,
    {
        let node = Node::from(node);

        let mut children = Vec::new();
        node.children(&mut children);

        let span = Span::covering(children.iter().map(|child| self.spans[child.as_usize()]))
            .unwrap_or_else(|| {
                let width = node.leaf_width();
                let span = Span::new(self.cursor, self.cursor + width);
                self.cursor += width + 1;
                span
            });

        self.push(node, span)
    }

    pub fn insert_at<T>(&mut self, node: T, span: Span) -> Id<T>
    where
        Node: From<T>,
    {
        self.cursor = self.cursor.max(span.end + 1);
        self.push(Node::from(node), span)
    }

    fn push<T>(&mut self, node: Node, span: Span) -> Id<T> {
        let id = Id::from_usize(self.nodes.len());

        self.nodes.push(node);
        self.spans.push(span);

        id
    }

    /// Attaches documentation comments to the statement they precede.
    pub fn attach_comments(&mut self, stat: impl Into<Stat>, comments: Vec<Id<Comment>>) {
        self.comments
            .entry(stat.into().erase())
            .or_default()
            .extend(comments);
    }

    pub fn finish(self, root: Id<Source>) -> SyntaxTree {
        let Self {
            source,
            nodes,
            spans,
            comments,
            ..
        } = self;

        let mut tree = SyntaxTree {
            source,
            parents: vec![None; nodes.len()],
            nodes,
            spans,
            comments,
            root,
        };

        let mut children = Vec::new();
        for index in 0..tree.nodes.len() {
            let parent = NodeId::from_usize(index);

            children.clear();
            tree.children_into(parent, &mut children);

            for child in &children {
                tree.parents[child.as_usize()] = Some(parent);
            }
        }

        tree
    }
}

/// An immutable syntax tree of one source file.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: SourceId,
    nodes: Vec<Node>,
    spans: Vec<Span>,
    parents: Vec<Option<NodeId>>,
    comments: HashMap<NodeId, Vec<Id<Comment>>>,
    root: Id<Source>,
}

impl SyntaxTree {
    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn root(&self) -> Id<Source> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.as_usize() < self.nodes.len()
    }

    /// Typed access, the id's type parameter guarantees the variant.
    pub fn node<T>(&self, id: Id<T>) -> &T
    where
        Node: TryAsRef<T>,
    {
        match self.nodes[id.as_usize()].try_as_ref() {
            Some(node) => node,
            None => unreachable!("typed id {id:?} points at a node of another kind"),
        }
    }

    pub fn raw(&self, id: NodeId) -> &Node {
        &self.nodes[id.as_usize()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.raw(id).kind()
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.spans[id.as_usize()]
    }

    pub fn loc(&self, id: NodeId) -> Loc {
        Loc::new(self.source, self.span(id))
    }

    pub fn syntax_id<T>(&self, id: Id<T>) -> SyntaxId {
        SyntaxId::new(self.source, id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id.as_usize()]
    }

    /// The parents of `id`, nearest first, not including `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&id| self.parent(id))
    }

    /// The nearest statement containing `id`, `id` included.
    pub fn enclosing_stat(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&id| self.kind(id).is_stat())
    }

    /// The comments attached to a statement.
    pub fn comments(&self, stat: NodeId) -> &[Id<Comment>] {
        self.comments.get(&stat).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = Vec::new();
        self.children_into(id, &mut children);
        children
    }

    /// Children in source order, the comments of a statement come right
    /// before it.
    fn children_into(&self, id: NodeId, out: &mut Vec<NodeId>) {
        match self.raw(id) {
            Node::Block(block) => {
                for stat in &block.stats {
                    let stat = stat.erase();
                    out.extend(self.comments(stat).iter().map(|comment| comment.erase()));
                    out.push(stat);
                }
            }
            node => node.children(out),
        }
    }

    /// Every node below `id` in pre-order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack = self.children(id);
        stack.reverse();

        Descendants { tree: self, stack }
    }
}

pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;

        let start = self.stack.len();
        self.tree.children_into(id, &mut self.stack);
        self.stack[start..].reverse();

        Some(id)
    }
}
