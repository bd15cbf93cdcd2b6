//! Lexical scopes of one file.
//!
//! Every scope owning construct gets a [`Scope`]. Its items are the
//! declarations and child scopes created while it was active, in the order
//! they were created. Lookups are positional: only declarations that start
//! before the use are candidates, and the last matching one wins.

use std::collections::HashMap;

use lumen_span::Span;
use lumen_tree::prelude::*;
use lumen_utils::define_id;

use crate::decl::{DeclId, Declaration};

define_id!(ScopeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Source,
    Block,
    Closure,
    /// The condition of a `repeat` sees everything declared in its body.
    Repeat,
    /// The loop variable is only visible from `body_start` on.
    For { body_start: usize },
    ForRange { body_start: usize },
    /// Wraps a single `local` statement, its names become visible to the
    /// enclosing block once the statement ends.
    LocalStat,
}

impl ScopeKind {
    /// The scope a node of this kind opens, if any.
    pub fn of(id: NodeId, tree: &SyntaxTree) -> Option<Self> {
        let body_start = |block: Option<Id<node::Block>>| {
            block.map_or(tree.span(id).end, |block| block.span(tree).start)
        };

        let kind = match tree.raw(id) {
            Node::Source(_) => Self::Source,
            Node::Block(_) => Self::Block,
            Node::ClosureExpr(_) => Self::Closure,
            Node::RepeatStat(_) => Self::Repeat,
            Node::ForStat(stat) => Self::For {
                body_start: body_start(stat.block),
            },
            Node::ForRangeStat(stat) => Self::ForRange {
                body_start: body_start(stat.block),
            },
            Node::LocalStat(_) => Self::LocalStat,
            _ => return None,
        };

        Some(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeItem {
    Decl(DeclId),
    Scope(ScopeId),
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub owner: NodeId,
    pub span: Span,
    pub parent: Option<ScopeId>,
    pub items: Vec<ScopeItem>,
}

impl Scope {
    pub fn declarations(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.items.iter().filter_map(|item| match item {
            ScopeItem::Decl(decl) => Some(*decl),
            ScopeItem::Scope(_) => None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    owners: HashMap<NodeId, ScopeId>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn root(&self) -> Option<ScopeId> {
        (!self.scopes.is_empty()).then(|| ScopeId::new(0))
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.as_usize()]
    }

    pub fn owned_by(&self, owner: NodeId) -> Option<ScopeId> {
        self.owners.get(&owner).copied()
    }

    /// Registers the scope of `owner` under `parent`, or returns the scope
    /// already registered for it.
    pub fn open(
        &mut self,
        kind: ScopeKind,
        owner: NodeId,
        span: Span,
        parent: Option<ScopeId>,
    ) -> ScopeId {
        if let Some(id) = self.owned_by(owner) {
            return id;
        }

        let id = ScopeId::from_usize(self.scopes.len());
        self.scopes.push(Scope {
            kind,
            owner,
            span,
            parent,
            items: Vec::new(),
        });
        self.owners.insert(owner, id);

        if let Some(parent) = parent {
            self.scopes[parent.as_usize()].items.push(ScopeItem::Scope(id));
        }

        id
    }

    pub fn add(&mut self, scope: ScopeId, decl: DeclId) {
        self.scopes[scope.as_usize()].items.push(ScopeItem::Decl(decl));
    }

    /// The innermost scope containing `id`.
    pub fn scope_of(&self, id: NodeId, tree: &SyntaxTree) -> Option<ScopeId> {
        std::iter::once(id)
            .chain(tree.ancestors(id))
            .find_map(|id| self.owned_by(id))
    }

    /// Finds the value declaration `name` refers to when used at `position`
    /// inside `scope`.
    pub fn find(
        &self,
        decls: &[Declaration],
        scope: ScopeId,
        name: &str,
        position: usize,
    ) -> Option<DeclId> {
        let mut current = Some(scope);

        while let Some(id) = current {
            let scope = self.get(id);

            if let Some(found) = self.find_enclosing(decls, scope, name, position) {
                return Some(found);
            }

            current = scope.parent;
        }

        None
    }

    /// Searches a scope that encloses the use.
    fn find_enclosing(
        &self,
        decls: &[Declaration],
        scope: &Scope,
        name: &str,
        position: usize,
    ) -> Option<DeclId> {
        match scope.kind {
            // The use is part of the statement itself.
            ScopeKind::LocalStat => None,
            ScopeKind::For { body_start } | ScopeKind::ForRange { body_start }
                if position < body_start =>
            {
                None
            }
            ScopeKind::Repeat => self.find_items(decls, scope, name, position, true),
            _ => self.find_items(decls, scope, name, position, false),
        }
    }

    fn find_items(
        &self,
        decls: &[Declaration],
        scope: &Scope,
        name: &str,
        position: usize,
        transparent_blocks: bool,
    ) -> Option<DeclId> {
        for item in scope.items.iter().rev() {
            match *item {
                ScopeItem::Decl(id) => {
                    if is_visible(&decls[id.as_usize()], name, position) {
                        return Some(id);
                    }
                }
                ScopeItem::Scope(child) => {
                    let child = self.get(child);

                    let found = match child.kind {
                        ScopeKind::LocalStat if child.span.end <= position => child
                            .declarations()
                            .collect::<Vec<_>>()
                            .into_iter()
                            .rev()
                            .find(|&id| is_visible(&decls[id.as_usize()], name, position)),
                        ScopeKind::Block if transparent_blocks => {
                            self.find_items(decls, child, name, position, false)
                        }
                        _ => None,
                    };

                    if found.is_some() {
                        return found;
                    }
                }
            }
        }

        None
    }
}

fn is_visible(decl: &Declaration, name: &str, position: usize) -> bool {
    decl.kind.is_value() && decl.name == name && decl.position() < position
}
