//! Finding the declaration a piece of syntax refers to.

use std::collections::{HashSet, VecDeque};

use lumen_span::SourceId;
use lumen_tree::prelude::*;
use lumen_types::Type;
use lumen_utils::as_variant;

use crate::{
    decl::DeclRef,
    file::DeclTree,
    index::{Owner, ProjectIndex},
};

/// Read access to the project for resolving names, members and types.
///
/// A lookup never stores what it finds, every answer reflects the index
/// at the moment of the call.
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    pub(crate) index: &'a ProjectIndex,
    max_super_depth: usize,
}

impl<'a> Lookup<'a> {
    pub fn new(index: &'a ProjectIndex, max_super_depth: usize) -> Self {
        Self {
            index,
            max_super_depth,
        }
    }

    pub fn index(&self) -> &'a ProjectIndex {
        self.index
    }

    /// The declaration `node` refers to, or the one it declares.
    ///
    /// Member accesses are resolved through the type of their prefix first,
    /// so `p.x` finds the field of the class `p` has even where the
    /// assignment `p.x = 1` declares a field of its own.
    pub fn declaration(&self, tree: &DeclTree, node: NodeId) -> Option<DeclRef> {
        let syntax = tree.syntax();

        if let Some(found) = member_access(syntax, node).and_then(|index| self.index_member(tree, index)) {
            return Some(found);
        }

        if let Some(decl) = tree.anchored(node) {
            return Some(tree.decl_ref(decl));
        }

        if let Some(expr) = as_variant!(syntax.raw(node), Node::NameExpr) {
            return tree
                .find(node, &expr.name)
                .map(|decl| tree.decl_ref(decl))
                .or_else(|| self.global(&expr.name, tree.source()));
        }

        if let Some(ty) = as_variant!(syntax.raw(node), Node::DocNameType) {
            return self.named_type(&ty.name, tree.source());
        }

        None
    }

    /// The global a name refers to from `from`.
    ///
    /// A definition in the same file wins, earliest first. Otherwise the
    /// first definition by source and position is taken.
    pub fn global(&self, name: &str, from: SourceId) -> Option<DeclRef> {
        self.prefer(self.index.globals(name), from)
    }

    /// The class, interface, enum or alias named `name`, chosen like a global.
    pub fn named_type(&self, name: &str, from: SourceId) -> Option<DeclRef> {
        let types = self
            .index
            .types(name)
            .into_iter()
            .map(|(decl, _)| decl)
            .collect();

        self.prefer(types, from)
    }

    fn prefer(&self, candidates: Vec<DeclRef>, from: SourceId) -> Option<DeclRef> {
        candidates
            .into_iter()
            .filter_map(|decl| Some((decl, self.index.decl(decl)?.position())))
            .min_by_key(|&(decl, position)| (decl.source != from, decl.source, position))
            .map(|(decl, _)| decl)
    }

    /// Finds the member `name` of `owner`, walking super types breadth first.
    ///
    /// Direct members shadow inherited ones. Among members of the same
    /// owner, annotated fields win over enum fields, methods, table fields
    /// and assigned fields, in this order.
    pub fn member(&self, owner: &Owner, name: &str) -> Option<DeclRef> {
        let mut queue = VecDeque::from([(owner.clone(), 0)]);
        let mut seen = HashSet::new();

        while let Some((owner, depth)) = queue.pop_front() {
            if !seen.insert(owner.clone()) {
                continue;
            }

            if let Some(found) = self.direct_member(&owner, name) {
                return Some(found);
            }

            if depth >= self.max_super_depth {
                continue;
            }

            if let Owner::Named(type_name) = &owner {
                for ty in self.index.supers(type_name) {
                    for owner in self.owners_of_type(&ty) {
                        queue.push_back((owner, depth + 1));
                    }
                }
            }
        }

        None
    }

    fn direct_member(&self, owner: &Owner, name: &str) -> Option<DeclRef> {
        self.index
            .members(owner)
            .into_iter()
            .filter_map(|decl| {
                let handle = self.index.decl(decl)?;
                (handle.name == name).then(|| (decl, handle.kind.member_rank(), handle.position()))
            })
            .min_by_key(|&(decl, rank, position)| (rank, decl.source, position))
            .map(|(decl, ..)| decl)
    }

    /// The owners whose members a value of type `ty` has.
    pub fn owners_of_type(&self, ty: &Type) -> Vec<Owner> {
        let mut owners = Vec::new();
        self.collect_owners(ty, 0, &mut owners);
        owners
    }

    fn collect_owners(&self, ty: &Type, depth: usize, owners: &mut Vec<Owner>) {
        if depth > self.max_super_depth {
            return;
        }

        match ty {
            Type::Named(name) | Type::GenericApp { name, .. } => {
                let owner = Owner::Named(name.clone());
                if owners.contains(&owner) {
                    return;
                }
                owners.push(owner);

                for (base, _) in self.index.aliases(name) {
                    self.collect_owners(&base, depth + 1, owners);
                }
            }
            Type::TableLiteral(id) => {
                let owner = Owner::Anonymous(*id);
                if !owners.contains(&owner) {
                    owners.push(owner);
                }
            }
            Type::Union(types) => {
                for ty in types {
                    self.collect_owners(ty, depth + 1, owners);
                }
            }
            _ => {}
        }
    }

    /// Resolves `prefix.key` through the type of `prefix`.
    pub(crate) fn index_member(&self, tree: &DeclTree, index: Id<node::IndexExpr>) -> Option<DeclRef> {
        let node = tree.syntax().node(index);
        let key = node.key_name(tree.syntax())?;
        let prefix = node.prefix?;

        let ty = self.expr_type(tree, prefix, 0);
        self.owners_of_type(&ty)
            .iter()
            .find_map(|owner| self.member(owner, &key))
    }
}

/// The member access `node` is, or is the key of.
fn member_access(tree: &SyntaxTree, node: NodeId) -> Option<Id<node::IndexExpr>> {
    if let Some(index) = node.cast(tree) {
        return Some(index);
    }

    let parent = tree.parent(node)?.cast::<node::IndexExpr>(tree)?;
    let key = tree.node(parent).key?;

    (key.erase() == node).then_some(parent)
}
