//! The reference finder.
//!
//! Every candidate occurrence is resolved again with [`Lookup::declaration`]
//! and kept only when it lands on the declaration asked for, so a later
//! declaration of the same name never leaks into the result. The
//! declaration asked for is first replaced by the one its own site
//! resolves to, which keeps every returned occurrence resolving back to it.

use indexmap::IndexSet;
use lumen_span::Loc;
use lumen_tree::prelude::*;

use crate::{
    decl::{DeclKind, DeclRef, MethodFeature},
    file::DeclTree,
    index::DeclHandle,
    lookup::Lookup,
};

/// A syntactic occurrence of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    pub loc: Loc,
    pub node: NodeId,
}

impl Reference {
    fn declaring(decl: &DeclHandle) -> Self {
        Self {
            loc: decl.loc,
            node: decl.node,
        }
    }
}

impl Lookup<'_> {
    /// The occurrences of whatever `node` refers to, empty when it refers to
    /// nothing.
    pub fn find_references(&self, tree: &DeclTree, node: NodeId) -> Vec<Reference> {
        self.declaration(tree, node)
            .map(|decl| self.references(decl))
            .unwrap_or_default()
    }

    /// The declaring occurrence of whatever `node` refers to.
    pub fn definition(&self, tree: &DeclTree, node: NodeId) -> Option<Reference> {
        let decl = self.declaration(tree, node)?;
        self.index.decl(decl).map(|decl| Reference::declaring(&decl))
    }

    /// Every occurrence of `decl`, the declaring one first.
    ///
    /// A declaration that its own site does not resolve to, such as a
    /// second `t.x = ...` assignment, is answered for the member the site
    /// resolves to instead.
    pub fn references(&self, decl: DeclRef) -> Vec<Reference> {
        let decl = self.canonical(decl);
        let Some(handle) = self.index.decl(decl) else {
            return Vec::new();
        };

        let mut refs = IndexSet::new();
        refs.insert(Reference::declaring(&handle));

        match handle.kind {
            DeclKind::Local
            | DeclKind::Parameter
            | DeclKind::Method {
                feature: MethodFeature::Local,
                ..
            } => self.local_references(decl, &handle, &mut refs),
            DeclKind::Global
            | DeclKind::Method {
                feature: MethodFeature::Global,
                ..
            } => self.global_references(decl, &handle, &mut refs),
            DeclKind::DocField
            | DeclKind::TableField
            | DeclKind::EnumField
            | DeclKind::Index
            | DeclKind::Method {
                feature: MethodFeature::Field,
                ..
            } => self.field_references(decl, &handle, &mut refs),
            DeclKind::NamedType(_) => self.type_references(decl, &handle, &mut refs),
            DeclKind::DocParameter | DeclKind::Label | DeclKind::GenericParameter => {}
        }

        refs.into_iter().collect()
    }

    fn canonical(&self, decl: DeclRef) -> DeclRef {
        self.index
            .decl(decl)
            .and_then(|handle| self.declaration(handle.tree(), handle.node))
            .unwrap_or(decl)
    }

    /// Name expressions of the declaring file that follow the declaration.
    fn local_references(&self, decl: DeclRef, handle: &DeclHandle, refs: &mut IndexSet<Reference>) {
        let tree = handle.tree();
        let syntax = tree.syntax();

        for id in syntax.descendants(syntax.root().erase()) {
            let Some(expr) = id.cast::<node::NameExpr>(syntax) else {
                continue;
            };

            if syntax.node(expr).name != handle.name || syntax.span(id).start <= handle.position() {
                continue;
            }

            if self.declaration(tree, id) == Some(decl) {
                refs.insert(Reference {
                    loc: syntax.loc(id),
                    node: id,
                });
            }
        }
    }

    fn global_references(&self, decl: DeclRef, handle: &DeclHandle, refs: &mut IndexSet<Reference>) {
        for (tree, id) in self.index.name_exprs(&handle.name) {
            if self.declaration(&tree, id.erase()) == Some(decl) {
                refs.insert(Reference {
                    loc: id.loc(tree.syntax()),
                    node: id.erase(),
                });
            }
        }
    }

    /// Member accesses across the project that select the field.
    ///
    /// An annotated field and a table field of the same name and owner are
    /// one symbol, the references of either include both.
    fn field_references(&self, decl: DeclRef, handle: &DeclHandle, refs: &mut IndexSet<Reference>) {
        let mut family = vec![decl];

        if handle.kind.is_field() {
            for owner in self.index.owners_of(decl) {
                for member in self.index.members(&owner) {
                    if family.contains(&member) {
                        continue;
                    }

                    let Some(sibling) = self.index.decl(member) else {
                        continue;
                    };

                    if sibling.kind.is_field() && sibling.name == handle.name {
                        refs.insert(Reference::declaring(&sibling));
                        family.push(member);
                    }
                }
            }
        }

        for (tree, id) in self.index.index_exprs(&handle.name) {
            let Some(found) = self.declaration(&tree, id.erase()) else {
                continue;
            };

            if family.contains(&found) {
                let syntax = tree.syntax();
                let loc = syntax
                    .node(id)
                    .key
                    .map_or_else(|| id.loc(syntax), |key| syntax.loc(key.erase()));

                refs.insert(Reference {
                    loc,
                    node: id.erase(),
                });
            }
        }
    }

    fn type_references(&self, decl: DeclRef, handle: &DeclHandle, refs: &mut IndexSet<Reference>) {
        for (tree, id) in self.index.type_refs(&handle.name) {
            if self.declaration(&tree, id.erase()) == Some(decl) {
                refs.insert(Reference {
                    loc: id.loc(tree.syntax()),
                    node: id.erase(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lumen_span::SourceId;
    use lumen_tree::{fixture::Fixture, node::Stat};
    use lumen_types::DocTypeInfer;

    use super::*;
    use crate::{builder::build, config::AnalysisConfig, index::ProjectIndex, resolver::Resolver};

    fn analyse(files: Vec<Box<dyn FnOnce(&mut Fixture) -> Vec<Stat> + '_>>) -> (ProjectIndex, Vec<Arc<DeclTree>>) {
        let index = ProjectIndex::new();
        let mut resolver_input = Vec::new();

        for (i, stats) in files.into_iter().enumerate() {
            let syntax = Fixture::new(SourceId::from_usize(i)).finish(stats);
            let analysis = build(Arc::new(syntax), 0, &DocTypeInfer, &AnalysisConfig::default());
            resolver_input.push((Arc::clone(analysis.index.tree()), analysis.worklist));
            index.insert(analysis.index);
        }

        let trees = resolver_input.iter().map(|(tree, _)| Arc::clone(tree)).collect();

        let mut resolver = Resolver::new(&index, 16);
        for (tree, worklist) in resolver_input {
            resolver.add(tree, worklist);
        }
        resolver.resolve();

        (index, trees)
    }

    fn decl_of(tree: &DeclTree, name: &str, kind: DeclKind) -> DeclRef {
        tree.decls()
            .find(|(_, decl)| decl.name == name && decl.kind == kind)
            .map(|(id, _)| tree.decl_ref(id))
            .expect("declaration exists")
    }

    #[test]
    fn test_annotated_and_table_fields_share_references() {
        // ---@class Point
        // ---@field x integer
        // local Point = { x = 1 }
        // local n = Point.x
        let (index, trees) = analyse(vec![Box::new(|fx| {
            fx.doc(|fx| vec![fx.class("Point", &[]).into(), fx.doc_field("x", "integer").into()]);
            let point = fx.local(&["Point"], |fx| {
                vec![fx.table(|fx| vec![fx.field("x", |fx| fx.int(1))]).into()]
            });
            let n = fx.local(&["n"], |fx| {
                let point = fx.var("Point");
                vec![fx.index(point, "x", false).into()]
            });
            vec![point.into(), n.into()]
        })]);
        let lookup = Lookup::new(&index, 16);

        let doc = decl_of(&trees[0], "x", DeclKind::DocField);
        let table = decl_of(&trees[0], "x", DeclKind::TableField);

        let from_doc = lookup.references(doc);
        let from_table = lookup.references(table);

        assert_eq!(from_doc.len(), 3);
        assert_eq!(from_doc[0].node, trees[0].decl(doc.decl).node);
        assert_eq!(from_table[0].node, trees[0].decl(table.decl).node);

        let mut from_doc = from_doc.iter().map(|r| r.node).collect::<Vec<_>>();
        let mut from_table = from_table.iter().map(|r| r.node).collect::<Vec<_>>();
        from_doc.sort();
        from_table.sort();
        assert_eq!(from_doc, from_table);
    }

    #[test]
    fn test_type_references_follow_annotations() {
        // ---@class Point
        // local Point = {}
        // ---@type Point
        // local p
        let mut annotation = None;
        let (index, trees) = analyse(vec![Box::new(|fx| {
            fx.doc(|fx| vec![fx.class("Point", &[]).into()]);
            let point = fx.local(&["Point"], |fx| vec![fx.table(|_| vec![]).into()]);
            fx.doc(|fx| {
                let ty = fx.type_ref("Point");
                annotation = Some(ty);
                vec![node::DocTypeTag::new_in(vec![ty.into()], fx.builder()).into()]
            });
            let p = fx.local(&["p"], |_| vec![]);
            vec![point.into(), p.into()]
        })]);
        let lookup = Lookup::new(&index, 16);
        let annotation = annotation.expect("annotation was built").erase();

        let class = decl_of(&trees[0], "Point", DeclKind::NamedType(crate::decl::TypeCategory::Class));
        let refs = lookup.references(class);

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].node, annotation);
        assert_eq!(lookup.definition(&trees[0], annotation).map(|r| r.node), Some(refs[0].node));
    }

    #[test]
    fn test_globals_are_found_across_files() {
        // a.lua: count = 0        b.lua: print(count)    c.lua: local count = 1; print(count)
        let mut used = None;
        let (index, trees) = analyse(vec![
            Box::new(|fx| {
                let assign = fx.assign(|fx| vec![fx.var("count").into()], |fx| vec![fx.int(0)]);
                vec![assign.into()]
            }),
            Box::new(|fx| {
                let call = fx.call_stat(|fx| {
                    let print = fx.var("print");
                    let count = fx.var("count");
                    used = Some(count);
                    fx.call(print, |_| vec![count.into()])
                });
                vec![call.into()]
            }),
            Box::new(|fx| {
                let local = fx.local(&["count"], |fx| vec![fx.int(1)]);
                let call = fx.call_stat(|fx| {
                    let print = fx.var("print");
                    let count = fx.var("count").into();
                    fx.call(print, |_| vec![count])
                });
                vec![local.into(), call.into()]
            }),
        ]);
        let lookup = Lookup::new(&index, 16);

        let global = decl_of(&trees[0], "count", DeclKind::Global);
        let refs = lookup.references(global);

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].loc.source(), SourceId::new(1));
        assert_eq!(
            lookup.find_references(&trees[1], used.expect("use was built").erase()),
            refs
        );
    }
}
