//! The project wide index of named entities.
//!
//! Every file publishes one [`FileIndex`]. The [`ProjectIndex`] stores them
//! keyed by source, so replacing or retracting the contributions of one file
//! is a single map operation and never touches the entries of other files.
//! Lookups gather candidates from all files and leave the choice between
//! them to the caller.

use std::{fmt, ops::Deref, sync::Arc};

use dashmap::DashMap;
use derive_more::From;
use indexmap::IndexMap;
use log::{debug, trace};
use lumen_span::SourceId;
use lumen_tree::prelude::*;
use lumen_types::{Type, TypeOperator};

use crate::{
    decl::{DeclId, DeclRef, Declaration, TypeCategory},
    file::DeclTree,
};

/// Whose member a declaration is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, From)]
pub enum Owner {
    /// A class, interface, enum or alias.
    Named(Symbol),
    /// A table constructor or table type annotation.
    Anonymous(SyntaxId),
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Named(name) => write!(f, "{name}"),
            Owner::Anonymous(id) => write!(f, "table{id}"),
        }
    }
}

/// The contributions of one file, grouped by category.
#[derive(Debug, Clone, Default)]
pub struct IndexEntries {
    pub globals: IndexMap<Symbol, Vec<DeclId>>,
    pub types: IndexMap<Symbol, Vec<(DeclId, TypeCategory)>>,
    pub members: IndexMap<Owner, Vec<DeclId>>,
    pub aliases: IndexMap<Symbol, Vec<(Type, DeclId)>>,
    pub supers: IndexMap<Symbol, Vec<Type>>,
    pub generics: IndexMap<Symbol, Vec<DeclId>>,
    pub operators: IndexMap<Owner, Vec<TypeOperator>>,
    pub name_exprs: IndexMap<Symbol, Vec<Id<node::NameExpr>>>,
    pub index_exprs: IndexMap<Symbol, Vec<Id<node::IndexExpr>>>,
    pub type_refs: IndexMap<Symbol, Vec<Id<node::DocNameType>>>,
}

impl IndexEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_global(&mut self, name: Symbol, decl: DeclId) {
        self.globals.entry(name).or_default().push(decl);
    }

    pub fn add_type(&mut self, name: Symbol, decl: DeclId, category: TypeCategory) {
        self.types.entry(name).or_default().push((decl, category));
    }

    pub fn add_member(&mut self, owner: Owner, decl: DeclId) {
        let members = self.members.entry(owner).or_default();

        if !members.contains(&decl) {
            members.push(decl);
        }
    }

    pub fn add_alias(&mut self, name: Symbol, base: Type, decl: DeclId) {
        self.aliases.entry(name).or_default().push((base, decl));
    }

    pub fn add_super(&mut self, name: Symbol, ty: Type) {
        self.supers.entry(name).or_default().push(ty);
    }

    pub fn add_generic(&mut self, name: Symbol, decl: DeclId) {
        self.generics.entry(name).or_default().push(decl);
    }

    pub fn add_operator(&mut self, owner: Owner, op: TypeOperator) {
        self.operators.entry(owner).or_default().push(op);
    }

    pub fn add_name_expr(&mut self, name: Symbol, id: Id<node::NameExpr>) {
        self.name_exprs.entry(name).or_default().push(id);
    }

    pub fn add_index_expr(&mut self, key: Symbol, id: Id<node::IndexExpr>) {
        self.index_exprs.entry(key).or_default().push(id);
    }

    pub fn add_type_ref(&mut self, name: Symbol, id: Id<node::DocNameType>) {
        self.type_refs.entry(name).or_default().push(id);
    }
}

/// One file's declarations together with its index entries.
#[derive(Debug, Clone)]
pub struct FileIndex {
    tree: Arc<DeclTree>,
    entries: IndexEntries,
}

impl FileIndex {
    pub fn new(tree: Arc<DeclTree>, entries: IndexEntries) -> Self {
        Self { tree, entries }
    }

    pub fn source(&self) -> SourceId {
        self.tree.source()
    }

    pub fn tree(&self) -> &Arc<DeclTree> {
        &self.tree
    }

    pub fn entries(&self) -> &IndexEntries {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut IndexEntries {
        &mut self.entries
    }

    fn refs<'a>(&'a self, ids: &'a [DeclId]) -> impl Iterator<Item = DeclRef> + 'a {
        ids.iter().map(|&id| self.tree.decl_ref(id))
    }
}

/// A declaration kept alive together with the tree that owns it.
#[derive(Debug, Clone)]
pub struct DeclHandle {
    tree: Arc<DeclTree>,
    id: DeclId,
}

impl DeclHandle {
    pub fn tree(&self) -> &Arc<DeclTree> {
        &self.tree
    }

    pub fn id(&self) -> DeclId {
        self.id
    }

    pub fn decl_ref(&self) -> DeclRef {
        self.tree.decl_ref(self.id)
    }
}

impl Deref for DeclHandle {
    type Target = Declaration;

    fn deref(&self) -> &Self::Target {
        self.tree.decl(self.id)
    }
}

/// The published state of every analysed file.
///
/// Each file lives behind its own `Arc`. Publishing a new generation swaps
/// the `Arc` in one step, so a reader sees either all of the old entries of
/// a file or all of the new ones.
#[derive(Debug, Default)]
pub struct ProjectIndex {
    files: DashMap<SourceId, Arc<FileIndex>>,
}

impl ProjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, source: SourceId) -> bool {
        self.files.contains_key(&source)
    }

    /// Publishes the entries of a file, replacing what it contributed before.
    pub fn insert(&self, file: FileIndex) -> Option<Arc<FileIndex>> {
        let source = file.source();
        debug!(
            "publish {source} generation {} with {} declarations",
            file.tree.generation(),
            file.tree.len()
        );

        self.files.insert(source, Arc::new(file))
    }

    /// Removes everything a file contributed.
    pub fn retract(&self, source: SourceId) -> Option<Arc<FileIndex>> {
        debug!("retract {source}");
        self.files.remove(&source).map(|(_, file)| file)
    }

    /// Edits the published entries of a file in place.
    ///
    /// The closure runs while the file is locked and must not read the index.
    pub fn amend(&self, source: SourceId, edit: impl FnOnce(&mut IndexEntries)) -> bool {
        match self.files.get_mut(&source) {
            Some(mut file) => {
                trace!("amend {source}");
                edit(Arc::make_mut(file.value_mut()).entries_mut());
                true
            }
            None => false,
        }
    }

    pub fn file(&self, source: SourceId) -> Option<Arc<FileIndex>> {
        self.files.get(&source).map(|file| Arc::clone(file.value()))
    }

    /// All files ordered by source, the order every lookup reports in.
    pub fn decl_tree(&self, source: SourceId) -> Option<Arc<DeclTree>> {
        self.file(source).map(|file| Arc::clone(file.tree()))
    }

    /// Dereferences a declaration, `None` once its file has been rebuilt or
    /// retracted.
    pub fn decl(&self, decl: DeclRef) -> Option<DeclHandle> {
        let tree = self.decl_tree(decl.source)?;

        if tree.generation() != decl.generation || tree.get(decl.decl).is_none() {
            return None;
        }

        Some(DeclHandle { tree, id: decl.decl })
    }

    pub fn globals(&self, name: &str) -> Vec<DeclRef> {
        self.collect(|file| {
            file.entries
                .globals
                .get(name)
                .map(|ids| file.refs(ids).collect())
                .unwrap_or_default()
        })
    }

    pub fn types(&self, name: &str) -> Vec<(DeclRef, TypeCategory)> {
        self.collect(|file| {
            file.entries
                .types
                .get(name)
                .map(|types| {
                    types
                        .iter()
                        .map(|&(id, category)| (file.tree.decl_ref(id), category))
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    pub fn members(&self, owner: &Owner) -> Vec<DeclRef> {
        self.collect(|file| {
            file.entries
                .members
                .get(owner)
                .map(|ids| file.refs(ids).collect())
                .unwrap_or_default()
        })
    }

    pub fn aliases(&self, name: &str) -> Vec<(Type, DeclRef)> {
        self.collect(|file| {
            file.entries
                .aliases
                .get(name)
                .map(|aliases| {
                    aliases
                        .iter()
                        .map(|(base, id)| (base.clone(), file.tree.decl_ref(*id)))
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    pub fn supers(&self, name: &str) -> Vec<Type> {
        self.collect(|file| file.entries.supers.get(name).cloned().unwrap_or_default())
    }

    pub fn generics(&self, name: &str) -> Vec<DeclRef> {
        self.collect(|file| {
            file.entries
                .generics
                .get(name)
                .map(|ids| file.refs(ids).collect())
                .unwrap_or_default()
        })
    }

    pub fn operators(&self, owner: &Owner) -> Vec<TypeOperator> {
        self.collect(|file| file.entries.operators.get(owner).cloned().unwrap_or_default())
    }

    pub fn name_exprs(&self, name: &str) -> Vec<(Arc<DeclTree>, Id<node::NameExpr>)> {
        self.occurrences(|entries| entries.name_exprs.get(name))
    }

    pub fn index_exprs(&self, key: &str) -> Vec<(Arc<DeclTree>, Id<node::IndexExpr>)> {
        self.occurrences(|entries| entries.index_exprs.get(key))
    }

    pub fn type_refs(&self, name: &str) -> Vec<(Arc<DeclTree>, Id<node::DocNameType>)> {
        self.occurrences(|entries| entries.type_refs.get(name))
    }

    /// The owners a declaration is registered as a member of.
    pub fn owners_of(&self, decl: DeclRef) -> Vec<Owner> {
        let Some(file) = self.file(decl.source) else {
            return Vec::new();
        };

        if file.tree.generation() != decl.generation {
            return Vec::new();
        }

        file.entries
            .members
            .iter()
            .filter(|(_, members)| members.contains(&decl.decl))
            .map(|(owner, _)| owner.clone())
            .collect()
    }

    /// Applies `select` to every file without taking a snapshot, then
    /// orders the non-empty selections by source.
    fn collect<T>(&self, select: impl Fn(&FileIndex) -> Vec<T>) -> Vec<T> {
        let mut selected = self
            .files
            .iter()
            .filter_map(|file| {
                let found = select(file.value());
                (!found.is_empty()).then(|| (*file.key(), found))
            })
            .collect::<Vec<_>>();

        selected.sort_by_key(|&(source, _)| source);
        selected.into_iter().flat_map(|(_, found)| found).collect()
    }

    fn occurrences<T>(
        &self,
        select: impl Fn(&IndexEntries) -> Option<&Vec<Id<T>>>,
    ) -> Vec<(Arc<DeclTree>, Id<T>)> {
        self.collect(|file| {
            select(&file.entries)
                .into_iter()
                .flatten()
                .map(|&id| (Arc::clone(&file.tree), id))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use lumen_span::{Loc, Span};

    use super::*;
    use crate::{
        decl::{DeclKind, Declaration},
        scope::ScopeTree,
    };

    fn file(source: u32, generation: u32, globals: &[&str]) -> FileIndex {
        let source = SourceId::new(source);
        let mut builder = TreeBuilder::new(source);
        let mut decls = Vec::new();
        let mut entries = IndexEntries::new();

        for (i, name) in globals.iter().enumerate() {
            let node = node::NameExpr::new_in(*name, &mut builder);
            let loc = Loc::new(source, Span::new(i * 10, i * 10 + name.len()));
            decls.push(Declaration::new(*name, DeclKind::Global, node.erase(), loc));
            entries.add_global((*name).into(), DeclId::from_usize(i));
            entries.add_name_expr((*name).into(), node);
        }

        let block = node::Block::new_in(vec![], &mut builder);
        let root = node::Source::new_in(Some(block), &mut builder);
        let syntax = Arc::new(builder.finish(root));

        let tree = DeclTree::new(
            generation,
            syntax,
            decls,
            ScopeTree::new(),
            HashMap::new(),
            HashMap::new(),
        );

        FileIndex::new(Arc::new(tree), entries)
    }

    #[test]
    fn test_globals_merge_across_files() {
        let index = ProjectIndex::new();
        index.insert(file(1, 0, &["config", "helper"]));
        index.insert(file(0, 0, &["config"]));

        let sources = index
            .globals("config")
            .into_iter()
            .map(|decl| decl.source)
            .collect::<Vec<_>>();

        assert_eq!(sources, vec![SourceId::new(0), SourceId::new(1)]);
        assert_eq!(index.globals("helper").len(), 1);
        assert!(index.globals("missing").is_empty());
    }

    #[test]
    fn test_occurrences_are_ordered_by_source() {
        let index = ProjectIndex::new();
        for source in [3, 0, 2, 1] {
            index.insert(file(source, 0, &["a"]));
        }
        index.insert(file(4, 0, &["b"]));

        let sources = index
            .name_exprs("a")
            .into_iter()
            .map(|(tree, _)| tree.source())
            .collect::<Vec<_>>();

        assert_eq!(sources, (0..4).map(SourceId::new).collect::<Vec<_>>());
        assert_eq!(index.name_exprs("b").len(), 1);
        assert!(index.name_exprs("missing").is_empty());
    }

    #[test]
    fn test_retract_removes_only_one_file() {
        let index = ProjectIndex::new();
        index.insert(file(0, 0, &["a"]));
        index.insert(file(1, 0, &["a", "b"]));

        index.retract(SourceId::new(1));

        assert_eq!(index.globals("a").len(), 1);
        assert!(index.globals("b").is_empty());
    }

    #[test]
    fn test_retract_and_reinsert_is_idempotent() {
        let index = ProjectIndex::new();
        index.insert(file(0, 3, &["a", "b"]));
        index.insert(file(1, 0, &["a"]));

        let before = (index.globals("a"), index.globals("b"));
        let retracted = index.retract(SourceId::new(0)).expect("file was published");
        index.insert(FileIndex::clone(&retracted));
        let after = (index.globals("a"), index.globals("b"));

        assert_eq!(before, after);
    }

    #[test]
    fn test_stale_references_stop_resolving() {
        let index = ProjectIndex::new();
        index.insert(file(0, 0, &["a"]));
        let stale = index.globals("a")[0];

        assert_eq!(index.decl(stale).map(|decl| decl.name.clone()), Some("a".into()));

        index.insert(file(0, 1, &["a"]));
        assert!(index.decl(stale).is_none());
        assert!(index.decl(index.globals("a")[0]).is_some());
    }

    #[test]
    fn test_amend_adds_members() {
        let index = ProjectIndex::new();
        index.insert(file(0, 0, &["a"]));
        let decl = index.globals("a")[0];
        let owner = Owner::Named("Point".into());

        assert!(index.amend(decl.source, |entries| entries.add_member(owner.clone(), decl.decl)));
        assert!(!index.amend(SourceId::new(9), |_| {}));

        assert_eq!(index.members(&owner), vec![decl]);
        assert_eq!(index.owners_of(decl), vec![owner]);
    }
}
