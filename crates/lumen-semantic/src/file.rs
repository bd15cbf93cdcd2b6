use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use lumen_span::SourceId;
use lumen_tree::prelude::*;
use lumen_types::Type;

use crate::{
    decl::{DeclId, DeclRef, Declaration, MethodInfo},
    scope::ScopeTree,
};

/// Everything the declaration builder produced for one file.
///
/// A `DeclTree` is never edited after it is built, apart from the write-once
/// type slots of its declarations and methods. A changed file gets a new tree
/// with a new generation.
#[derive(Debug)]
pub struct DeclTree {
    source: SourceId,
    generation: u32,
    syntax: Arc<SyntaxTree>,
    decls: Vec<Declaration>,
    scopes: ScopeTree,
    anchors: HashMap<NodeId, DeclId>,
    methods: HashMap<NodeId, MethodInfo>,
    module_returns: OnceLock<Vec<Type>>,
}

impl DeclTree {
    pub(crate) fn new(
        generation: u32,
        syntax: Arc<SyntaxTree>,
        decls: Vec<Declaration>,
        scopes: ScopeTree,
        anchors: HashMap<NodeId, DeclId>,
        methods: HashMap<NodeId, MethodInfo>,
    ) -> Self {
        Self {
            source: syntax.source(),
            generation,
            syntax,
            decls,
            scopes,
            anchors,
            methods,
            module_returns: OnceLock::new(),
        }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn syntax(&self) -> &SyntaxTree {
        &self.syntax
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.as_usize()]
    }

    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.decls.get(id.as_usize())
    }

    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, decl)| (DeclId::from_usize(i), decl))
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn decl_ref(&self, decl: DeclId) -> DeclRef {
        DeclRef {
            source: self.source,
            generation: self.generation,
            decl,
        }
    }

    /// The declaration created for `node`, if `node` is a declaring site or
    /// the name token of one.
    pub fn anchored(&self, node: NodeId) -> Option<DeclId> {
        self.anchors.get(&node).copied()
    }

    /// The signature of a closure of this file.
    pub fn method(&self, closure: NodeId) -> Option<&MethodInfo> {
        self.methods.get(&closure)
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodInfo> {
        self.methods.values()
    }

    /// Finds the value declaration a use of `name` at `node` sees.
    pub fn find(&self, node: NodeId, name: &str) -> Option<DeclId> {
        let scope = self.scopes.scope_of(node, &self.syntax)?;
        let position = self.syntax.span(node).start;

        self.scopes.find(&self.decls, scope, name, position)
    }

    /// What the file returns, as inferred from its top level `return`.
    pub fn module_returns(&self) -> &[Type] {
        self.module_returns
            .get()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn set_module_returns(&self, returns: Vec<Type>) -> bool {
        self.module_returns.set(returns).is_ok()
    }
}
