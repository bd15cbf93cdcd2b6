//! The declaration builder.
//!
//! One depth-first walk over a syntax tree creates the scope tree, every
//! declaration of the file, the file's index entries and the tasks the
//! resolver runs once the whole change set is published. Constructs with
//! missing children are skipped one at a time, the walk itself never fails.

use std::{collections::HashMap, convert::Infallible, ops::ControlFlow, sync::Arc};

use ecow::eco_format;
use log::trace;
use lumen_tree::{
    node::{ClassKind, DocFieldKey, DocTag, DocType, Expr, FuncTarget},
    prelude::*,
};
use lumen_types::{OperatorKind, Signature, Type, TypeInfer, TypeOperator};

use crate::{
    config::AnalysisConfig,
    decl::{DeclId, DeclKind, Declaration, MethodFeature, MethodInfo, TypeCategory},
    file::DeclTree,
    index::{FileIndex, IndexEntries, Owner},
    scope::{ScopeId, ScopeKind, ScopeTree},
    worklist::{ExprRef, ResolveState, ResolveTask, Worklist},
};

/// The result of building one file, ready to be published.
#[derive(Debug)]
pub struct FileAnalysis {
    pub index: FileIndex,
    pub worklist: Worklist,
}

/// Builds the declarations of `syntax`.
pub fn build(
    syntax: Arc<SyntaxTree>,
    generation: u32,
    infer: &dyn TypeInfer,
    config: &AnalysisConfig,
) -> FileAnalysis {
    let mut builder = DeclarationBuilder::new(infer, config);

    match builder.walk(syntax.root().erase(), &syntax) {
        ControlFlow::Continue(()) => {}
        ControlFlow::Break(never) => match never {},
    }

    builder.finish(generation, syntax)
}

struct DeclarationBuilder<'a> {
    infer: &'a dyn TypeInfer,
    config: &'a AnalysisConfig,
    decls: Vec<Declaration>,
    scopes: ScopeTree,
    stack: Vec<ScopeId>,
    anchors: HashMap<NodeId, DeclId>,
    methods: HashMap<NodeId, MethodInfo>,
    entries: IndexEntries,
    worklist: Worklist,
}

impl<'a> DeclarationBuilder<'a> {
    fn new(infer: &'a dyn TypeInfer, config: &'a AnalysisConfig) -> Self {
        Self {
            infer,
            config,
            decls: Vec::new(),
            scopes: ScopeTree::new(),
            stack: Vec::new(),
            anchors: HashMap::new(),
            methods: HashMap::new(),
            entries: IndexEntries::new(),
            worklist: Worklist::new(),
        }
    }

    fn finish(self, generation: u32, syntax: Arc<SyntaxTree>) -> FileAnalysis {
        let tree = DeclTree::new(
            generation,
            syntax,
            self.decls,
            self.scopes,
            self.anchors,
            self.methods,
        );

        FileAnalysis {
            index: FileIndex::new(Arc::new(tree), self.entries),
            worklist: self.worklist,
        }
    }

    #[inline]
    fn current_scope(&self) -> Option<ScopeId> {
        self.stack.last().copied().or_else(|| self.scopes.root())
    }

    fn push_scope(&mut self, owner: NodeId, kind: ScopeKind, tree: &SyntaxTree) {
        let parent = self.current_scope();
        let scope = self.scopes.open(kind, owner, tree.span(owner), parent);
        self.stack.push(scope);
    }

    /// Adds a declaration to the current scope. `token` is the name token
    /// when it differs from the declaring node.
    fn declare(&mut self, decl: Declaration, token: Option<NodeId>) -> DeclId {
        let id = DeclId::from_usize(self.decls.len());
        trace!("declare {decl}");

        self.anchors.insert(decl.node, id);
        if let Some(token) = token {
            self.anchors.insert(token, id);
        }

        if let Some(scope) = self.current_scope() {
            self.scopes.add(scope, id);
        }

        self.decls.push(decl);
        id
    }

    /// Looks a name up in the scopes built so far.
    fn find(&self, node: NodeId, name: &str, tree: &SyntaxTree) -> Option<DeclId> {
        let scope = self.scopes.scope_of(node, tree)?;
        self.scopes
            .find(&self.decls, scope, name, tree.span(node).start)
    }

    #[inline]
    fn infer(&self, ty: DocType, tree: &SyntaxTree) -> Type {
        self.infer.infer(ty, tree)
    }

    fn text(id: Id<node::Name>, tree: &SyntaxTree) -> Symbol {
        tree.node(id).text.clone()
    }

    fn schedule(&mut self, decl: DeclId, expr: Option<ExprRef>, state: ResolveState, type_declaration: bool) {
        self.worklist.push(ResolveTask::Declaration {
            decl,
            expr,
            state,
            type_declaration,
        });
    }

    // Documentation of statements

    /// Every tag written above a statement.
    fn tags(stat: NodeId, tree: &SyntaxTree) -> Vec<DocTag> {
        tree.comments(stat)
            .iter()
            .flat_map(|&comment| tree.node(comment).tags.iter().copied())
            .collect()
    }

    /// The types of the `@type` tags of a statement, one per target.
    fn annotated_types(&self, stat: NodeId, tree: &SyntaxTree) -> Vec<Type> {
        Self::tags(stat, tree)
            .into_iter()
            .filter_map(|tag| tag.into_type().ok())
            .flat_map(|tag| tree.node(tag).types.iter().copied())
            .map(|ty| self.infer(ty, tree))
            .collect()
    }

    /// The type a statement defines with a class, interface, enum or alias tag.
    fn defined_type(stat: NodeId, tree: &SyntaxTree) -> Option<Symbol> {
        Self::tags(stat, tree).into_iter().find_map(|tag| {
            let name = match tag {
                DocTag::Class(id) => tree.node(id).name,
                DocTag::Enum(id) => tree.node(id).name,
                DocTag::Alias(id) => tree.node(id).name,
                _ => None,
            };
            name.map(|name| Self::text(name, tree))
        })
    }

    /// Declares the `@param` tags and returns their types by name.
    fn doc_params(&mut self, tags: &[DocTag], tree: &SyntaxTree) -> HashMap<Symbol, Type> {
        let mut params = HashMap::new();

        for param in tags.iter().filter_map(|tag| tag.as_param()) {
            let param = tree.node(*param);
            let (Some(name), Some(ty)) = (param.name, param.ty) else {
                continue;
            };

            let mut ty = self.infer(ty, tree);
            if param.nullable {
                ty = ty.nullable();
            }

            let text = Self::text(name, tree);
            let decl = Declaration::new(text.clone(), DeclKind::DocParameter, name.erase(), name.loc(tree))
                .with_type(Some(ty.clone()));
            self.declare(decl, None);
            params.insert(text, ty);
        }

        params
    }

    // Statements

    fn source(&mut self, source: &node::Source) {
        if !self.config.infer_returns {
            return;
        }

        if let Some(block) = source.block {
            self.worklist.push(ResolveTask::Source {
                block,
                state: ResolveState::RETURN,
            });
        }
    }

    fn local_stat(&mut self, id: NodeId, stat: &node::LocalStat, tree: &SyntaxTree) {
        let types = self.annotated_types(id, tree);
        let defined = Self::defined_type(id, tree);

        for (i, &name) in stat.names.iter().enumerate() {
            let (ty, type_declaration) = target_type(&types, defined.as_ref(), i);

            let decl = Declaration::new(Self::text(name, tree), DeclKind::Local, name.erase(), name.loc(tree))
                .with_type(ty);
            let decl = self.declare(decl, None);

            self.schedule(decl, value_slot(&stat.exprs, i), ResolveState::TYPE, type_declaration);
        }
    }

    fn assign_stat(&mut self, id: NodeId, stat: &node::AssignStat, tree: &SyntaxTree) {
        let types = self.annotated_types(id, tree);
        let defined = Self::defined_type(id, tree);

        for (i, &var) in stat.vars.iter().enumerate() {
            let (ty, type_declaration) = target_type(&types, defined.as_ref(), i);
            let expr = value_slot(&stat.exprs, i);

            match var {
                Expr::Name(name) => {
                    let text = tree.node(name).name.clone();

                    if self.find(name.erase(), &text, tree).is_some() {
                        continue;
                    }

                    let decl = Declaration::new(text.clone(), DeclKind::Global, name.erase(), name.loc(tree))
                        .with_type(ty);
                    let decl = self.declare(decl, None);

                    self.entries.add_global(text, decl);
                    self.schedule(decl, expr, ResolveState::TYPE, type_declaration);
                }
                Expr::Index(index) => {
                    let node = tree.node(index);
                    let (Some(key), Some(token)) = (node.key_name(tree), node.key) else {
                        continue;
                    };

                    let token = token.erase();
                    let decl = Declaration::new(key, DeclKind::Index, index.erase(), tree.loc(token))
                        .with_type(ty);
                    let decl = self.declare(decl, Some(token));

                    self.schedule(
                        decl,
                        expr,
                        ResolveState::TYPE | ResolveState::INDEX,
                        type_declaration,
                    );
                }
                _ => {}
            }
        }
    }

    fn func_stat(&mut self, stat: &node::FuncStat, tree: &SyntaxTree) {
        let (Some(target), Some(closure)) = (stat.target, stat.closure) else {
            return;
        };

        let value = Some(ExprRef::new(Expr::Closure(closure), 0));

        match target {
            FuncTarget::Local(name) => {
                let kind = DeclKind::Method {
                    feature: MethodFeature::Local,
                    closure,
                };
                let decl = Declaration::new(Self::text(name, tree), kind, name.erase(), name.loc(tree));
                let decl = self.declare(decl, None);

                self.schedule(decl, value, ResolveState::TYPE, false);
            }
            FuncTarget::Global(name) => {
                let text = tree.node(name).name.clone();

                if self.find(name.erase(), &text, tree).is_some() {
                    return;
                }

                let kind = DeclKind::Method {
                    feature: MethodFeature::Global,
                    closure,
                };
                let decl = Declaration::new(text.clone(), kind, name.erase(), name.loc(tree));
                let decl = self.declare(decl, None);

                self.entries.add_global(text, decl);
                self.schedule(decl, value, ResolveState::TYPE, false);
            }
            FuncTarget::Field(index) => {
                let node = tree.node(index);
                let (Some(key), Some(token)) = (node.key_name(tree), node.key) else {
                    return;
                };

                let token = token.erase();
                let kind = DeclKind::Method {
                    feature: MethodFeature::Field,
                    closure,
                };
                let decl = Declaration::new(key, kind, index.erase(), tree.loc(token));
                let decl = self.declare(decl, Some(token));

                self.schedule(decl, value, ResolveState::TYPE | ResolveState::INDEX, false);
            }
        }
    }

    fn closure(&mut self, closure: Id<node::ClosureExpr>, tree: &SyntaxTree) {
        let tags = tree
            .enclosing_stat(closure.erase())
            .map(|stat| Self::tags(stat, tree))
            .unwrap_or_default();

        for generic in tags.iter().filter_map(|tag| tag.as_generic()) {
            for &param in &tree.node(*generic).params {
                self.generic_param(param, tree);
            }
        }

        let overloads = tags
            .iter()
            .filter_map(|tag| tag.as_overload())
            .filter_map(|overload| match self.infer.infer_opt(tree.node(*overload).ty, tree) {
                Type::Signature(sig) => Some(Signature::clone(&sig)),
                _ => None,
            })
            .collect();

        let docs = self.doc_params(&tags, tree);

        let node = tree.node(closure);
        let params = node
            .params
            .iter()
            .map(|&param| {
                let text = Self::text(param, tree);
                let ty = docs.get(&text).cloned();
                let decl = Declaration::new(text, DeclKind::Parameter, param.erase(), param.loc(tree))
                    .with_type(ty);
                self.declare(decl, None)
            })
            .collect();

        let returns = tags
            .iter()
            .filter_map(|tag| tag.as_return())
            .flat_map(|ret| tree.node(*ret).types.iter().copied())
            .map(|ty| self.infer(ty, tree))
            .collect();

        self.methods.insert(
            closure.erase(),
            MethodInfo::new(closure, params, overloads, returns),
        );

        if self.config.infer_returns && node.block.is_some() {
            self.worklist.push(ResolveTask::Method {
                closure,
                state: ResolveState::RETURN,
            });
        }
    }

    fn for_stat(&mut self, stat: &node::ForStat, tree: &SyntaxTree) {
        if let Some(var) = stat.var {
            let decl = Declaration::new(Self::text(var, tree), DeclKind::Parameter, var.erase(), var.loc(tree))
                .with_type(Some(Type::Integer));
            self.declare(decl, None);
        }
    }

    fn for_range_stat(&mut self, id: NodeId, stat: &node::ForRangeStat, tree: &SyntaxTree) {
        let tags = Self::tags(id, tree);
        let docs = self.doc_params(&tags, tree);

        for &name in &stat.names {
            let text = Self::text(name, tree);
            let ty = docs.get(&text).cloned();
            let decl = Declaration::new(text, DeclKind::Parameter, name.erase(), name.loc(tree)).with_type(ty);
            self.declare(decl, None);
        }
    }

    fn label(&mut self, id: NodeId, stat: &node::LabelStat, tree: &SyntaxTree) {
        if let Some(name) = stat.name {
            let decl = Declaration::new(Self::text(name, tree), DeclKind::Label, id, name.loc(tree));
            self.declare(decl, Some(name.erase()));
        }
    }

    fn table_field(&mut self, id: NodeId, field: &node::TableField, tree: &SyntaxTree) {
        let (Some(key), Some(token), Some(value)) = (field.key_name(tree), field.key, field.value) else {
            return;
        };
        let Some(table) = tree.parent(id) else {
            return;
        };

        let token = token.erase();
        let decl = Declaration::new(key, DeclKind::TableField, id, tree.loc(token));
        let decl = self.declare(decl, Some(token));

        self.entries
            .add_member(Owner::Anonymous(tree.syntax_id(table)), decl);
        self.schedule(decl, Some(ExprRef::new(value, 0)), ResolveState::TYPE, false);
    }

    // Type definitions

    fn class(&mut self, id: Id<node::DocClass>, tree: &SyntaxTree) {
        let class = tree.node(id);
        let Some(name) = class.name else {
            return;
        };

        let category = match class.kind {
            ClassKind::Class => TypeCategory::Class,
            ClassKind::Interface => TypeCategory::Interface,
        };
        let text = self.named_type(name, category, tree);
        let owner = Owner::Named(text.clone());

        for tag in following_tags(id.erase(), tree) {
            match tag {
                DocTag::Field(field) => self.doc_field(&owner, field, tree),
                DocTag::Operator(op) => self.operator(&owner, op, tree),
                _ => {}
            }
        }

        if let Some(body) = class.body {
            for &field in &tree.node(body).fields {
                self.doc_field(&owner, field, tree);
            }
        }

        for &ty in &class.supers {
            let ty = self.infer(ty, tree);
            self.entries.add_super(text.clone(), ty);
        }

        if let Some(generics) = class.generics {
            for &param in &tree.node(generics).params {
                if let Some(decl) = self.generic_param(param, tree) {
                    self.entries.add_generic(text.clone(), decl);
                }
            }
        }
    }

    fn enumeration(&mut self, id: Id<node::DocEnum>, tree: &SyntaxTree) {
        let node = tree.node(id);
        let Some(name) = node.name else {
            return;
        };

        let base = node
            .base
            .map_or(Type::Integer, |base| self.infer(base, tree));
        let text = self.named_type(name, TypeCategory::Enum, tree);

        for &field in &node.fields {
            let decl = Declaration::new(Self::text(field, tree), DeclKind::EnumField, field.erase(), field.loc(tree))
                .with_type(Some(base.clone()));
            let decl = self.declare(decl, None);
            self.entries.add_member(Owner::Named(text.clone()), decl);
        }
    }

    fn alias(&mut self, id: Id<node::DocAlias>, tree: &SyntaxTree) {
        let node = tree.node(id);
        let (Some(name), Some(ty)) = (node.name, node.ty) else {
            return;
        };

        let base = self.infer(ty, tree);
        let text = self.named_type(name, TypeCategory::Alias, tree);

        if let Some(&decl) = self.anchors.get(&name.erase()) {
            self.entries.add_alias(text, base, decl);
        }
    }

    fn named_type(&mut self, name: Id<node::Name>, category: TypeCategory, tree: &SyntaxTree) -> Symbol {
        let text = Self::text(name, tree);
        let decl = Declaration::new(text.clone(), DeclKind::NamedType(category), name.erase(), name.loc(tree))
            .with_type(Some(Type::Named(text.clone())));
        let decl = self.declare(decl, None);

        self.entries.add_type(text.clone(), decl, category);
        text
    }

    fn generic_param(&mut self, id: Id<node::DocGenericParam>, tree: &SyntaxTree) -> Option<DeclId> {
        let param = tree.node(id);
        let name = param.name?;

        let constraint = param.constraint.map(|ty| self.infer(ty, tree));
        let decl = Declaration::new(Self::text(name, tree), DeclKind::GenericParameter, id.erase(), name.loc(tree))
            .with_type(constraint);

        Some(self.declare(decl, Some(name.erase())))
    }

    fn doc_field(&mut self, owner: &Owner, id: Id<node::DocField>, tree: &SyntaxTree) {
        let field = tree.node(id);
        let (Some(key), Some(ty)) = (field.key, field.ty) else {
            return;
        };

        let mut value = self.infer(ty, tree);
        if field.nullable {
            value = value.nullable();
        }

        let (name, token) = match key {
            DocFieldKey::Name(name) | DocFieldKey::String(name) => (Self::text(name, tree), Some(name.erase())),
            DocFieldKey::Integer(n) => (eco_format!("[{n}]"), None),
            DocFieldKey::Type(key) => {
                let key = self.infer(key, tree);
                self.entries
                    .add_operator(owner.clone(), TypeOperator::index(key, value));
                return;
            }
        };

        let loc = token.map_or_else(|| id.loc(tree), |token| tree.loc(token));
        let decl = Declaration::new(name, DeclKind::DocField, id.erase(), loc).with_type(Some(value));
        let decl = self.declare(decl, token);

        self.entries.add_member(owner.clone(), decl);
    }

    fn operator(&mut self, owner: &Owner, id: Id<node::DocOperator>, tree: &SyntaxTree) {
        let node = tree.node(id);
        let Some(kind) = node
            .op
            .and_then(|op| tree.node(op).text.parse::<OperatorKind>().ok())
        else {
            return;
        };

        let operands = if kind.is_unary() {
            Vec::new()
        } else {
            node.operands
                .first()
                .map(|&ty| self.infer(ty, tree))
                .into_iter()
                .collect()
        };
        let ret = self.infer.infer_opt(node.ret, tree);

        self.entries
            .add_operator(owner.clone(), TypeOperator::new(kind, operands, ret));
    }

    fn table_type(&mut self, id: Id<node::DocTableType>, tree: &SyntaxTree) {
        let owner = Owner::Anonymous(tree.syntax_id(id));

        for &field in &tree.node(id).fields {
            self.doc_field(&owner, field, tree);
        }
    }

    // Occurrences

    fn occurrence(&mut self, id: NodeId, tree: &SyntaxTree) {
        match tree.raw(id) {
            Node::NameExpr(expr) => {
                if let Some(id) = id.cast(tree) {
                    self.entries.add_name_expr(expr.name.clone(), id);
                }
            }
            Node::IndexExpr(expr) => {
                if let (Some(key), Some(id)) = (expr.key_name(tree), id.cast(tree)) {
                    self.entries.add_index_expr(key, id);
                }
            }
            Node::DocNameType(ty) => {
                if let Some(id) = id.cast(tree) {
                    self.entries.add_type_ref(ty.name.clone(), id);
                }
            }
            _ => {}
        }
    }
}

impl Visitor for DeclarationBuilder<'_> {
    type BreakValue = Infallible;

    fn enter(&mut self, id: NodeId, tree: &SyntaxTree) -> ControlFlow<Infallible> {
        if let Some(kind) = ScopeKind::of(id, tree) {
            self.push_scope(id, kind, tree);
        }

        match tree.raw(id) {
            Node::Source(source) => self.source(source),
            Node::LocalStat(stat) => self.local_stat(id, stat, tree),
            Node::AssignStat(stat) => self.assign_stat(id, stat, tree),
            Node::FuncStat(stat) => self.func_stat(stat, tree),
            Node::ForStat(stat) => self.for_stat(stat, tree),
            Node::ForRangeStat(stat) => self.for_range_stat(id, stat, tree),
            Node::LabelStat(stat) => self.label(id, stat, tree),
            Node::TableField(field) => self.table_field(id, field, tree),
            Node::ClosureExpr(_) => {
                if let Some(closure) = id.cast(tree) {
                    self.closure(closure, tree);
                }
            }
            Node::DocClass(_) => {
                if let Some(class) = id.cast(tree) {
                    self.class(class, tree);
                }
            }
            Node::DocEnum(_) => {
                if let Some(enumeration) = id.cast(tree) {
                    self.enumeration(enumeration, tree);
                }
            }
            Node::DocAlias(_) => {
                if let Some(alias) = id.cast(tree) {
                    self.alias(alias, tree);
                }
            }
            Node::DocTableType(_) => {
                if let Some(ty) = id.cast(tree) {
                    self.table_type(ty, tree);
                }
            }
            Node::NameExpr(_) | Node::IndexExpr(_) | Node::DocNameType(_) => {
                if self.config.index_name_exprs {
                    self.occurrence(id, tree);
                }
            }
            _ => {}
        }

        ControlFlow::Continue(())
    }

    fn exit(&mut self, id: NodeId, _tree: &SyntaxTree) -> ControlFlow<Infallible> {
        if self.scopes.owned_by(id).is_some() {
            self.stack.pop();
        }

        ControlFlow::Continue(())
    }
}

/// The expression supplying the `i`-th target of a multiple assignment.
///
/// Targets past the last expression take the following results of that
/// expression, so `local a, b, c = f()` binds `c` to the third result of `f()`.
fn value_slot(exprs: &[Expr], i: usize) -> Option<ExprRef> {
    match exprs.get(i) {
        Some(&expr) => Some(ExprRef::new(expr, 0)),
        None => {
            let last = exprs.len().checked_sub(1)?;
            Some(ExprRef::new(exprs[last], i - last))
        }
    }
}

/// The annotated type of the `i`-th target. Only the first target takes the
/// type a class, interface, enum or alias tag defines.
fn target_type(types: &[Type], defined: Option<&Symbol>, i: usize) -> (Option<Type>, bool) {
    match defined {
        Some(name) if i == 0 => (Some(Type::Named(name.clone())), true),
        _ => (types.get(i).cloned(), false),
    }
}

/// The tags after `tag` in its comment, up to the next type definition.
fn following_tags(tag: NodeId, tree: &SyntaxTree) -> Vec<DocTag> {
    let Some(comment) = tree
        .parent(tag)
        .and_then(|parent| parent.cast::<node::Comment>(tree))
    else {
        return Vec::new();
    };

    tree.node(comment)
        .tags
        .iter()
        .skip_while(|other| other.erase() != tag)
        .skip(1)
        .take_while(|other| !matches!(other, DocTag::Class(_) | DocTag::Enum(_) | DocTag::Alias(_)))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use lumen_span::SourceId;
    use lumen_tree::{
        fixture::Fixture,
        node::{Stat, TableField},
    };
    use lumen_types::DocTypeInfer;

    use super::*;

    fn analyse(stats: impl FnOnce(&mut Fixture) -> Vec<Stat>) -> FileAnalysis {
        analyse_with(&AnalysisConfig::default(), stats)
    }

    fn analyse_with(config: &AnalysisConfig, stats: impl FnOnce(&mut Fixture) -> Vec<Stat>) -> FileAnalysis {
        let tree = Fixture::new(SourceId::new(0)).finish(stats);
        build(Arc::new(tree), 0, &DocTypeInfer, config)
    }

    fn decls(analysis: &FileAnalysis) -> Vec<(String, DeclKind)> {
        analysis
            .index
            .tree()
            .decls()
            .map(|(_, decl)| (decl.name.to_string(), decl.kind))
            .collect()
    }

    fn find<'a>(analysis: &'a FileAnalysis, name: &str) -> &'a Declaration {
        analysis
            .index
            .tree()
            .decls()
            .map(|(_, decl)| decl)
            .find(|decl| decl.name == name)
            .unwrap_or_else(|| panic!("no declaration named {name}"))
    }

    fn value_slots(analysis: &FileAnalysis) -> Vec<Option<usize>> {
        analysis
            .worklist
            .iter()
            .filter_map(|(_, task)| match task {
                ResolveTask::Declaration { expr, .. } => Some(expr.map(|expr| expr.slot)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_extra_targets_take_later_results() {
        // local a, b, c = f()
        let analysis = analyse(|fx| {
            let local = fx.local(&["a", "b", "c"], |fx| {
                let f = fx.var("f");
                vec![fx.call(f, |_| vec![]).into()]
            });
            vec![local.into()]
        });

        assert_eq!(value_slots(&analysis), vec![Some(0), Some(1), Some(2)]);

        let exprs = analysis
            .worklist
            .iter()
            .filter_map(|(_, task)| match task {
                ResolveTask::Declaration { expr: Some(expr), .. } => Some(expr.expr),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert!(exprs.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn test_missing_values_have_no_expression() {
        // local a, b
        let analysis = analyse(|fx| vec![fx.local(&["a", "b"], |_| vec![]).into()]);

        assert_eq!(value_slots(&analysis), vec![None, None]);
    }

    #[test]
    fn test_assignment_declares_only_unknown_names() {
        // local x = 1    x = 2    y = 3
        let analysis = analyse(|fx| {
            let local = fx.local(&["x"], |fx| vec![fx.int(1)]);
            let reassign = fx.assign(|fx| vec![fx.var("x").into()], |fx| vec![fx.int(2)]);
            let global = fx.assign(|fx| vec![fx.var("y").into()], |fx| vec![fx.int(3)]);
            vec![local.into(), reassign.into(), global.into()]
        });

        assert_eq!(
            decls(&analysis),
            vec![("x".into(), DeclKind::Local), ("y".into(), DeclKind::Global)]
        );
        assert_eq!(analysis.index.entries().globals.keys().collect::<Vec<_>>(), vec!["y"]);
    }

    #[test]
    fn test_indexed_assignment_declares_a_field() {
        // t.x = 1
        let analysis = analyse(|fx| {
            let stat = fx.assign(
                |fx| {
                    let t = fx.var("t");
                    vec![fx.index(t, "x", false).into()]
                },
                |fx| vec![fx.int(1)],
            );
            vec![stat.into()]
        });

        let x = find(&analysis, "x");
        assert_eq!(x.kind, DeclKind::Index);
        assert!(analysis.worklist.iter().any(|(_, task)| {
            task.state() == ResolveState::TYPE | ResolveState::INDEX
        }));
    }

    #[test]
    fn test_function_statements() {
        // local function f() end    function g() end    function M.h() end
        let analysis = analyse(|fx| {
            let f = fx.local_function("f", &[], |_| vec![]);
            let g = fx.function("g", &[], |_| vec![]);
            let h = fx.method("M", "h", false, &[], |_| vec![]);
            vec![f.into(), g.into(), h.into()]
        });

        let features = decls(&analysis)
            .into_iter()
            .filter_map(|(name, kind)| match kind {
                DeclKind::Method { feature, .. } => Some((name, feature)),
                _ => None,
            })
            .collect::<Vec<_>>();

        assert_eq!(
            features,
            vec![
                ("f".into(), MethodFeature::Local),
                ("g".into(), MethodFeature::Global),
                ("h".into(), MethodFeature::Field),
            ]
        );
        assert!(analysis.index.entries().globals.contains_key("g"));
        assert_eq!(analysis.index.tree().methods().count(), 3);

        let returns = analysis
            .worklist
            .iter()
            .filter(|(_, task)| matches!(task, ResolveTask::Method { .. }))
            .count();
        assert_eq!(returns, 3);
    }

    #[test]
    fn test_parameters_take_their_documented_types() {
        // ---@param a integer
        // ---@param b? string
        // local function f(a, b, ...) end
        let analysis = analyse(|fx| {
            fx.doc(|fx| vec![fx.param("a", "integer", false).into(), fx.param("b", "string", true).into()]);
            vec![fx.local_function("f", &["a", "b", "..."], |_| vec![]).into()]
        });

        let params = analysis
            .index
            .tree()
            .decls()
            .filter(|(_, decl)| decl.kind == DeclKind::Parameter)
            .map(|(_, decl)| (decl.name.to_string(), decl.ty().cloned()))
            .collect::<Vec<_>>();

        assert_eq!(
            params,
            vec![
                ("a".into(), Some(Type::Integer)),
                ("b".into(), Some(Type::String.nullable())),
                ("...".into(), None),
            ]
        );

        let documented = decls(&analysis)
            .into_iter()
            .filter(|(_, kind)| *kind == DeclKind::DocParameter)
            .count();
        assert_eq!(documented, 2);
    }

    #[test]
    fn test_class_tag_collects_fields_and_operators() {
        // ---@class Point: Base
        // ---@field x number
        // ---@field [string] any
        // ---@operator add(Point): Point
        // local Point = {}
        let analysis = analyse(|fx| {
            fx.doc(|fx| {
                vec![
                    fx.class("Point", &["Base"]).into(),
                    fx.doc_field("x", "number").into(),
                    fx.index_field("string", "any").into(),
                    fx.operator("add", &["Point"], "Point").into(),
                ]
            });
            let local = fx.local(&["Point"], |fx| vec![fx.table(|_| vec![]).into()]);
            vec![local.into()]
        });

        let entries = analysis.index.entries();
        let tree = analysis.index.tree();
        let owner = Owner::Named("Point".into());

        assert_eq!(entries.types["Point"].len(), 1);
        assert_eq!(entries.types["Point"][0].1, TypeCategory::Class);
        assert_eq!(entries.supers["Point"], vec![Type::named("Base")]);

        let members = entries.members[&owner]
            .iter()
            .map(|&id| (tree.decl(id).name.to_string(), tree.decl(id).ty().cloned()))
            .collect::<Vec<_>>();
        assert_eq!(members, vec![("x".into(), Some(Type::Number))]);

        let kinds = entries.operators[&owner]
            .iter()
            .map(|op| op.kind)
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec![OperatorKind::Index, OperatorKind::Add]);

        let local = tree
            .decls()
            .find(|(_, decl)| decl.kind == DeclKind::Local)
            .map(|(_, decl)| decl.ty().cloned());
        assert_eq!(local, Some(Some(Type::named("Point"))));
        assert!(analysis.worklist.iter().any(|(_, task)| matches!(
            task,
            ResolveTask::Declaration {
                type_declaration: true,
                ..
            }
        )));
    }

    #[test]
    fn test_fields_stop_at_the_next_type_definition() {
        // ---@class A
        // ---@class B
        // ---@field y integer
        let analysis = analyse(|fx| {
            fx.doc(|fx| {
                vec![
                    fx.class("A", &[]).into(),
                    fx.class("B", &[]).into(),
                    fx.doc_field("y", "integer").into(),
                ]
            });
            vec![fx.local(&["B"], |_| vec![]).into()]
        });

        let members = &analysis.index.entries().members;
        assert!(!members.contains_key(&Owner::Named("A".into())));
        assert_eq!(members[&Owner::Named("B".into())].len(), 1);
    }

    #[test]
    fn test_enum_and_alias() {
        // ---@enum Color Red, Green
        // local Color
        // ---@alias Id string
        // local id
        let analysis = analyse(|fx| {
            fx.doc(|fx| vec![fx.enumeration("Color", None, &["Red", "Green"]).into()]);
            let color = fx.local(&["Color"], |_| vec![]);
            fx.doc(|fx| vec![fx.alias("Id", "string").into()]);
            let id = fx.local(&["id"], |_| vec![]);
            vec![color.into(), id.into()]
        });

        let entries = analysis.index.entries();
        let tree = analysis.index.tree();

        let fields = entries.members[&Owner::Named("Color".into())]
            .iter()
            .map(|&id| (tree.decl(id).kind, tree.decl(id).ty().cloned()))
            .collect::<Vec<_>>();
        assert_eq!(
            fields,
            vec![
                (DeclKind::EnumField, Some(Type::Integer)),
                (DeclKind::EnumField, Some(Type::Integer)),
            ]
        );

        assert_eq!(entries.aliases["Id"][0].0, Type::String);
        assert_eq!(entries.types["Id"][0].1, TypeCategory::Alias);
    }

    #[test]
    fn test_table_fields_belong_to_the_literal() {
        // local t = { x = 1, ["y"] = 2, 3 }
        let mut table = None;
        let analysis = analyse(|fx| {
            let local = fx.local(&["t"], |fx| {
                let id = fx.table(|fx| {
                    let x = fx.field("x", |fx| fx.int(1));
                    let y = fx.string_field("y", |fx| fx.int(2));
                    let item = fx.item(|fx| fx.int(3));
                    vec![x, y, item]
                });
                table = Some(id);
                vec![id.into()]
            });
            vec![local.into()]
        });

        let tree = analysis.index.tree();
        let owner = Owner::Anonymous(tree.syntax().syntax_id(table.expect("table was built")));
        let names = analysis.index.entries().members[&owner]
            .iter()
            .map(|&id| tree.decl(id).name.to_string())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_loops_and_labels() {
        // for i = 1, 10 do ::continue:: end
        let analysis = analyse(|fx| {
            let stat = fx.numeric_for(
                "i",
                |fx| vec![fx.int(1), fx.int(10)],
                |fx| vec![fx.label("continue").into()],
            );
            vec![stat.into()]
        });

        let i = find(&analysis, "i");
        assert_eq!(i.kind, DeclKind::Parameter);
        assert_eq!(i.ty(), Some(&Type::Integer));
        assert_eq!(find(&analysis, "continue").kind, DeclKind::Label);
    }

    #[test]
    fn test_incomplete_constructs_are_skipped() {
        let analysis = analyse(|fx| {
            let closure = fx.closure(&[], |_| vec![]);
            let func = node::FuncStat::new_in(None, Some(closure), fx.builder());
            let field = TableField::new_in(None, None, fx.builder());
            let table = node::TableExpr::new_in(vec![field], fx.builder());
            let local = node::LocalStat::new_in(vec![], vec![table.into()], fx.builder());
            vec![func.into(), local.into()]
        });

        assert!(decls(&analysis).is_empty());
        assert_eq!(analysis.index.tree().methods().count(), 1);
    }

    #[test]
    fn test_configuration_gates_occurrences_and_returns() {
        let config = AnalysisConfig {
            index_name_exprs: false,
            infer_returns: false,
            ..AnalysisConfig::default()
        };
        let analysis = analyse_with(&config, |fx| {
            let f = fx.local_function("f", &[], |_| vec![]);
            let call = fx.call_stat(|fx| {
                let f = fx.var("f");
                fx.call(f, |_| vec![])
            });
            vec![f.into(), call.into()]
        });

        assert!(analysis.index.entries().name_exprs.is_empty());
        assert!(
            analysis
                .worklist
                .iter()
                .all(|(_, task)| matches!(task, ResolveTask::Declaration { .. }))
        );

        let default = analyse(|fx| {
            let call = fx.call_stat(|fx| {
                let f = fx.var("f");
                fx.call(f, |_| vec![])
            });
            vec![call.into()]
        });
        assert_eq!(default.index.entries().name_exprs["f"].len(), 1);
        assert!(
            default
                .worklist
                .iter()
                .any(|(_, task)| matches!(task, ResolveTask::Source { .. }))
        );
    }
}
