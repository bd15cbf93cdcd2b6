//! The default resolver.
//!
//! Runs once per change set, after every file of the set is published.
//! Tasks are ordered by the declarations their expressions mention, so a
//! declaration is typed after everything its value depends on. Tasks on a
//! dependency cycle are not run, their declarations become `unknown`.

mod deps;

use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::Arc,
};

use indexmap::IndexMap;
use log::{debug, trace};
use lumen_span::SourceId;
use lumen_tree::{node::Expr, prelude::*};
use lumen_types::Type;
use lumen_utils::dependency::{DependencyGraph, TopologicalOrder};
use owo_colors::OwoColorize;

use self::deps::{Mentions, Returns};
use crate::{
    decl::{DeclId, DeclKind, DeclRef, MethodFeature},
    file::DeclTree,
    index::{Owner, ProjectIndex},
    lookup::Lookup,
    worklist::{ExprRef, ResolveState, ResolveTask, Worklist},
};

/// A task of the change set, by file and position in the file's worklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskKey {
    pub source: SourceId,
    pub index: usize,
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.index)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    pub resolved: usize,
    /// Tasks skipped because they lie on a dependency cycle.
    pub cyclic: usize,
}

pub struct Resolver<'a> {
    lookup: Lookup<'a>,
    files: IndexMap<SourceId, (Arc<DeclTree>, Worklist)>,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a ProjectIndex, max_super_depth: usize) -> Self {
        Self {
            lookup: Lookup::new(index, max_super_depth),
            files: IndexMap::new(),
        }
    }

    /// Adds the tasks of a published file.
    pub fn add(&mut self, tree: Arc<DeclTree>, worklist: Worklist) {
        self.files.insert(tree.source(), (tree, worklist));
    }

    pub fn resolve(mut self) -> ResolveSummary {
        let TopologicalOrder { order, cycles } = self.graph().topological_sort();

        let cyclic = cycles
            .iter()
            .flat_map(|cycle| cycle.path().iter().copied())
            .collect::<HashSet<_>>();

        for cycle in &cycles {
            debug!("{} {cycle}", "Cycle".yellow().bold());
        }

        let mut summary = ResolveSummary::default();

        for key in order {
            let Some((tree, worklist)) = self.files.get_mut(&key.source) else {
                continue;
            };
            let Some(task) = worklist.take(key.index) else {
                continue;
            };
            let tree = Arc::clone(tree);

            if cyclic.contains(&key) {
                give_up(&tree, task);
                summary.cyclic += 1;
            } else {
                self.run(&tree, task);
                summary.resolved += 1;
            }
        }

        summary
    }

    /// Orders the tasks of the change set, each task after the tasks that
    /// determine the names its expressions mention.
    fn graph(&self) -> DependencyGraph<TaskKey> {
        let mut decls = HashMap::new();
        let mut methods = HashMap::new();
        let mut fields = HashMap::<Symbol, Vec<(TaskKey, Option<SyntaxId>)>>::new();

        for (&source, (tree, worklist)) in &self.files {
            for (index, task) in worklist.iter() {
                let key = TaskKey { source, index };

                match *task {
                    ResolveTask::Declaration { decl, .. } => {
                        decls.insert(tree.decl_ref(decl), key);

                        let decl = tree.decl(decl);
                        if is_assigned_field(decl.kind) {
                            let closure = match decl.kind {
                                DeclKind::Method { closure, .. } => Some(tree.syntax().syntax_id(closure)),
                                _ => None,
                            };
                            fields
                                .entry(decl.name.clone())
                                .or_default()
                                .push((key, closure));
                        }
                    }
                    ResolveTask::Method { closure, .. } => {
                        methods.insert(tree.syntax().syntax_id(closure), key);
                    }
                    ResolveTask::Source { .. } => {}
                }
            }
        }

        let mut graph = DependencyGraph::new();

        for (&source, (tree, worklist)) in &self.files {
            for (index, task) in worklist.iter() {
                let key = TaskKey { source, index };
                graph.add_node(key);

                for mentions in self.mentions(tree, task) {
                    for name in mentions.names {
                        let Some(decl) = self.lookup.declaration(tree, name.erase()) else {
                            continue;
                        };

                        let closure = self
                            .lookup
                            .index
                            .decl(decl)
                            .and_then(|handle| match handle.kind {
                                DeclKind::Method { closure, .. } => {
                                    Some(SyntaxId::new(decl.source, closure))
                                }
                                _ => None,
                            });

                        let deps = decls
                            .get(&decl)
                            .into_iter()
                            .chain(closure.as_ref().and_then(|closure| methods.get(closure)));

                        for &dep in deps {
                            if dep != key {
                                graph.add_dependency(key, dep);
                            }
                        }
                    }

                    for name in &mentions.keys {
                        for (dep, closure) in fields.get(name).into_iter().flatten() {
                            let deps = std::iter::once(dep)
                                .chain(closure.as_ref().and_then(|closure| methods.get(closure)));

                            for &dep in deps {
                                if dep != key {
                                    graph.add_dependency(key, dep);
                                }
                            }
                        }
                    }
                }
            }
        }

        graph
    }

    /// What the expressions a task evaluates mention.
    fn mentions(&self, tree: &DeclTree, task: &ResolveTask) -> Vec<Mentions> {
        let syntax = tree.syntax();

        match *task {
            ResolveTask::Declaration {
                decl, expr, state, ..
            } => {
                let mut mentions = Vec::new();

                if let Some(expr) = expr {
                    mentions.push(Mentions::of(expr.expr.erase(), syntax));
                }

                if state.contains(ResolveState::INDEX) {
                    let prefix = tree
                        .decl(decl)
                        .node
                        .cast::<node::IndexExpr>(syntax)
                        .and_then(|index| syntax.node(index).prefix);

                    if let Some(prefix) = prefix {
                        mentions.push(Mentions::of(prefix.erase(), syntax));
                    }
                }

                mentions
            }
            ResolveTask::Method { closure, .. } => syntax
                .node(closure)
                .block
                .map(|block| return_mentions(block, syntax))
                .unwrap_or_default(),
            ResolveTask::Source { block, .. } => return_mentions(block, syntax),
        }
    }

    fn run(&self, tree: &DeclTree, task: ResolveTask) {
        match task {
            ResolveTask::Declaration {
                decl,
                expr,
                state,
                type_declaration,
            } => {
                if state.contains(ResolveState::TYPE) {
                    self.resolve_type(tree, decl, expr);
                }

                if type_declaration {
                    self.link_table(tree, decl, expr);
                }

                if state.contains(ResolveState::INDEX) {
                    self.link_index(tree, decl);
                }
            }
            ResolveTask::Method { closure, .. } => {
                let Some(method) = tree.method(closure.erase()) else {
                    return;
                };

                if method.has_declared_returns() {
                    return;
                }

                if let Some(block) = tree.syntax().node(closure).block {
                    method.set_inferred(self.infer_returns(tree, block));
                }
            }
            ResolveTask::Source { block, .. } => {
                tree.set_module_returns(self.infer_returns(tree, block));
            }
        }
    }

    fn resolve_type(&self, tree: &DeclTree, decl: DeclId, expr: Option<ExprRef>) {
        let decl = tree.decl(decl);
        if decl.ty().is_some() {
            return;
        }

        let ty = expr.map_or(Type::Nil, |ExprRef { expr, slot }| {
            self.lookup.expr_type(tree, expr, slot)
        });

        trace!("resolve {decl} to {ty}");
        decl.set_ty(ty);
    }

    /// Makes the fields of a table assigned to a class declaration members of
    /// the class.
    fn link_table(&self, tree: &DeclTree, decl: DeclId, expr: Option<ExprRef>) {
        let Some(Type::Named(name)) = tree.decl(decl).ty() else {
            return;
        };
        let Some(ExprRef {
            expr: Expr::Table(table),
            ..
        }) = expr
        else {
            return;
        };

        let literal = Owner::Anonymous(tree.syntax().syntax_id(table));
        let Some(members) = self
            .lookup
            .index
            .file(tree.source())
            .and_then(|file| file.entries().members.get(&literal).cloned())
        else {
            return;
        };

        debug!("{} {literal} into {name}", "Link".cyan().bold());
        self.lookup.index.amend(tree.source(), |entries| {
            for member in members {
                entries.add_member(Owner::Named(name.clone()), member);
            }
        });
    }

    /// Makes an assigned field a member of the owner of its prefix's type.
    fn link_index(&self, tree: &DeclTree, decl: DeclId) {
        let syntax = tree.syntax();
        let Some(prefix) = tree
            .decl(decl)
            .node
            .cast::<node::IndexExpr>(syntax)
            .and_then(|index| syntax.node(index).prefix)
        else {
            return;
        };

        let ty = self.lookup.expr_type(tree, prefix, 0);
        let Some(owner) = self.lookup.owners_of_type(&ty).into_iter().next() else {
            return;
        };

        trace!("member {} of {owner}", tree.decl(decl).name);
        self.lookup
            .index
            .amend(tree.source(), |entries| entries.add_member(owner, decl));
    }

    /// Joins the values of every `return` of a body, position by position.
    /// A call in last position contributes all of its results.
    fn infer_returns(&self, tree: &DeclTree, block: Id<node::Block>) -> Vec<Type> {
        let syntax = tree.syntax();
        let mut returns: Vec<Type> = Vec::new();

        for stat in Returns::of(block, syntax) {
            let exprs = &syntax.node(stat).exprs;

            let values = exprs.iter().enumerate().flat_map(|(i, &expr)| {
                match expr {
                    Expr::Call(call) if i + 1 == exprs.len() => match self.lookup.call_type(tree, call) {
                        Type::Tuple(types) => types,
                        ty => vec![ty],
                    },
                    expr => vec![self.lookup.expr_type(tree, expr, 0)],
                }
            });

            for (i, ty) in values.enumerate() {
                match returns.get_mut(i) {
                    Some(joined) => *joined = std::mem::take(joined).union(ty),
                    None => returns.push(ty),
                }
            }
        }

        returns
    }
}

fn return_mentions(block: Id<node::Block>, tree: &SyntaxTree) -> Vec<Mentions> {
    Returns::of(block, tree)
        .into_iter()
        .map(|stat| Mentions::of(stat.erase(), tree))
        .collect()
}

/// Declarations that add a member once their owner is known.
fn is_assigned_field(kind: DeclKind) -> bool {
    matches!(
        kind,
        DeclKind::Index
            | DeclKind::TableField
            | DeclKind::Method {
                feature: MethodFeature::Field,
                ..
            }
    )
}

/// Settles a task that cannot be ordered.
fn give_up(tree: &DeclTree, task: ResolveTask) {
    trace!("give up {task:?}");

    match task {
        ResolveTask::Declaration { decl, .. } => {
            tree.decl(decl).set_ty(Type::Unknown);
        }
        ResolveTask::Method { closure, .. } => {
            if let Some(method) = tree.method(closure.erase()) {
                method.set_inferred(vec![Type::Unknown]);
            }
        }
        ResolveTask::Source { .. } => {
            tree.set_module_returns(vec![Type::Unknown]);
        }
    }
}
