use std::sync::Arc;

use log::debug;
use lumen_span::{SourceError, SourceId, SourceMap};
use lumen_tree::prelude::*;
use lumen_types::{DocTypeInfer, TypeInfer};
use owo_colors::OwoColorize;
use rayon::prelude::*;

use crate::{
    builder::{FileAnalysis, build},
    config::AnalysisConfig,
    file::DeclTree,
    index::{DeclHandle, ProjectIndex},
    lookup::Lookup,
    references::Reference,
    resolver::{ResolveSummary, Resolver},
};

/// The semantic model of a set of files.
///
/// Files are analysed in change sets. [`Compilation::update`] builds every
/// tree of a set, publishes all of them and only then resolves the set, so
/// a declaration is never typed against a half published project.
pub struct Compilation {
    config: AnalysisConfig,
    sources: SourceMap,
    index: ProjectIndex,
    infer: Arc<dyn TypeInfer>,
    generation: u32,
}

impl Compilation {
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_infer(config, Arc::new(DocTypeInfer))
    }

    pub fn with_infer(config: AnalysisConfig, infer: Arc<dyn TypeInfer>) -> Self {
        Self {
            config,
            sources: SourceMap::new(),
            index: ProjectIndex::new(),
            infer,
            generation: 0,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut SourceMap {
        &mut self.sources
    }

    pub fn index(&self) -> &ProjectIndex {
        &self.index
    }

    pub fn lookup(&self) -> Lookup<'_> {
        Lookup::new(&self.index, self.config.max_super_depth)
    }

    /// The published analysis of `source`.
    pub fn tree(&self, source: SourceId) -> Option<Arc<DeclTree>> {
        self.index.decl_tree(source)
    }

    /// Analyses a change set, replacing what earlier versions of its files
    /// contributed.
    ///
    /// Fails before anything is built when a tree belongs to a source that
    /// is not registered.
    pub fn update(&mut self, trees: Vec<SyntaxTree>) -> Result<ResolveSummary, SourceError> {
        if let Some(tree) = trees.iter().find(|tree| !self.sources.contains(tree.source())) {
            return Err(SourceError::UnknownSource(tree.source()));
        }

        self.generation += 1;
        let generation = self.generation;
        let infer = self.infer.as_ref();
        let config = &self.config;

        debug!(
            "{} {} files, generation {generation}",
            "Building".bold().bright_white(),
            trees.len()
        );

        let analyses: Vec<FileAnalysis> = if config.parallel_build {
            trees
                .into_par_iter()
                .map(|tree| build(Arc::new(tree), generation, infer, config))
                .collect()
        } else {
            trees
                .into_iter()
                .map(|tree| build(Arc::new(tree), generation, infer, config))
                .collect()
        };

        let mut resolver = Resolver::new(&self.index, config.max_super_depth);

        for FileAnalysis { index, worklist } in analyses {
            let tree = Arc::clone(index.tree());
            self.index.insert(index);
            resolver.add(tree, worklist);
        }

        let summary = resolver.resolve();
        debug!(
            "{} {} tasks, {} on cycles",
            "Resolved".bold().bright_white(),
            summary.resolved,
            summary.cyclic
        );

        Ok(summary)
    }

    /// Retracts everything `source` contributed. Returns whether it had
    /// been analysed.
    pub fn remove(&mut self, source: SourceId) -> Result<bool, SourceError> {
        if !self.sources.contains(source) {
            return Err(SourceError::UnknownSource(source));
        }

        Ok(self.index.retract(source).is_some())
    }

    /// The declaration `node` of `source` refers to or declares.
    pub fn declaration(&self, source: SourceId, node: NodeId) -> Option<DeclHandle> {
        let tree = self.tree(source)?;
        let decl = self.lookup().declaration(&tree, node)?;
        self.index.decl(decl)
    }

    pub fn references(&self, source: SourceId, node: NodeId) -> Vec<Reference> {
        self.tree(source)
            .map(|tree| self.lookup().find_references(&tree, node))
            .unwrap_or_default()
    }

    pub fn definition(&self, source: SourceId, node: NodeId) -> Option<Reference> {
        let tree = self.tree(source)?;
        self.lookup().definition(&tree, node)
    }
}

impl Default for Compilation {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use lumen_tree::{
        fixture::Fixture,
        node::{Expr, Stat},
    };
    use lumen_types::Type;

    use super::*;
    use crate::{
        decl::{DeclKind, MethodFeature},
        index::Owner,
    };

    fn file(
        compilation: &mut Compilation,
        path: &str,
        stats: impl FnOnce(&mut Fixture) -> Vec<Stat>,
    ) -> SyntaxTree {
        let source = compilation.sources_mut().intern(path);
        Fixture::new(source).finish(stats)
    }

    fn types_of<const N: usize>(
        compilation: &Compilation,
        source: SourceId,
        names: [&str; N],
    ) -> [Option<Type>; N] {
        let tree = compilation.tree(source).expect("file is published");
        names.map(|name| {
            tree.decls()
                .find(|(_, decl)| decl.name == name)
                .and_then(|(_, decl)| decl.ty().cloned())
        })
    }

    fn print(fx: &mut Fixture, arg: Expr) -> Id<node::CallStat> {
        fx.call_stat(|fx| {
            let print = fx.var("print");
            fx.call(print, |_| vec![arg])
        })
    }

    #[test]
    fn test_local_initializer_sees_the_outer_name() {
        // a.lua: local x = x        b.lua: x = "s"
        let mut compilation = Compilation::default();
        let mut init = None;

        let a = file(&mut compilation, "a.lua", |fx| {
            let local = fx.local(&["x"], |fx| {
                let x = fx.var("x");
                init = Some(x);
                vec![x.into()]
            });
            vec![local.into()]
        });
        let b = file(&mut compilation, "b.lua", |fx| {
            let assign = fx.assign(|fx| vec![fx.var("x").into()], |fx| vec![fx.str("s")]);
            vec![assign.into()]
        });
        let (source_a, source_b) = (a.source(), b.source());

        compilation.update(vec![a, b]).expect("sources are registered");

        let init = init.expect("initializer was built").erase();
        let found = compilation
            .declaration(source_a, init)
            .expect("initializer resolves");
        assert_eq!(found.kind, DeclKind::Global);
        assert_eq!(found.loc.source(), source_b);

        let tree = compilation.tree(source_a).expect("a.lua is published");
        let (_, local) = tree.decls().next().expect("a.lua declares x");
        assert_eq!(local.kind, DeclKind::Local);
        assert_eq!(local.ty(), Some(&Type::String));
    }

    #[test]
    fn test_repeat_condition_sees_the_body() {
        // repeat local done = true until done
        let mut compilation = Compilation::default();
        let mut cond = None;

        let tree = file(&mut compilation, "a.lua", |fx| {
            let stat = fx.repeat(
                |fx| {
                    let local = fx.local(&["done"], |fx| vec![fx.literal(node::Literal::Bool(true)).into()]);
                    vec![local.into()]
                },
                |fx| {
                    let done = fx.var("done");
                    cond = Some(done);
                    done.into()
                },
            );
            vec![stat.into()]
        });
        let source = tree.source();

        compilation.update(vec![tree]).expect("source is registered");

        let found = compilation
            .declaration(source, cond.expect("condition was built").erase())
            .expect("condition resolves");
        assert_eq!(found.kind, DeclKind::Local);
        assert_eq!(found.ty(), Some(&Type::Boolean));
    }

    #[test]
    fn test_repeat_condition_skips_nested_blocks() {
        // repeat do local y = 1 end until y
        let mut compilation = Compilation::default();
        let mut cond = None;

        let tree = file(&mut compilation, "a.lua", |fx| {
            let stat = fx.repeat(
                |fx| {
                    let block = fx.do_block(|fx| vec![fx.local(&["y"], |fx| vec![fx.int(1)]).into()]);
                    vec![block.into()]
                },
                |fx| {
                    let y = fx.var("y");
                    cond = Some(y);
                    y.into()
                },
            );
            vec![stat.into()]
        });
        let source = tree.source();

        compilation.update(vec![tree]).expect("source is registered");

        let cond = cond.expect("condition was built").erase();
        assert!(compilation.declaration(source, cond).is_none());
        assert!(compilation.references(source, cond).is_empty());
    }

    #[test]
    fn test_multiple_targets_take_result_slots() {
        // local function f() return 1, "s" end
        // local a, b, c = f()
        let mut compilation = Compilation::new(AnalysisConfig {
            parallel_build: false,
            ..AnalysisConfig::default()
        });

        let tree = file(&mut compilation, "a.lua", |fx| {
            let f = fx.local_function("f", &[], |fx| vec![fx.ret(|fx| vec![fx.int(1), fx.str("s")]).into()]);
            let local = fx.local(&["a", "b", "c"], |fx| {
                let f = fx.var("f");
                vec![fx.call(f, |_| vec![]).into()]
            });
            vec![f.into(), local.into()]
        });
        let source = tree.source();

        compilation.update(vec![tree]).expect("source is registered");

        assert_eq!(
            types_of(&compilation, source, ["a", "b", "c"]),
            [Some(Type::Integer), Some(Type::String), Some(Type::Nil)]
        );
    }

    #[test]
    fn test_slots_past_an_unresolved_call_stay_unknown() {
        // local a, b = g()
        let mut compilation = Compilation::default();

        let tree = file(&mut compilation, "a.lua", |fx| {
            let local = fx.local(&["a", "b"], |fx| {
                let g = fx.var("g");
                vec![fx.call(g, |_| vec![]).into()]
            });
            vec![local.into()]
        });
        let source = tree.source();

        compilation.update(vec![tree]).expect("source is registered");

        assert_eq!(
            types_of(&compilation, source, ["a", "b"]),
            [Some(Type::Unknown), Some(Type::Unknown)]
        );
    }

    #[test]
    fn test_calls_are_unknown_without_return_inference() {
        // local function f() return 1 end
        // local function g() end
        // local x, y = f(), g()
        let mut compilation = Compilation::new(AnalysisConfig {
            infer_returns: false,
            ..AnalysisConfig::default()
        });

        let tree = file(&mut compilation, "a.lua", |fx| {
            let f = fx.local_function("f", &[], |fx| vec![fx.ret(|fx| vec![fx.int(1)]).into()]);
            let g = fx.local_function("g", &[], |_| vec![]);
            let local = fx.local(&["x", "y"], |fx| {
                let f = fx.var("f");
                let f = fx.call(f, |_| vec![]).into();
                let g = fx.var("g");
                vec![f, fx.call(g, |_| vec![]).into()]
            });
            vec![f.into(), g.into(), local.into()]
        });
        let source = tree.source();

        compilation.update(vec![tree]).expect("source is registered");

        assert_eq!(
            types_of(&compilation, source, ["x", "y"]),
            [Some(Type::Unknown), Some(Type::Unknown)]
        );
    }

    #[test]
    fn test_republishing_is_idempotent() {
        // ---@class Point
        // ---@field x integer
        // Point = { y = 2 }
        fn point(fx: &mut Fixture) -> Vec<Stat> {
            fx.doc(|fx| vec![fx.class("Point", &[]).into(), fx.doc_field("x", "integer").into()]);
            let assign = fx.assign(
                |fx| vec![fx.var("Point").into()],
                |fx| vec![fx.table(|fx| vec![fx.field("y", |fx| fx.int(2))]).into()],
            );
            vec![assign.into()]
        }

        fn snapshot(compilation: &Compilation) -> Vec<String> {
            let index = compilation.index();
            let mut decls = index.globals("Point");
            decls.extend(index.types("Point").into_iter().map(|(decl, _)| decl));
            decls.extend(index.members(&Owner::Named("Point".into())));

            let mut described = decls
                .into_iter()
                .filter_map(|decl| index.decl(decl))
                .map(|decl| format!("{} {} @{}", decl.kind, decl.name, decl.position()))
                .collect::<Vec<_>>();
            described.sort();
            described
        }

        let mut compilation = Compilation::default();
        let tree = file(&mut compilation, "a.lua", point);
        let source = tree.source();

        compilation.update(vec![tree]).expect("source is registered");
        let before = snapshot(&compilation);
        assert_eq!(before.len(), 4);

        assert_eq!(compilation.remove(source), Ok(true));
        assert!(snapshot(&compilation).is_empty());

        let tree = file(&mut compilation, "a.lua", point);
        compilation.update(vec![tree]).expect("source is registered");

        assert_eq!(snapshot(&compilation), before);
    }

    #[test]
    fn test_shadowed_locals_are_not_references() {
        // local x = 1
        // do local x = 2; print(x) end
        // print(x)
        let mut compilation = Compilation::default();
        let (mut inner, mut outer) = (None, None);

        let tree = file(&mut compilation, "a.lua", |fx| {
            let x = fx.local(&["x"], |fx| vec![fx.int(1)]);
            let block = fx.do_block(|fx| {
                let x = fx.local(&["x"], |fx| vec![fx.int(2)]);
                let use_x = fx.var("x");
                inner = Some(use_x);
                vec![x.into(), print(fx, use_x.into()).into()]
            });
            let use_x = fx.var("x");
            outer = Some(use_x);
            vec![x.into(), block.into(), print(fx, use_x.into()).into()]
        });
        let source = tree.source();

        compilation.update(vec![tree]).expect("source is registered");

        let outer = outer.expect("outer use was built").erase();
        let inner = inner.expect("inner use was built").erase();

        let refs = compilation.references(source, outer);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].node, outer);
        assert!(refs[0].loc.start() < refs[1].loc.start());

        let inner_refs = compilation.references(source, inner);
        assert_eq!(inner_refs.len(), 2);
        assert_eq!(inner_refs[1].node, inner);
        assert_ne!(inner_refs[0], refs[0]);
    }

    #[test]
    fn test_every_reference_resolves_back() {
        // local t = {}
        // t = t
        // print(t)
        let mut compilation = Compilation::default();
        let mut last = None;

        let tree = file(&mut compilation, "a.lua", |fx| {
            let local = fx.local(&["t"], |fx| vec![fx.table(|_| vec![]).into()]);
            let assign = fx.assign(|fx| vec![fx.var("t").into()], |fx| vec![fx.var("t").into()]);
            let t = fx.var("t");
            last = Some(t);
            vec![local.into(), assign.into(), print(fx, t.into()).into()]
        });
        let source = tree.source();

        compilation.update(vec![tree]).expect("source is registered");

        let decl = compilation
            .declaration(source, last.expect("use was built").erase())
            .expect("use resolves");
        let refs = compilation.references(source, decl.node);

        assert_eq!(refs.len(), 4);
        assert_eq!(refs[0].node, decl.node);
        for reference in &refs {
            let found = compilation
                .declaration(source, reference.node)
                .map(|found| found.decl_ref());
            assert_eq!(found, Some(decl.decl_ref()));
        }
    }

    #[test]
    fn test_globals_merge_across_files() {
        // a.lua: count = 0        b.lua: print(count)
        let mut compilation = Compilation::default();
        let mut used = None;

        let a = file(&mut compilation, "a.lua", |fx| {
            let assign = fx.assign(|fx| vec![fx.var("count").into()], |fx| vec![fx.int(0)]);
            vec![assign.into()]
        });
        let b = file(&mut compilation, "b.lua", |fx| {
            let count = fx.var("count");
            used = Some(count);
            vec![print(fx, count.into()).into()]
        });
        let (source_a, source_b) = (a.source(), b.source());
        let used = used.expect("use was built").erase();

        compilation.update(vec![a, b]).expect("sources are registered");

        let found = compilation
            .declaration(source_b, used)
            .expect("use resolves");
        assert_eq!(found.kind, DeclKind::Global);
        assert_eq!(found.loc.source(), source_a);
        assert_eq!(compilation.index().globals("count").len(), 1);

        // a.lua: local other = 1
        let a = file(&mut compilation, "a.lua", |fx| {
            vec![fx.local(&["other"], |fx| vec![fx.int(1)]).into()]
        });
        compilation.update(vec![a]).expect("source is registered");

        assert!(compilation.index().globals("count").is_empty());
        assert!(compilation.declaration(source_b, used).is_none());
        assert!(compilation.references(source_b, used).is_empty());
    }

    #[test]
    fn test_fields_are_found_from_either_declaration() {
        // ---@class Point
        // ---@field x integer
        // local Point = { x = 1 }
        // print(Point.x)
        let mut compilation = Compilation::default();
        let mut access = None;

        let tree = file(&mut compilation, "a.lua", |fx| {
            fx.doc(|fx| vec![fx.class("Point", &[]).into(), fx.doc_field("x", "integer").into()]);
            let local = fx.local(&["Point"], |fx| {
                vec![fx.table(|fx| vec![fx.field("x", |fx| fx.int(1))]).into()]
            });
            let point = fx.var("Point");
            let index = fx.index(point, "x", false);
            access = Some(index);
            vec![local.into(), print(fx, index.into()).into()]
        });
        let source = tree.source();

        compilation.update(vec![tree]).expect("source is registered");

        let published = compilation.tree(source).expect("a.lua is published");
        let site = |kind: DeclKind| {
            published
                .decls()
                .find(|(_, decl)| decl.name == "x" && decl.kind == kind)
                .map(|(_, decl)| decl.node)
                .expect("field is declared")
        };
        let (doc, table) = (site(DeclKind::DocField), site(DeclKind::TableField));
        let access = access.expect("access was built").erase();

        for node in [doc, table, access] {
            let mut found = compilation
                .references(source, node)
                .into_iter()
                .map(|reference| reference.node)
                .collect::<Vec<_>>();
            found.sort();

            let mut expected = vec![doc, table, access];
            expected.sort();
            assert_eq!(found, expected);
        }

        let definition = compilation
            .definition(source, access)
            .expect("access has a definition");
        assert_eq!(definition.node, doc);
    }

    #[test]
    fn test_repeated_assignments_share_references() {
        // local t = {}
        // t.x = 1
        // t.x = 2
        // print(t.x)
        let mut compilation = Compilation::default();
        let mut sites = Vec::new();

        let tree = file(&mut compilation, "a.lua", |fx| {
            let local = fx.local(&["t"], |fx| vec![fx.table(|_| vec![]).into()]);
            let mut stats: Vec<Stat> = vec![local.into()];

            for value in [1, 2] {
                let assign = fx.assign(
                    |fx| {
                        let t = fx.var("t");
                        let target = fx.index(t, "x", false);
                        sites.push(target.erase());
                        vec![target.into()]
                    },
                    |fx| vec![fx.int(value)],
                );
                stats.push(assign.into());
            }

            let t = fx.var("t");
            let read = fx.index(t, "x", false);
            sites.push(read.erase());
            stats.push(print(fx, read.into()).into());
            stats
        });
        let source = tree.source();

        compilation.update(vec![tree]).expect("source is registered");

        let published = compilation.tree(source).expect("a.lua is published");
        let assigned = published
            .decls()
            .filter(|(_, decl)| decl.kind == DeclKind::Index)
            .map(|(_, decl)| decl.node)
            .collect::<Vec<_>>();
        assert_eq!(assigned, &sites[..2]);

        let first = compilation
            .declaration(source, sites[0])
            .expect("first assignment declares x")
            .decl_ref();

        let mut expected = sites.clone();
        expected.sort();

        for &node in &assigned {
            let refs = compilation.references(source, node);
            assert_eq!(refs[0].node, sites[0]);

            for reference in &refs {
                let found = compilation
                    .declaration(source, reference.node)
                    .map(|found| found.decl_ref());
                assert_eq!(found, Some(first));
            }

            let mut found = refs.into_iter().map(|reference| reference.node).collect::<Vec<_>>();
            found.sort();
            assert_eq!(found, expected);
        }

        let second = published
            .decls()
            .find(|(_, decl)| decl.node == sites[1])
            .map(|(id, _)| published.decl_ref(id))
            .expect("second assignment declares x");
        assert_eq!(compilation.lookup().references(second).len(), 3);
    }

    #[test]
    fn test_field_methods_round_trip() {
        // local M = {}
        // function M.new() end
        // M.new()
        let mut compilation = Compilation::default();
        let mut call_site = None;

        let tree = file(&mut compilation, "a.lua", |fx| {
            let local = fx.local(&["M"], |fx| vec![fx.table(|_| vec![]).into()]);
            let method = fx.method("M", "new", false, &[], |_| vec![]);
            let call = fx.call_stat(|fx| {
                let m = fx.var("M");
                let new = fx.index(m, "new", false);
                call_site = Some(new.erase());
                fx.call(new, |_| vec![])
            });
            vec![local.into(), method.into(), call.into()]
        });
        let source = tree.source();

        compilation.update(vec![tree]).expect("source is registered");

        let call_site = call_site.expect("call was built");
        let method = compilation
            .declaration(source, call_site)
            .expect("call resolves to the method");
        assert!(matches!(
            method.kind,
            DeclKind::Method {
                feature: MethodFeature::Field,
                ..
            }
        ));

        let refs = compilation.references(source, method.node);
        assert_eq!(
            refs.iter().map(|reference| reference.node).collect::<Vec<_>>(),
            [method.node, call_site]
        );
        assert_eq!(compilation.references(source, call_site), refs);
        for reference in &refs {
            let found = compilation
                .declaration(source, reference.node)
                .map(|found| found.decl_ref());
            assert_eq!(found, Some(method.decl_ref()));
        }
    }

    #[test]
    fn test_unregistered_sources_are_rejected() {
        let mut compilation = Compilation::default();
        let stray = Fixture::new(SourceId::new(7)).finish(|_| vec![]);
        let root = stray.root().erase();

        assert_eq!(
            compilation.update(vec![stray]),
            Err(SourceError::UnknownSource(SourceId::new(7)))
        );
        assert_eq!(
            compilation.remove(SourceId::new(7)),
            Err(SourceError::UnknownSource(SourceId::new(7)))
        );
        assert!(compilation.index().is_empty());
        assert!(compilation.references(SourceId::new(7), root).is_empty());
    }
}
