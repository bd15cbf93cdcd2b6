use std::{convert::Infallible, ops::ControlFlow};

use lumen_tree::prelude::*;

/// The names and member keys an expression mentions, nested closures not
/// included.
#[derive(Debug, Default)]
pub(super) struct Mentions {
    pub names: Vec<Id<node::NameExpr>>,
    pub keys: Vec<Symbol>,
}

impl Mentions {
    pub fn of(root: NodeId, tree: &SyntaxTree) -> Self {
        let mut mentions = Self::default();
        run(&mut mentions, root, tree);
        mentions
    }
}

impl Visitor for Mentions {
    type BreakValue = Infallible;

    fn enter(&mut self, id: NodeId, tree: &SyntaxTree) -> ControlFlow<Infallible> {
        match tree.raw(id) {
            Node::NameExpr(_) => self.names.extend(id.cast(tree)),
            Node::IndexExpr(expr) => self.keys.extend(expr.key_name(tree)),
            _ => {}
        }

        ControlFlow::Continue(())
    }

    fn descend(&mut self, id: NodeId, tree: &SyntaxTree) -> bool {
        tree.kind(id) != NodeKind::ClosureExpr
    }
}

/// The `return` statements of a body, nested closures not included.
#[derive(Debug, Default)]
pub(super) struct Returns(pub Vec<Id<node::ReturnStat>>);

impl Returns {
    pub fn of(block: Id<node::Block>, tree: &SyntaxTree) -> Vec<Id<node::ReturnStat>> {
        let mut returns = Self::default();
        run(&mut returns, block.erase(), tree);
        returns.0
    }
}

impl Visitor for Returns {
    type BreakValue = Infallible;

    fn enter(&mut self, id: NodeId, tree: &SyntaxTree) -> ControlFlow<Infallible> {
        self.0.extend(id.cast::<node::ReturnStat>(tree));
        ControlFlow::Continue(())
    }

    fn descend(&mut self, id: NodeId, tree: &SyntaxTree) -> bool {
        tree.kind(id) != NodeKind::ClosureExpr
    }
}

fn run(visitor: &mut impl Visitor<BreakValue = Infallible>, root: NodeId, tree: &SyntaxTree) {
    match visitor.walk(root, tree) {
        ControlFlow::Continue(()) => {}
        ControlFlow::Break(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use lumen_span::SourceId;
    use lumen_tree::fixture::Fixture;

    use super::*;

    #[test]
    fn test_mentions_skip_closure_bodies() {
        // return a.b + c, function() return d end
        let mut ret = None;
        let tree = Fixture::new(SourceId::new(0)).finish(|fx| {
            let stat = fx.ret(|fx| {
                let a = fx.var("a");
                let b = fx.index(a, "b", false).into();
                let c = fx.var("c").into();
                let sum = fx.binary(node::BinaryOp::Add, b, c).into();
                let closure = fx.closure(&[], |fx| {
                    let d = fx.var("d").into();
                    vec![fx.ret(|_| vec![d]).into()]
                });
                vec![sum, closure.into()]
            });
            ret = Some(stat);
            vec![stat.into()]
        });

        let mentions = Mentions::of(ret.expect("return was built").erase(), &tree);
        let names = mentions
            .names
            .iter()
            .map(|&id| tree.node(id).name.to_string())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(mentions.keys, vec!["b"]);
    }

    #[test]
    fn test_returns_of_a_body() {
        // if x then return 1 end    local f = function() return 2 end    return 3
        let tree = Fixture::new(SourceId::new(0)).finish(|fx| {
            let branch = fx.if_then(
                |fx| fx.var("x").into(),
                |fx| vec![fx.ret(|fx| vec![fx.int(1)]).into()],
            );
            let local = fx.local(&["f"], |fx| {
                let closure = fx.closure(&[], |fx| vec![fx.ret(|fx| vec![fx.int(2)]).into()]);
                vec![closure.into()]
            });
            let last = fx.ret(|fx| vec![fx.int(3)]);
            vec![branch.into(), local.into(), last.into()]
        });

        let block = tree
            .node(tree.root())
            .block
            .expect("file has a body");

        assert_eq!(Returns::of(block, &tree).len(), 2);
    }
}
