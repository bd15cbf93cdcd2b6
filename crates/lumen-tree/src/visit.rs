use std::ops::ControlFlow;

use crate::{id::NodeId, tree::SyntaxTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Event {
    Enter(NodeId),
    Exit(NodeId),
}

#[derive(Debug, Clone, Default)]
pub struct EventStack {
    stack: Vec<Event>,
}

impl EventStack {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn next(&mut self) -> Option<Event> {
        self.stack.pop()
    }

    pub fn push_node(&mut self, id: NodeId) {
        self.stack.push(Event::Exit(id));
        self.stack.push(Event::Enter(id));
    }

    /// Schedules the children of `id` so that they are entered in source order.
    pub fn push_children(&mut self, id: NodeId, tree: &SyntaxTree) {
        for child in tree.children(id).into_iter().rev() {
            self.push_node(child);
        }
    }
}

/// A depth-first, pre-order walk with explicit enter and exit events.
///
/// The walk keeps its own stack, deeply nested input does not grow the
/// call stack.
pub trait Visitor {
    type BreakValue;

    fn enter(&mut self, _id: NodeId, _tree: &SyntaxTree) -> ControlFlow<Self::BreakValue> {
        ControlFlow::Continue(())
    }

    fn exit(&mut self, _id: NodeId, _tree: &SyntaxTree) -> ControlFlow<Self::BreakValue> {
        ControlFlow::Continue(())
    }

    /// Whether the children of `id` are walked, asked right after entering it.
    fn descend(&mut self, _id: NodeId, _tree: &SyntaxTree) -> bool {
        true
    }

    fn walk(&mut self, root: NodeId, tree: &SyntaxTree) -> ControlFlow<Self::BreakValue> {
        let mut stack = EventStack::new();
        stack.push_node(root);

        while let Some(event) = stack.next() {
            match event {
                Event::Enter(id) => {
                    self.enter(id, tree)?;

                    if self.descend(id, tree) {
                        stack.push_children(id, tree);
                    }
                }
                Event::Exit(id) => self.exit(id, tree)?,
            }
        }

        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use lumen_span::SourceId;

    use super::*;
    use crate::{
        node::{self, Expr, NodeKind},
        tree::TreeBuilder,
    };

    #[derive(Default)]
    struct Recorder {
        events: Vec<(bool, NodeKind)>,
        skip: Option<NodeKind>,
    }

    impl Visitor for Recorder {
        type BreakValue = NodeId;

        fn enter(&mut self, id: NodeId, tree: &SyntaxTree) -> ControlFlow<NodeId> {
            self.events.push((true, tree.kind(id)));

            if tree.kind(id) == NodeKind::LiteralExpr {
                return ControlFlow::Break(id);
            }

            ControlFlow::Continue(())
        }

        fn exit(&mut self, id: NodeId, tree: &SyntaxTree) -> ControlFlow<NodeId> {
            self.events.push((false, tree.kind(id)));
            ControlFlow::Continue(())
        }

        fn descend(&mut self, id: NodeId, tree: &SyntaxTree) -> bool {
            Some(tree.kind(id)) != self.skip
        }
    }

    fn tree() -> SyntaxTree {
        let mut builder = TreeBuilder::new(SourceId::new(0));

        let name = node::Name::new_in("f", &mut builder);
        let block = node::Block::new_in(vec![], &mut builder);
        let closure = node::ClosureExpr::new_in(vec![], Some(block), &mut builder);
        let local = node::LocalStat::new_in(vec![name], vec![Expr::Closure(closure)], &mut builder);
        let one = node::LiteralExpr::new_in(node::Literal::Integer(1), &mut builder);
        let ret = node::ReturnStat::new_in(vec![one.into()], &mut builder);
        let block = node::Block::new_in(vec![local.into(), ret.into()], &mut builder);
        let root = node::Source::new_in(Some(block), &mut builder);

        builder.finish(root)
    }

    #[test]
    fn test_walk_enters_and_exits_in_order() {
        let tree = tree();
        let mut recorder = Recorder {
            skip: Some(NodeKind::ClosureExpr),
            ..Default::default()
        };

        let flow = recorder.walk(tree.root().erase(), &tree);

        assert!(flow.is_break());
        assert_eq!(
            recorder.events,
            vec![
                (true, NodeKind::Source),
                (true, NodeKind::Block),
                (true, NodeKind::LocalStat),
                (true, NodeKind::Name),
                (false, NodeKind::Name),
                (true, NodeKind::ClosureExpr),
                (false, NodeKind::ClosureExpr),
                (false, NodeKind::LocalStat),
                (true, NodeKind::ReturnStat),
                (true, NodeKind::LiteralExpr),
            ]
        );
    }
}
