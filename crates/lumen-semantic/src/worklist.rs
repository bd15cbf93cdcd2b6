use bitflags::bitflags;
use lumen_tree::prelude::*;

use crate::decl::DeclId;

bitflags! {
    /// What a task still has to determine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResolveState: u8 {
        /// The type of the declaration.
        const TYPE = 1;
        /// The owner an indexed assignment target belongs to.
        const INDEX = 1 << 1;
        /// The return types of a closure or file.
        const RETURN = 1 << 2;
    }
}

/// The expression that supplies a value, and which of its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprRef {
    pub expr: node::Expr,
    pub slot: usize,
}

impl ExprRef {
    pub fn new(expr: node::Expr, slot: usize) -> Self {
        Self { expr, slot }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveTask {
    Declaration {
        decl: DeclId,
        expr: Option<ExprRef>,
        state: ResolveState,
        /// The statement carries a class, interface, enum or alias tag, so a
        /// table it assigns defines the members of that type.
        type_declaration: bool,
    },
    Method {
        closure: Id<node::ClosureExpr>,
        state: ResolveState,
    },
    Source {
        block: Id<node::Block>,
        state: ResolveState,
    },
}

impl ResolveTask {
    pub fn state(&self) -> ResolveState {
        match self {
            Self::Declaration { state, .. } | Self::Method { state, .. } | Self::Source { state, .. } => {
                *state
            }
        }
    }
}

/// The deferred work of one file, in creation order.
///
/// Every task is taken at most once.
#[derive(Debug, Clone, Default)]
pub struct Worklist {
    tasks: Vec<Option<ResolveTask>>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: ResolveTask) -> usize {
        self.tasks.push(Some(task));
        self.tasks.len() - 1
    }

    /// Number of tasks ever scheduled.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks not yet taken.
    pub fn pending(&self) -> usize {
        self.tasks.iter().flatten().count()
    }

    pub fn get(&self, index: usize) -> Option<&ResolveTask> {
        self.tasks.get(index)?.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &ResolveTask)> {
        self.tasks
            .iter()
            .enumerate()
            .filter_map(|(i, task)| Some((i, task.as_ref()?)))
    }

    /// Removes a task for processing.
    pub fn take(&mut self, index: usize) -> Option<ResolveTask> {
        self.tasks.get_mut(index)?.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_are_taken_once() {
        let mut worklist = Worklist::new();
        let task = ResolveTask::Declaration {
            decl: DeclId::new(0),
            expr: None,
            state: ResolveState::TYPE | ResolveState::INDEX,
            type_declaration: false,
        };

        let index = worklist.push(task.clone());

        assert_eq!(worklist.pending(), 1);
        assert!(worklist.get(index).is_some_and(|task| task.state().contains(ResolveState::INDEX)));
        assert_eq!(worklist.take(index), Some(task));
        assert_eq!(worklist.take(index), None);
        assert_eq!(worklist.pending(), 0);
        assert_eq!(worklist.len(), 1);
    }
}
