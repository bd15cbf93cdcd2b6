use derive_more::From;
use enum_as_inner::EnumAsInner;

use super::{ClosureExpr, Expr, IndexExpr, Name, NameExpr};
use crate::{
    id::{Id, NodeId},
    tree::TreeBuilder,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, EnumAsInner)]
pub enum Stat {
    Local(Id<LocalStat>),
    Assign(Id<AssignStat>),
    Func(Id<FuncStat>),
    Call(Id<CallStat>),
    Do(Id<DoStat>),
    While(Id<WhileStat>),
    Repeat(Id<RepeatStat>),
    If(Id<IfStat>),
    For(Id<ForStat>),
    ForRange(Id<ForRangeStat>),
    Return(Id<ReturnStat>),
    Break(Id<BreakStat>),
    Label(Id<LabelStat>),
    Goto(Id<GotoStat>),
}

impl Stat {
    pub fn erase(self) -> NodeId {
        match self {
            Self::Local(id) => id.erase(),
            Self::Assign(id) => id.erase(),
            Self::Func(id) => id.erase(),
            Self::Call(id) => id.erase(),
            Self::Do(id) => id.erase(),
            Self::While(id) => id.erase(),
            Self::Repeat(id) => id.erase(),
            Self::If(id) => id.erase(),
            Self::For(id) => id.erase(),
            Self::ForRange(id) => id.erase(),
            Self::Return(id) => id.erase(),
            Self::Break(id) => id.erase(),
            Self::Label(id) => id.erase(),
            Self::Goto(id) => id.erase(),
        }
    }
}

/// The root of every file.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub block: Option<Id<Block>>,
}

impl Source {
    pub fn new_in(block: Option<Id<Block>>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { block })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stats: Vec<Stat>,
}

impl Block {
    pub fn new_in(stats: Vec<Stat>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { stats })
    }
}

/// `local a, b = x, y`
#[derive(Debug, Clone, PartialEq)]
pub struct LocalStat {
    pub names: Vec<Id<Name>>,
    pub exprs: Vec<Expr>,
}

impl LocalStat {
    pub fn new_in(names: Vec<Id<Name>>, exprs: Vec<Expr>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { names, exprs })
    }
}

/// `a, t.b = x, y`
#[derive(Debug, Clone, PartialEq)]
pub struct AssignStat {
    pub vars: Vec<Expr>,
    pub exprs: Vec<Expr>,
}

impl AssignStat {
    pub fn new_in(vars: Vec<Expr>, exprs: Vec<Expr>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { vars, exprs })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From)]
pub enum FuncTarget {
    /// `local function f() end`
    Local(Id<Name>),
    /// `function f() end`
    Global(Id<NameExpr>),
    /// `function t.f() end` or `function t:f() end`
    Field(Id<IndexExpr>),
}

impl FuncTarget {
    pub fn erase(self) -> NodeId {
        match self {
            Self::Local(id) => id.erase(),
            Self::Global(id) => id.erase(),
            Self::Field(id) => id.erase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncStat {
    pub target: Option<FuncTarget>,
    pub closure: Option<Id<ClosureExpr>>,
}

impl FuncStat {
    pub fn new_in(
        target: Option<FuncTarget>,
        closure: Option<Id<ClosureExpr>>,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { target, closure })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallStat {
    pub call: Expr,
}

impl CallStat {
    pub fn new_in(call: Expr, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { call })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoStat {
    pub block: Option<Id<Block>>,
}

impl DoStat {
    pub fn new_in(block: Option<Id<Block>>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { block })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStat {
    pub cond: Option<Expr>,
    pub block: Option<Id<Block>>,
}

impl WhileStat {
    pub fn new_in(
        cond: Option<Expr>,
        block: Option<Id<Block>>,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { cond, block })
    }
}

/// `repeat ... until cond`
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatStat {
    pub block: Option<Id<Block>>,
    pub cond: Option<Expr>,
}

impl RepeatStat {
    pub fn new_in(
        block: Option<Id<Block>>,
        cond: Option<Expr>,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { block, cond })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStat {
    pub clauses: Vec<Id<IfClause>>,
}

impl IfStat {
    pub fn new_in(clauses: Vec<Id<IfClause>>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { clauses })
    }
}

/// One `if`/`elseif`/`else` arm, `else` has no condition.
#[derive(Debug, Clone, PartialEq)]
pub struct IfClause {
    pub cond: Option<Expr>,
    pub block: Option<Id<Block>>,
}

impl IfClause {
    pub fn new_in(
        cond: Option<Expr>,
        block: Option<Id<Block>>,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { cond, block })
    }
}

/// `for i = start, stop, step do ... end`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStat {
    pub var: Option<Id<Name>>,
    pub exprs: Vec<Expr>,
    pub block: Option<Id<Block>>,
}

impl ForStat {
    pub fn new_in(
        var: Option<Id<Name>>,
        exprs: Vec<Expr>,
        block: Option<Id<Block>>,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { var, exprs, block })
    }
}

/// `for k, v in pairs(t) do ... end`
#[derive(Debug, Clone, PartialEq)]
pub struct ForRangeStat {
    pub names: Vec<Id<Name>>,
    pub exprs: Vec<Expr>,
    pub block: Option<Id<Block>>,
}

impl ForRangeStat {
    pub fn new_in(
        names: Vec<Id<Name>>,
        exprs: Vec<Expr>,
        block: Option<Id<Block>>,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { names, exprs, block })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStat {
    pub exprs: Vec<Expr>,
}

impl ReturnStat {
    pub fn new_in(exprs: Vec<Expr>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { exprs })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakStat;

/// `::name::`
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStat {
    pub name: Option<Id<Name>>,
}

impl LabelStat {
    pub fn new_in(name: Option<Id<Name>>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { name })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GotoStat {
    pub label: Option<Id<Name>>,
}

impl GotoStat {
    pub fn new_in(label: Option<Id<Name>>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { label })
    }
}
