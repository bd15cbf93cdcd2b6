use derive_more::{Display, From};
use enum_as_inner::EnumAsInner;

use super::{Block, Name, NodeKind, Symbol};
use crate::{
    id::{Id, NodeId},
    tree::{SyntaxTree, TreeBuilder},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, EnumAsInner)]
pub enum Expr {
    Name(Id<NameExpr>),
    Index(Id<IndexExpr>),
    Call(Id<CallExpr>),
    Closure(Id<ClosureExpr>),
    Table(Id<TableExpr>),
    Literal(Id<LiteralExpr>),
    Binary(Id<BinaryExpr>),
    Unary(Id<UnaryExpr>),
    Paren(Id<ParenExpr>),
    VarArg(Id<VarArgExpr>),
}

impl Expr {
    pub fn erase(self) -> NodeId {
        match self {
            Self::Name(id) => id.erase(),
            Self::Index(id) => id.erase(),
            Self::Call(id) => id.erase(),
            Self::Closure(id) => id.erase(),
            Self::Table(id) => id.erase(),
            Self::Literal(id) => id.erase(),
            Self::Binary(id) => id.erase(),
            Self::Unary(id) => id.erase(),
            Self::Paren(id) => id.erase(),
            Self::VarArg(id) => id.erase(),
        }
    }

    /// Recovers the expression view of an untyped id.
    pub fn from_node(id: NodeId, tree: &SyntaxTree) -> Option<Self> {
        let expr = match tree.kind(id) {
            NodeKind::NameExpr => Self::Name(id.cast(tree)?),
            NodeKind::IndexExpr => Self::Index(id.cast(tree)?),
            NodeKind::CallExpr => Self::Call(id.cast(tree)?),
            NodeKind::ClosureExpr => Self::Closure(id.cast(tree)?),
            NodeKind::TableExpr => Self::Table(id.cast(tree)?),
            NodeKind::LiteralExpr => Self::Literal(id.cast(tree)?),
            NodeKind::BinaryExpr => Self::Binary(id.cast(tree)?),
            NodeKind::UnaryExpr => Self::Unary(id.cast(tree)?),
            NodeKind::ParenExpr => Self::Paren(id.cast(tree)?),
            NodeKind::VarArgExpr => Self::VarArg(id.cast(tree)?),
            _ => return None,
        };

        Some(expr)
    }
}

/// A name used as a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameExpr {
    pub name: Symbol,
}

impl NameExpr {
    pub fn new_in(name: impl Into<Symbol>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { name: name.into() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From)]
pub enum IndexKey {
    /// `t.name` or `t:name`
    Name(Id<Name>),
    /// `t[expr]`
    Expr(Expr),
}

impl IndexKey {
    pub fn erase(self) -> NodeId {
        match self {
            Self::Name(id) => id.erase(),
            Self::Expr(expr) => expr.erase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub prefix: Option<Expr>,
    pub key: Option<IndexKey>,
    pub colon: bool,
}

impl IndexExpr {
    pub fn new_in(
        prefix: Option<Expr>,
        key: Option<IndexKey>,
        colon: bool,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { prefix, key, colon })
    }

    /// The member name this expression selects. Bracket keys count when
    /// they are string or integer literals, `t[1]` selects `[1]`.
    pub fn key_name(&self, tree: &SyntaxTree) -> Option<Symbol> {
        match self.key? {
            IndexKey::Name(name) => Some(tree.node(name).text.clone()),
            IndexKey::Expr(Expr::Literal(literal)) => literal_key(&tree.node(literal).0),
            IndexKey::Expr(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub prefix: Option<Expr>,
    pub args: Vec<Expr>,
}

impl CallExpr {
    pub fn new_in(prefix: Option<Expr>, args: Vec<Expr>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { prefix, args })
    }
}

/// `function(a, b, ...) ... end`, a vararg parameter is a [`Name`] spelled `...`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosureExpr {
    pub params: Vec<Id<Name>>,
    pub block: Option<Id<Block>>,
}

impl ClosureExpr {
    pub fn new_in(
        params: Vec<Id<Name>>,
        block: Option<Id<Block>>,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { params, block })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableExpr {
    pub fields: Vec<Id<TableField>>,
}

impl TableExpr {
    pub fn new_in(fields: Vec<Id<TableField>>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { fields })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From)]
pub enum FieldKey {
    /// `{ name = value }`
    Name(Id<Name>),
    /// `{ [expr] = value }`
    Expr(Expr),
}

impl FieldKey {
    pub fn erase(self) -> NodeId {
        match self {
            Self::Name(id) => id.erase(),
            Self::Expr(expr) => expr.erase(),
        }
    }
}

/// An entry of a table constructor, positional entries have no key.
#[derive(Debug, Clone, PartialEq)]
pub struct TableField {
    pub key: Option<FieldKey>,
    pub value: Option<Expr>,
}

impl TableField {
    pub fn new_in(key: Option<FieldKey>, value: Option<Expr>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { key, value })
    }

    pub fn key_name(&self, tree: &SyntaxTree) -> Option<Symbol> {
        match self.key? {
            FieldKey::Name(name) => Some(tree.node(name).text.clone()),
            FieldKey::Expr(Expr::Literal(literal)) => literal_key(&tree.node(literal).0),
            FieldKey::Expr(_) => None,
        }
    }
}

fn literal_key(literal: &Literal) -> Option<Symbol> {
    match literal {
        Literal::String(text) => Some(text.clone()),
        Literal::Integer(n) => Some(ecow::eco_format!("[{n}]")),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Display)]
pub enum Literal {
    #[display("nil")]
    Nil,
    #[display("{_0}")]
    Bool(bool),
    #[display("{_0}")]
    Integer(i64),
    #[display("{_0}")]
    Number(f64),
    #[display("{_0:?}")]
    String(Symbol),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr(pub Literal);

impl LiteralExpr {
    pub fn new_in(literal: Literal, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self(literal))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BinaryOp {
    #[display("+")]
    Add,
    #[display("-")]
    Sub,
    #[display("*")]
    Mul,
    #[display("/")]
    Div,
    #[display("//")]
    IDiv,
    #[display("%")]
    Mod,
    #[display("^")]
    Pow,
    #[display("..")]
    Concat,
    #[display("&")]
    BAnd,
    #[display("|")]
    BOr,
    #[display("~")]
    BXor,
    #[display("<<")]
    Shl,
    #[display(">>")]
    Shr,
    #[display("==")]
    Eq,
    #[display("~=")]
    Ne,
    #[display("<")]
    Lt,
    #[display("<=")]
    Le,
    #[display(">")]
    Gt,
    #[display(">=")]
    Ge,
    #[display("and")]
    And,
    #[display("or")]
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Option<Expr>,
    pub rhs: Option<Expr>,
}

impl BinaryExpr {
    pub fn new_in(
        op: BinaryOp,
        lhs: Option<Expr>,
        rhs: Option<Expr>,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { op, lhs, rhs })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum UnaryOp {
    #[display("-")]
    Neg,
    #[display("not")]
    Not,
    #[display("#")]
    Len,
    #[display("~")]
    BNot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Option<Expr>,
}

impl UnaryExpr {
    pub fn new_in(op: UnaryOp, operand: Option<Expr>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { op, operand })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenExpr {
    pub inner: Option<Expr>,
}

impl ParenExpr {
    pub fn new_in(inner: Option<Expr>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { inner })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarArgExpr;
