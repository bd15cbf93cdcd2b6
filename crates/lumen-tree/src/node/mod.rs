pub use doc::*;
pub use expr::*;
pub use stat::*;

mod doc;
mod expr;
mod stat;

use derive_more::From;
use lumen_utils::impl_try_as_ref;

use crate::{
    id::{Id, NodeId},
    tree::TreeBuilder,
};

pub type Symbol = ecow::EcoString;

macro_rules! define_nodes {
    ($($variant:ident),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum NodeKind {
            $($variant),*
        }

        #[derive(Clone, Debug, PartialEq, From)]
        pub enum Node {
            $($variant($variant)),*
        }

        impl_try_as_ref!(Node, $($variant($variant)),*);

        impl Node {
            pub fn kind(&self) -> NodeKind {
                match self {
                    $(Self::$variant(_) => NodeKind::$variant),*
                }
            }
        }
    };
}

define_nodes!(
    Name,
    Source,
    Block,
    LocalStat,
    AssignStat,
    FuncStat,
    CallStat,
    DoStat,
    WhileStat,
    RepeatStat,
    IfStat,
    IfClause,
    ForStat,
    ForRangeStat,
    ReturnStat,
    BreakStat,
    LabelStat,
    GotoStat,
    NameExpr,
    IndexExpr,
    CallExpr,
    ClosureExpr,
    TableExpr,
    TableField,
    LiteralExpr,
    BinaryExpr,
    UnaryExpr,
    ParenExpr,
    VarArgExpr,
    Comment,
    DocClass,
    DocEnum,
    DocAlias,
    DocField,
    DocBody,
    DocTypeTag,
    DocParam,
    DocReturn,
    DocGeneric,
    DocGenericParam,
    DocOverload,
    DocOperator,
    DocNameType,
    DocArrayType,
    DocUnionType,
    DocFuncType,
    DocFuncParam,
    DocTableType,
    DocGenericType,
);

impl NodeKind {
    pub fn is_stat(self) -> bool {
        matches!(
            self,
            Self::LocalStat
                | Self::AssignStat
                | Self::FuncStat
                | Self::CallStat
                | Self::DoStat
                | Self::WhileStat
                | Self::RepeatStat
                | Self::IfStat
                | Self::ForStat
                | Self::ForRangeStat
                | Self::ReturnStat
                | Self::BreakStat
                | Self::LabelStat
                | Self::GotoStat
        )
    }
}

/// An identifier token, used wherever a name is declared rather than used.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub text: Symbol,
}

impl Name {
    pub const VARARG: &'static str = "...";

    pub fn new_in(text: impl Into<Symbol>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { text: text.into() })
    }

    pub fn is_vararg(&self) -> bool {
        self.text == Self::VARARG
    }
}

fn push<T>(out: &mut Vec<NodeId>, id: Id<T>) {
    out.push(id.erase());
}

fn push_opt<T>(out: &mut Vec<NodeId>, id: Option<Id<T>>) {
    out.extend(id.map(Id::erase));
}

fn push_all<T>(out: &mut Vec<NodeId>, ids: &[Id<T>]) {
    out.extend(ids.iter().map(|id| id.erase()));
}

fn push_exprs(out: &mut Vec<NodeId>, exprs: &[Expr]) {
    out.extend(exprs.iter().map(|expr| expr.erase()));
}

fn push_types(out: &mut Vec<NodeId>, types: &[DocType]) {
    out.extend(types.iter().map(|ty| ty.erase()));
}

impl Node {
    /// Appends the ids of the direct children in source order.
    ///
    /// Comments are not children of a statement, the tree yields them
    /// before the statement they are attached to.
    pub fn children(&self, out: &mut Vec<NodeId>) {
        match self {
            Node::Source(Source { block }) => push_opt(out, *block),
            Node::Block(Block { stats }) => out.extend(stats.iter().map(|stat| stat.erase())),
            Node::LocalStat(LocalStat { names, exprs }) => {
                push_all(out, names);
                push_exprs(out, exprs);
            }
            Node::AssignStat(AssignStat { vars, exprs }) => {
                push_exprs(out, vars);
                push_exprs(out, exprs);
            }
            Node::FuncStat(FuncStat { target, closure }) => {
                out.extend(target.map(FuncTarget::erase));
                push_opt(out, *closure);
            }
            Node::CallStat(CallStat { call }) => out.push(call.erase()),
            Node::DoStat(DoStat { block }) => push_opt(out, *block),
            Node::WhileStat(WhileStat { cond, block }) => {
                out.extend(cond.map(Expr::erase));
                push_opt(out, *block);
            }
            Node::RepeatStat(RepeatStat { block, cond }) => {
                push_opt(out, *block);
                out.extend(cond.map(Expr::erase));
            }
            Node::IfStat(IfStat { clauses }) => push_all(out, clauses),
            Node::IfClause(IfClause { cond, block }) => {
                out.extend(cond.map(Expr::erase));
                push_opt(out, *block);
            }
            Node::ForStat(ForStat { var, exprs, block }) => {
                push_opt(out, *var);
                push_exprs(out, exprs);
                push_opt(out, *block);
            }
            Node::ForRangeStat(ForRangeStat { names, exprs, block }) => {
                push_all(out, names);
                push_exprs(out, exprs);
                push_opt(out, *block);
            }
            Node::ReturnStat(ReturnStat { exprs }) => push_exprs(out, exprs),
            Node::LabelStat(LabelStat { name }) => push_opt(out, *name),
            Node::GotoStat(GotoStat { label }) => push_opt(out, *label),
            Node::IndexExpr(IndexExpr { prefix, key, .. }) => {
                out.extend(prefix.map(Expr::erase));
                out.extend(key.map(IndexKey::erase));
            }
            Node::CallExpr(CallExpr { prefix, args }) => {
                out.extend(prefix.map(Expr::erase));
                push_exprs(out, args);
            }
            Node::ClosureExpr(ClosureExpr { params, block }) => {
                push_all(out, params);
                push_opt(out, *block);
            }
            Node::TableExpr(TableExpr { fields }) => push_all(out, fields),
            Node::TableField(TableField { key, value }) => {
                out.extend(key.map(FieldKey::erase));
                out.extend(value.map(Expr::erase));
            }
            Node::BinaryExpr(BinaryExpr { lhs, rhs, .. }) => {
                out.extend(lhs.map(Expr::erase));
                out.extend(rhs.map(Expr::erase));
            }
            Node::UnaryExpr(UnaryExpr { operand, .. }) => out.extend(operand.map(Expr::erase)),
            Node::ParenExpr(ParenExpr { inner }) => out.extend(inner.map(Expr::erase)),
            Node::Comment(Comment { tags }) => out.extend(tags.iter().map(|tag| tag.erase())),
            Node::DocClass(DocClass {
                name,
                generics,
                supers,
                body,
                ..
            }) => {
                push_opt(out, *name);
                push_opt(out, *generics);
                push_types(out, supers);
                push_opt(out, *body);
            }
            Node::DocEnum(DocEnum { name, base, fields }) => {
                push_opt(out, *name);
                out.extend(base.map(DocType::erase));
                push_all(out, fields);
            }
            Node::DocAlias(DocAlias { name, ty }) => {
                push_opt(out, *name);
                out.extend(ty.map(DocType::erase));
            }
            Node::DocField(DocField { key, ty, .. }) => {
                if let Some(key) = key {
                    key.children(out);
                }
                out.extend(ty.map(DocType::erase));
            }
            Node::DocBody(DocBody { fields }) => push_all(out, fields),
            Node::DocTypeTag(DocTypeTag { types }) => push_types(out, types),
            Node::DocParam(DocParam { name, ty, .. }) => {
                push_opt(out, *name);
                out.extend(ty.map(DocType::erase));
            }
            Node::DocReturn(DocReturn { types }) => push_types(out, types),
            Node::DocGeneric(DocGeneric { params }) => push_all(out, params),
            Node::DocGenericParam(DocGenericParam { name, constraint }) => {
                push_opt(out, *name);
                out.extend(constraint.map(DocType::erase));
            }
            Node::DocOverload(DocOverload { ty }) => out.extend(ty.map(DocType::erase)),
            Node::DocOperator(DocOperator { op, operands, ret }) => {
                push_opt(out, *op);
                push_types(out, operands);
                out.extend(ret.map(DocType::erase));
            }
            Node::DocArrayType(DocArrayType { elem }) => out.extend(elem.map(DocType::erase)),
            Node::DocUnionType(DocUnionType { types }) => push_types(out, types),
            Node::DocFuncType(DocFuncType { params, returns }) => {
                push_all(out, params);
                push_types(out, returns);
            }
            Node::DocFuncParam(DocFuncParam { name, ty, .. }) => {
                push_opt(out, *name);
                out.extend(ty.map(DocType::erase));
            }
            Node::DocTableType(DocTableType { fields }) => push_all(out, fields),
            Node::DocGenericType(DocGenericType { name, args }) => {
                push(out, *name);
                push_types(out, args);
            }
            Node::Name(_)
            | Node::BreakStat(_)
            | Node::NameExpr(_)
            | Node::LiteralExpr(_)
            | Node::VarArgExpr(_)
            | Node::DocNameType(_) => {}
        }
    }

    /// Width given to a node without children when the builder
    /// lays out positions itself.
    pub(crate) fn leaf_width(&self) -> usize {
        match self {
            Node::Name(Name { text }) => text.len().max(1),
            Node::NameExpr(NameExpr { name }) => name.len().max(1),
            Node::DocNameType(DocNameType { name }) => name.len().max(1),
            Node::LiteralExpr(LiteralExpr(Literal::String(text))) => text.len() + 2,
            Node::VarArgExpr(_) => 3,
            Node::BreakStat(_) => 5,
            _ => 1,
        }
    }
}
