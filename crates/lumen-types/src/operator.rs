use std::str::FromStr;

use derive_more::Display;
use lumen_tree::node::{BinaryOp, UnaryOp};
use serde::{Deserialize, Serialize};

use crate::Type;

/// Operators a class can overload with `---@operator`.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorKind {
    #[display("add")]
    Add,
    #[display("sub")]
    Sub,
    #[display("mul")]
    Mul,
    #[display("div")]
    Div,
    #[display("mod")]
    Mod,
    #[display("pow")]
    Pow,
    #[display("unm")]
    Unm,
    #[display("idiv")]
    IDiv,
    #[display("band")]
    BAnd,
    #[display("bor")]
    BOr,
    #[display("bxor")]
    BXor,
    #[display("bnot")]
    BNot,
    #[display("shl")]
    Shl,
    #[display("shr")]
    Shr,
    #[display("concat")]
    Concat,
    #[display("len")]
    Len,
    #[display("eq")]
    Eq,
    #[display("lt")]
    Lt,
    #[display("le")]
    Le,
    /// `[key]: value` index signature.
    #[display("index")]
    Index,
}

impl OperatorKind {
    pub fn is_unary(self) -> bool {
        matches!(self, Self::Unm | Self::BNot | Self::Len)
    }

    pub fn is_comparison(self) -> bool {
        matches!(self, Self::Eq | Self::Lt | Self::Le)
    }

    /// The metamethod behind a binary operator.
    ///
    /// `>` and `>=` use `lt`/`le` with swapped operands, `~=` uses `eq`.
    /// The logical operators have none.
    pub fn from_binary(op: BinaryOp) -> Option<Self> {
        let kind = match op {
            BinaryOp::Add => Self::Add,
            BinaryOp::Sub => Self::Sub,
            BinaryOp::Mul => Self::Mul,
            BinaryOp::Div => Self::Div,
            BinaryOp::IDiv => Self::IDiv,
            BinaryOp::Mod => Self::Mod,
            BinaryOp::Pow => Self::Pow,
            BinaryOp::Concat => Self::Concat,
            BinaryOp::BAnd => Self::BAnd,
            BinaryOp::BOr => Self::BOr,
            BinaryOp::BXor => Self::BXor,
            BinaryOp::Shl => Self::Shl,
            BinaryOp::Shr => Self::Shr,
            BinaryOp::Eq | BinaryOp::Ne => Self::Eq,
            BinaryOp::Lt | BinaryOp::Gt => Self::Lt,
            BinaryOp::Le | BinaryOp::Ge => Self::Le,
            BinaryOp::And | BinaryOp::Or => return None,
        };

        Some(kind)
    }

    pub fn from_unary(op: UnaryOp) -> Option<Self> {
        match op {
            UnaryOp::Neg => Some(Self::Unm),
            UnaryOp::BNot => Some(Self::BNot),
            UnaryOp::Len => Some(Self::Len),
            UnaryOp::Not => None,
        }
    }
}

impl FromStr for OperatorKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "add" => Self::Add,
            "sub" => Self::Sub,
            "mul" => Self::Mul,
            "div" => Self::Div,
            "mod" => Self::Mod,
            "pow" => Self::Pow,
            "unm" => Self::Unm,
            "idiv" => Self::IDiv,
            "band" => Self::BAnd,
            "bor" => Self::BOr,
            "bxor" => Self::BXor,
            "bnot" => Self::BNot,
            "shl" => Self::Shl,
            "shr" => Self::Shr,
            "concat" => Self::Concat,
            "len" => Self::Len,
            "eq" => Self::Eq,
            "lt" => Self::Lt,
            "le" => Self::Le,
            _ => return Err(()),
        };

        Ok(kind)
    }
}

/// One overload of an operator on a named type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeOperator {
    pub kind: OperatorKind,
    /// The operands besides the owning type itself.
    pub operands: Vec<Type>,
    pub ret: Type,
}

impl TypeOperator {
    /// Builds an overload, comparisons always produce a boolean.
    pub fn new(kind: OperatorKind, operands: Vec<Type>, ret: Type) -> Self {
        let ret = if kind.is_comparison() { Type::Boolean } else { ret };

        Self { kind, operands, ret }
    }

    /// `[key]: value`
    pub fn index(key: Type, value: Type) -> Self {
        Self {
            kind: OperatorKind::Index,
            operands: vec![key],
            ret: value,
        }
    }

    /// Whether this overload applies to the given right hand side.
    ///
    /// Unary overloads take no operand, an overload without a declared
    /// operand accepts any.
    pub fn accepts(&self, operand: Option<&Type>) -> bool {
        match (self.operands.first(), operand) {
            (None, _) => true,
            (Some(_), None) => self.kind.is_unary(),
            (Some(Type::Any | Type::Unknown), Some(_)) => true,
            (Some(expected), Some(actual)) => {
                expected == actual
                    || matches!((expected, actual), (Type::Number, Type::Integer))
                    || matches!(expected, Type::Union(types) if types.contains(actual))
            }
        }
    }
}
