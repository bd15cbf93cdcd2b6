//! Typing of expressions.
//!
//! Expression types are computed on demand from the declarations the
//! resolver has typed so far. Anything not yet known is `unknown`.

use lumen_tree::{
    node::{BinaryOp, Expr, IndexKey, Literal, UnaryOp},
    prelude::*,
};
use lumen_types::{OperatorKind, Type};

use crate::{decl::returns_to_type, file::DeclTree, lookup::Lookup};

impl Lookup<'_> {
    /// The type of the `slot`-th value `expr` produces.
    ///
    /// Only calls produce more than one value, every other expression is
    /// `nil` past its first slot. A vararg expression is always `unknown`.
    pub fn expr_type(&self, tree: &DeclTree, expr: Expr, slot: usize) -> Type {
        let syntax = tree.syntax();

        match expr {
            Expr::VarArg(_) => Type::Unknown,
            Expr::Call(call) => self.call_type(tree, call).slot(slot),
            _ if slot > 0 => Type::Nil,
            Expr::Literal(literal) => literal_type(&syntax.node(literal).0),
            Expr::Name(name) => self
                .declaration(tree, name.erase())
                .and_then(|decl| self.index.decl(decl))
                .map(|decl| decl.ty_or_unknown())
                .unwrap_or_default(),
            Expr::Paren(paren) => syntax
                .node(paren)
                .inner
                .map(|inner| self.expr_type(tree, inner, 0))
                .unwrap_or_default(),
            Expr::Table(table) => Type::TableLiteral(syntax.syntax_id(table)),
            Expr::Closure(closure) => Type::Method(syntax.syntax_id(closure)),
            Expr::Index(index) => self.index_type(tree, index),
            Expr::Binary(binary) => self.binary_type(tree, binary),
            Expr::Unary(unary) => self.unary_type(tree, unary),
        }
    }

    /// The value of a call, a tuple when it returns several.
    pub(crate) fn call_type(&self, tree: &DeclTree, call: Id<node::CallExpr>) -> Type {
        let Some(prefix) = tree.syntax().node(call).prefix else {
            return Type::Unknown;
        };

        match self.expr_type(tree, prefix, 0) {
            Type::Method(closure) => {
                let returns = |tree: &DeclTree| tree.method(closure.node()).map(|method| method.return_type());

                let ty = if closure.source == tree.source() {
                    returns(tree)
                } else {
                    self.index
                        .decl_tree(closure.source)
                        .and_then(|tree| returns(tree.as_ref()))
                };
                ty.unwrap_or_default()
            }
            Type::Signature(sig) => returns_to_type(&sig.returns),
            _ => Type::Unknown,
        }
    }

    fn index_type(&self, tree: &DeclTree, index: Id<node::IndexExpr>) -> Type {
        if let Some(member) = self.index_member(tree, index) {
            return self
                .index
                .decl(member)
                .map(|decl| decl.ty_or_unknown())
                .unwrap_or_default();
        }

        let node = tree.syntax().node(index);
        let Some(prefix) = node.prefix else {
            return Type::Unknown;
        };

        let key = match node.key {
            Some(IndexKey::Name(_)) => Type::String,
            Some(IndexKey::Expr(key)) => self.expr_type(tree, key, 0),
            None => Type::Unknown,
        };

        match self.expr_type(tree, prefix, 0) {
            Type::Array(elem) => *elem,
            Type::GenericApp { name, args } if name == "table" => args.last().cloned().unwrap_or_default(),
            ty => self
                .operator(&ty, OperatorKind::Index, Some(&key))
                .unwrap_or_default(),
        }
    }

    fn binary_type(&self, tree: &DeclTree, binary: Id<node::BinaryExpr>) -> Type {
        let node = tree.syntax().node(binary);
        let operand = |expr: Option<Expr>| {
            expr.map(|expr| self.expr_type(tree, expr, 0))
                .unwrap_or_default()
        };

        let lhs = operand(node.lhs);
        let rhs = operand(node.rhs);

        let Some(kind) = OperatorKind::from_binary(node.op) else {
            return match node.op {
                BinaryOp::And => rhs,
                _ => lhs.union(rhs),
            };
        };

        if kind.is_comparison() {
            return Type::Boolean;
        }

        if let Some(ret) = self.operator(&lhs, kind, Some(&rhs)) {
            return ret;
        }

        match kind {
            OperatorKind::Concat => Type::String,
            OperatorKind::BAnd
            | OperatorKind::BOr
            | OperatorKind::BXor
            | OperatorKind::Shl
            | OperatorKind::Shr => Type::Integer,
            OperatorKind::Div | OperatorKind::Pow if lhs.is_numeric() && rhs.is_numeric() => Type::Number,
            _ if lhs == Type::Integer && rhs == Type::Integer => Type::Integer,
            _ if lhs.is_numeric() && rhs.is_numeric() => Type::Number,
            _ => Type::Unknown,
        }
    }

    fn unary_type(&self, tree: &DeclTree, unary: Id<node::UnaryExpr>) -> Type {
        let node = tree.syntax().node(unary);
        let operand = node
            .operand
            .map(|expr| self.expr_type(tree, expr, 0))
            .unwrap_or_default();

        let Some(kind) = OperatorKind::from_unary(node.op) else {
            return Type::Boolean;
        };

        if let Some(ret) = self.operator(&operand, kind, None) {
            return ret;
        }

        match node.op {
            UnaryOp::Neg if operand.is_numeric() => operand,
            UnaryOp::Len | UnaryOp::BNot => Type::Integer,
            _ => Type::Unknown,
        }
    }

    /// The result of the first overload of `kind` on `ty` that takes `operand`.
    fn operator(&self, ty: &Type, kind: OperatorKind, operand: Option<&Type>) -> Option<Type> {
        self.owners_of_type(ty)
            .iter()
            .flat_map(|owner| self.index.operators(owner))
            .find(|op| op.kind == kind && op.accepts(operand))
            .map(|op| op.ret)
    }
}

fn literal_type(literal: &Literal) -> Type {
    match literal {
        Literal::Nil => Type::Nil,
        Literal::Bool(_) => Type::Boolean,
        Literal::Integer(_) => Type::Integer,
        Literal::Number(_) => Type::Number,
        Literal::String(_) => Type::String,
    }
}
