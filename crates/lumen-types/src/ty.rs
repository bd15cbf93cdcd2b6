use std::{fmt, sync::Arc};

use lumen_tree::{id::SyntaxId, node::Symbol};
use serde::{Deserialize, Serialize};

/// A semantic type value.
///
/// `Unknown` is the sentinel for anything that could not be determined, it
/// is never an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Type {
    #[default]
    Unknown,
    Nil,
    Any,
    Boolean,
    Integer,
    Number,
    String,
    Table,
    /// The builtin `function` without a known signature.
    Function,
    /// A class, interface, enum, alias or generic parameter, by name.
    Named(Symbol),
    Array(Box<Type>),
    Union(Vec<Type>),
    /// Several values, as produced by a call with multiple results.
    Tuple(Vec<Type>),
    /// `fun(...)` written in an annotation.
    Signature(Arc<Signature>),
    /// The closure with this identity.
    Method(SyntaxId),
    /// A table constructor or table type annotation with this identity.
    TableLiteral(SyntaxId),
    GenericApp { name: Symbol, args: Vec<Type> },
}

impl Type {
    pub fn named(name: impl Into<Symbol>) -> Self {
        Self::Named(name.into())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Number)
    }

    /// Joins two types into a flat union without duplicates.
    ///
    /// Unknown is absorbed by any other type.
    pub fn union(self, other: Type) -> Type {
        let mut types = Vec::new();

        for ty in [self, other] {
            match ty {
                Type::Unknown => {}
                Type::Union(inner) => types.extend(inner),
                ty => types.push(ty),
            }
        }

        let mut flat: Vec<Type> = Vec::with_capacity(types.len());
        for ty in types {
            if !flat.contains(&ty) {
                flat.push(ty);
            }
        }

        match flat.len() {
            0 => Type::Unknown,
            1 => flat.pop().unwrap_or_default(),
            _ => Type::Union(flat),
        }
    }

    pub fn nullable(self) -> Type {
        self.union(Type::Nil)
    }

    /// The type of the `slot`-th value when this type is spread over
    /// several targets.
    ///
    /// A value of undetermined arity stays undetermined in every slot.
    pub fn slot(&self, slot: usize) -> Type {
        match self {
            Type::Unknown | Type::Any => self.clone(),
            Type::Tuple(types) => types.get(slot).cloned().unwrap_or(Type::Nil),
            ty if slot == 0 => ty.clone(),
            _ => Type::Nil,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => write!(f, "unknown"),
            Type::Nil => write!(f, "nil"),
            Type::Any => write!(f, "any"),
            Type::Boolean => write!(f, "boolean"),
            Type::Integer => write!(f, "integer"),
            Type::Number => write!(f, "number"),
            Type::String => write!(f, "string"),
            Type::Table => write!(f, "table"),
            Type::Function => write!(f, "function"),
            Type::Named(name) => write!(f, "{name}"),
            Type::Array(elem) => write!(f, "{elem}[]"),
            Type::Union(types) => write_list(f, types, " | "),
            Type::Tuple(types) => {
                write!(f, "(")?;
                write_list(f, types, ", ")?;
                write!(f, ")")
            }
            Type::Signature(sig) => write!(f, "{sig}"),
            Type::Method(id) => write!(f, "function{id}"),
            Type::TableLiteral(id) => write!(f, "table{id}"),
            Type::GenericApp { name, args } => {
                write!(f, "{name}<")?;
                write_list(f, args, ", ")?;
                write!(f, ">")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type], sep: &str) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Param {
    pub name: Symbol,
    pub ty: Type,
}

impl Param {
    pub fn new(name: impl Into<Symbol>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Param>,
    pub returns: Vec<Type>,
}

impl Signature {
    pub fn new(params: Vec<Param>, returns: Vec<Type>) -> Self {
        Self { params, returns }
    }

    /// Whether the last parameter is `...`.
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|param| param.name == "...")
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fun(")?;
        for (i, Param { name, ty }) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {ty}")?;
        }
        write!(f, ")")?;

        if !self.returns.is_empty() {
            write!(f, ": ")?;
            write_list(f, &self.returns, ", ")?;
        }

        Ok(())
    }
}
