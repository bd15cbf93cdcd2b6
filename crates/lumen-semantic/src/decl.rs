use std::{fmt, sync::OnceLock};

use derive_more::Display;
use lumen_span::{Loc, SourceId};
use lumen_tree::prelude::*;
use lumen_types::{Signature, Type};
use lumen_utils::define_id;
use serde::{Deserialize, Serialize};

define_id!(DeclId);

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodFeature {
    #[display("local")]
    Local,
    #[display("global")]
    Global,
    #[display("field")]
    Field,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeCategory {
    #[display("class")]
    Class,
    #[display("interface")]
    Interface,
    #[display("enum")]
    Enum,
    #[display("alias")]
    Alias,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    #[display("local")]
    Local,
    #[display("parameter")]
    Parameter,
    #[display("doc parameter")]
    DocParameter,
    #[display("global")]
    Global,
    #[display("{feature} method")]
    Method {
        feature: MethodFeature,
        closure: Id<node::ClosureExpr>,
    },
    #[display("{_0}")]
    NamedType(TypeCategory),
    #[display("enum field")]
    EnumField,
    #[display("doc field")]
    DocField,
    #[display("table field")]
    TableField,
    #[display("label")]
    Label,
    #[display("generic parameter")]
    GenericParameter,
    #[display("index")]
    Index,
}

impl DeclKind {
    /// Whether a name expression can refer to a declaration of this kind.
    pub fn is_value(self) -> bool {
        matches!(
            self,
            Self::Local
                | Self::Parameter
                | Self::Global
                | Self::Method {
                    feature: MethodFeature::Local | MethodFeature::Global,
                    ..
                }
        )
    }

    /// Whether this kind is one half of a field declared twice, once in an
    /// annotation and once in a table constructor.
    pub fn is_field(self) -> bool {
        matches!(self, Self::DocField | Self::TableField)
    }

    /// Order in which members of the same name win during member lookup.
    pub fn member_rank(self) -> u8 {
        match self {
            Self::DocField => 0,
            Self::EnumField => 1,
            Self::Method { .. } => 2,
            Self::TableField => 3,
            Self::Index => 4,
            _ => 5,
        }
    }
}

/// A named binding produced by the declaration builder.
///
/// Everything but the type is fixed at creation. The type is either given
/// by an annotation up front or filled in once by the resolver.
#[derive(Debug)]
pub struct Declaration {
    pub name: Symbol,
    pub kind: DeclKind,
    /// The syntax that defines the binding.
    pub node: NodeId,
    /// Location of the name token, or of `node` when there is none.
    pub loc: Loc,
    ty: OnceLock<Type>,
}

impl Declaration {
    pub fn new(name: impl Into<Symbol>, kind: DeclKind, node: NodeId, loc: Loc) -> Self {
        Self {
            name: name.into(),
            kind,
            node,
            loc,
            ty: OnceLock::new(),
        }
    }

    pub fn with_type(self, ty: Option<Type>) -> Self {
        if let Some(ty) = ty {
            let _ = self.ty.set(ty);
        }
        self
    }

    pub fn position(&self) -> usize {
        self.loc.start()
    }

    pub fn ty(&self) -> Option<&Type> {
        self.ty.get()
    }

    /// The resolved type, `unknown` while it is not determined.
    pub fn ty_or_unknown(&self) -> Type {
        self.ty.get().cloned().unwrap_or_default()
    }

    /// Sets the type unless one is already present, returns whether it was set.
    pub fn set_ty(&self, ty: Type) -> bool {
        self.ty.set(ty).is_ok()
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}` at {}", self.kind, self.name, self.loc)?;

        if let Some(ty) = self.ty.get() {
            write!(f, ": {ty}")?;
        }

        Ok(())
    }
}

/// Project wide identity of a declaration.
///
/// The generation changes whenever the file is rebuilt, so references into
/// a replaced analysis stop resolving instead of pointing at an unrelated
/// declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeclRef {
    pub source: SourceId,
    pub generation: u32,
    pub decl: DeclId,
}

impl fmt::Display for DeclRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}#{}", self.source, self.generation, self.decl)
    }
}

/// The signature of one closure.
#[derive(Debug)]
pub struct MethodInfo {
    pub closure: Id<node::ClosureExpr>,
    pub params: Vec<DeclId>,
    pub overloads: Vec<Signature>,
    /// Return types written with `@return`.
    pub declared: Vec<Type>,
    inferred: OnceLock<Vec<Type>>,
}

impl MethodInfo {
    pub fn new(
        closure: Id<node::ClosureExpr>,
        params: Vec<DeclId>,
        overloads: Vec<Signature>,
        declared: Vec<Type>,
    ) -> Self {
        Self {
            closure,
            params,
            overloads,
            declared,
            inferred: OnceLock::new(),
        }
    }

    pub fn has_declared_returns(&self) -> bool {
        !self.declared.is_empty()
    }

    /// The return types, `None` while nothing is declared and nothing has
    /// been inferred yet.
    pub fn returns(&self) -> Option<&[Type]> {
        if self.has_declared_returns() {
            return Some(&self.declared);
        }

        self.inferred.get().map(Vec::as_slice)
    }

    pub fn set_inferred(&self, returns: Vec<Type>) -> bool {
        self.inferred.set(returns).is_ok()
    }

    /// The return types as a single value, several results form a tuple.
    /// Unknown until the returns are declared or inferred.
    pub fn return_type(&self) -> Type {
        self.returns().map_or(Type::Unknown, returns_to_type)
    }
}

pub(crate) fn returns_to_type(returns: &[Type]) -> Type {
    match returns {
        [] => Type::Nil,
        [single] => single.clone(),
        many => Type::Tuple(many.to_vec()),
    }
}
