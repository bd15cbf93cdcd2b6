//! Nodes of documentation comments.
//!
//! A [`Comment`] holds the tags written in the `---@` lines directly above a
//! statement. Type annotations are [`DocType`]s; a [`DocNameType`] is the
//! occurrence of a type name and is what type references point at.

use derive_more::{Display, From};
use enum_as_inner::EnumAsInner;

use super::{Name, Symbol};
use crate::{
    id::{Id, NodeId},
    tree::TreeBuilder,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub tags: Vec<DocTag>,
}

impl Comment {
    pub fn new_in(tags: Vec<DocTag>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { tags })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, EnumAsInner)]
pub enum DocTag {
    Class(Id<DocClass>),
    Enum(Id<DocEnum>),
    Alias(Id<DocAlias>),
    Field(Id<DocField>),
    Type(Id<DocTypeTag>),
    Param(Id<DocParam>),
    Return(Id<DocReturn>),
    Generic(Id<DocGeneric>),
    Overload(Id<DocOverload>),
    Operator(Id<DocOperator>),
}

impl DocTag {
    pub fn erase(self) -> NodeId {
        match self {
            Self::Class(id) => id.erase(),
            Self::Enum(id) => id.erase(),
            Self::Alias(id) => id.erase(),
            Self::Field(id) => id.erase(),
            Self::Type(id) => id.erase(),
            Self::Param(id) => id.erase(),
            Self::Return(id) => id.erase(),
            Self::Generic(id) => id.erase(),
            Self::Overload(id) => id.erase(),
            Self::Operator(id) => id.erase(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ClassKind {
    #[display("class")]
    Class,
    #[display("interface")]
    Interface,
}

/// `---@class Name<T>: Super1, Super2 { field: T }`, also used for `---@interface`.
#[derive(Debug, Clone, PartialEq)]
pub struct DocClass {
    pub kind: ClassKind,
    pub name: Option<Id<Name>>,
    pub generics: Option<Id<DocGeneric>>,
    pub supers: Vec<DocType>,
    pub body: Option<Id<DocBody>>,
}

impl DocClass {
    pub fn new_in(
        kind: ClassKind,
        name: Option<Id<Name>>,
        generics: Option<Id<DocGeneric>>,
        supers: Vec<DocType>,
        body: Option<Id<DocBody>>,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self {
            kind,
            name,
            generics,
            supers,
            body,
        })
    }
}

/// `---@enum Name: base`, every field is a bare name.
#[derive(Debug, Clone, PartialEq)]
pub struct DocEnum {
    pub name: Option<Id<Name>>,
    pub base: Option<DocType>,
    pub fields: Vec<Id<Name>>,
}

impl DocEnum {
    pub fn new_in(
        name: Option<Id<Name>>,
        base: Option<DocType>,
        fields: Vec<Id<Name>>,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { name, base, fields })
    }
}

/// `---@alias Name type`
#[derive(Debug, Clone, PartialEq)]
pub struct DocAlias {
    pub name: Option<Id<Name>>,
    pub ty: Option<DocType>,
}

impl DocAlias {
    pub fn new_in(name: Option<Id<Name>>, ty: Option<DocType>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { name, ty })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From)]
pub enum DocFieldKey {
    /// `---@field name type`
    Name(Id<Name>),
    /// `---@field ["name"] type`
    #[from(skip)]
    String(Id<Name>),
    /// `---@field [1] type`
    Integer(i64),
    /// `---@field [string] type`, an index signature
    Type(DocType),
}

impl DocFieldKey {
    pub(crate) fn children(&self, out: &mut Vec<NodeId>) {
        match self {
            Self::Name(id) | Self::String(id) => out.push(id.erase()),
            Self::Integer(_) => {}
            Self::Type(ty) => out.push(ty.erase()),
        }
    }
}

/// A field of a class, of a class body, or of a table type annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct DocField {
    pub key: Option<DocFieldKey>,
    pub ty: Option<DocType>,
    pub nullable: bool,
}

impl DocField {
    pub fn new_in(
        key: Option<DocFieldKey>,
        ty: Option<DocType>,
        nullable: bool,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { key, ty, nullable })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocBody {
    pub fields: Vec<Id<DocField>>,
}

impl DocBody {
    pub fn new_in(fields: Vec<Id<DocField>>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { fields })
    }
}

/// `---@type A, B`
#[derive(Debug, Clone, PartialEq)]
pub struct DocTypeTag {
    pub types: Vec<DocType>,
}

impl DocTypeTag {
    pub fn new_in(types: Vec<DocType>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { types })
    }
}

/// `---@param name? type`, a variadic parameter is spelled `...`.
#[derive(Debug, Clone, PartialEq)]
pub struct DocParam {
    pub name: Option<Id<Name>>,
    pub ty: Option<DocType>,
    pub nullable: bool,
}

impl DocParam {
    pub fn new_in(
        name: Option<Id<Name>>,
        ty: Option<DocType>,
        nullable: bool,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { name, ty, nullable })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocReturn {
    pub types: Vec<DocType>,
}

impl DocReturn {
    pub fn new_in(types: Vec<DocType>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { types })
    }
}

/// `---@generic T, U: Base`, also the parameter list of a generic class.
#[derive(Debug, Clone, PartialEq)]
pub struct DocGeneric {
    pub params: Vec<Id<DocGenericParam>>,
}

impl DocGeneric {
    pub fn new_in(params: Vec<Id<DocGenericParam>>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { params })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocGenericParam {
    pub name: Option<Id<Name>>,
    pub constraint: Option<DocType>,
}

impl DocGenericParam {
    pub fn new_in(
        name: Option<Id<Name>>,
        constraint: Option<DocType>,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { name, constraint })
    }
}

/// `---@overload fun(a: integer): string`
#[derive(Debug, Clone, PartialEq)]
pub struct DocOverload {
    pub ty: Option<DocType>,
}

impl DocOverload {
    pub fn new_in(ty: Option<DocType>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { ty })
    }
}

/// `---@operator add(Other): Result`
#[derive(Debug, Clone, PartialEq)]
pub struct DocOperator {
    pub op: Option<Id<Name>>,
    pub operands: Vec<DocType>,
    pub ret: Option<DocType>,
}

impl DocOperator {
    pub fn new_in(
        op: Option<Id<Name>>,
        operands: Vec<DocType>,
        ret: Option<DocType>,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { op, operands, ret })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, EnumAsInner)]
pub enum DocType {
    Name(Id<DocNameType>),
    Array(Id<DocArrayType>),
    Union(Id<DocUnionType>),
    Func(Id<DocFuncType>),
    Table(Id<DocTableType>),
    Generic(Id<DocGenericType>),
}

impl DocType {
    pub fn erase(self) -> NodeId {
        match self {
            Self::Name(id) => id.erase(),
            Self::Array(id) => id.erase(),
            Self::Union(id) => id.erase(),
            Self::Func(id) => id.erase(),
            Self::Table(id) => id.erase(),
            Self::Generic(id) => id.erase(),
        }
    }
}

/// A type named by an identifier, the unit of type references.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocNameType {
    pub name: Symbol,
}

impl DocNameType {
    pub fn new_in(name: impl Into<Symbol>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { name: name.into() })
    }
}

/// `T[]`
#[derive(Debug, Clone, PartialEq)]
pub struct DocArrayType {
    pub elem: Option<DocType>,
}

impl DocArrayType {
    pub fn new_in(elem: Option<DocType>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { elem })
    }
}

/// `A | B`
#[derive(Debug, Clone, PartialEq)]
pub struct DocUnionType {
    pub types: Vec<DocType>,
}

impl DocUnionType {
    pub fn new_in(types: Vec<DocType>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { types })
    }
}

/// `fun(a: A, b?: B): R1, R2`
#[derive(Debug, Clone, PartialEq)]
pub struct DocFuncType {
    pub params: Vec<Id<DocFuncParam>>,
    pub returns: Vec<DocType>,
}

impl DocFuncType {
    pub fn new_in(
        params: Vec<Id<DocFuncParam>>,
        returns: Vec<DocType>,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { params, returns })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocFuncParam {
    pub name: Option<Id<Name>>,
    pub ty: Option<DocType>,
    pub nullable: bool,
}

impl DocFuncParam {
    pub fn new_in(
        name: Option<Id<Name>>,
        ty: Option<DocType>,
        nullable: bool,
        builder: &mut TreeBuilder,
    ) -> Id<Self> {
        builder.insert(Self { name, ty, nullable })
    }
}

/// `{ x: number, [string]: any }`
#[derive(Debug, Clone, PartialEq)]
pub struct DocTableType {
    pub fields: Vec<Id<DocField>>,
}

impl DocTableType {
    pub fn new_in(fields: Vec<Id<DocField>>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { fields })
    }
}

/// `Name<A, B>`
#[derive(Debug, Clone, PartialEq)]
pub struct DocGenericType {
    pub name: Id<DocNameType>,
    pub args: Vec<DocType>,
}

impl DocGenericType {
    pub fn new_in(name: Id<DocNameType>, args: Vec<DocType>, builder: &mut TreeBuilder) -> Id<Self> {
        builder.insert(Self { name, args })
    }
}
