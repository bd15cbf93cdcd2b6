//! # Lumen Semantic: Declarations, Scopes and References
//!
//! This crate builds the semantic model of Lua files annotated with
//! EmmyLua doc comments. Analysis of a change set runs in two phases.
//!
//! ### 1. Building
//!
//! Each file is walked once by the [`builder`]. The walk creates every
//! declaration the file makes (locals, parameters, globals, methods, doc
//! types and their members), the lexical [`scope`] tree that answers name
//! lookups, and the entries the file contributes to the project. Whatever
//! cannot be typed from annotations alone is queued as a task on the
//! file's [`worklist`]. Files are independent here and build in parallel.
//!
//! ### 2. Resolution
//!
//! Once every file of the set is published to the [`index`], the
//! [`resolver`] drains the worklists. Tasks run in dependency order, so a
//! value is typed after the declarations it mentions. Tasks on a cycle
//! resolve to `unknown`.
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │    Building     │───▶│  Project Index   │◀───│   Resolution    │
//! │                 │    │                  │    │                 │
//! │ • Declarations  │    │ • Globals, types │    │ • Order tasks   │
//! │ • Scope tree    │    │ • Members        │    │ • Type values   │
//! │ • Worklist      │    │ • Occurrences    │    │ • Link members  │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//!                                  ▲
//!                                  │
//!                        ┌──────────────────┐
//!                        │   References     │
//!                        └──────────────────┘
//! ```
//!
//! Queries go through [`lookup::Lookup`], which reads the index as it is at
//! the moment of the call. [`compilation::Compilation`] ties the phases
//! together for a set of registered sources.

pub mod builder;
pub mod compilation;
pub mod config;
pub mod decl;
pub mod error;
pub mod expr;
pub mod file;
pub mod index;
pub mod lookup;
pub mod references;
pub mod resolver;
pub mod scope;
pub mod worklist;

pub mod prelude {
    pub use crate::compilation::Compilation;
    pub use crate::config::AnalysisConfig;
    pub use crate::decl::{DeclKind, DeclRef, Declaration, MethodFeature, TypeCategory};
    pub use crate::file::DeclTree;
    pub use crate::index::{DeclHandle, Owner, ProjectIndex};
    pub use crate::lookup::Lookup;
    pub use crate::references::Reference;
}
