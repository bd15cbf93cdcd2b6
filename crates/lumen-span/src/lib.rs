//! Positions in the files of a project.
//!
//! A [`Span`] is a byte range of one file, a [`Loc`] pairs it with the
//! [`SourceId`] the [`SourceMap`] handed out for that file.

mod error;
mod loc;
mod source;
mod span;

pub use error::SourceError;
pub use loc::Loc;
pub use source::{SourceId, SourceMap};
pub use span::Span;
