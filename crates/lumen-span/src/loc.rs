use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Span, source::SourceId};

/// A span tagged with the file it belongs to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Loc {
    pub source: SourceId,
    pub span: Span,
}

impl fmt::Debug for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { source, span } = self;
        write!(f, "{span} in {source}")
    }
}

impl Loc {
    pub fn new(source: SourceId, span: Span) -> Self {
        Self { source, span }
    }

    pub fn source(self) -> SourceId {
        self.source
    }

    pub fn span(self) -> Span {
        self.span
    }

    /// Start offset, the ordering key for declarations and occurrences.
    pub fn start(self) -> usize {
        self.span.start
    }

    pub fn contains(self, other: Self) -> bool {
        self.source == other.source && self.span.contains(&other.span)
    }
}
