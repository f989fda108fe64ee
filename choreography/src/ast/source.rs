//! Source positions carried by protocol nodes for diagnostics

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};

/// Line and column of a node in the original protocol text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

/// Opaque position token attached to every type node.
///
/// Sources are for diagnostics only: two sources always compare equal and
/// hash identically, so structural equality of types ignores positions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Source(Option<Span>);

impl Source {
    /// A node with no known position (e.g. synthesised by a pass)
    pub const NONE: Source = Source(None);

    /// A node originating at `line:column`
    pub fn at(line: u32, column: u32) -> Self {
        Source(Some(Span { line, column }))
    }

    /// The position, if known
    pub fn span(&self) -> Option<Span> {
        self.0
    }
}

impl PartialEq for Source {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl Eq for Source {}

impl Hash for Source {
    fn hash<H: Hasher>(&self, _: &mut H) {}
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(Span { line, column }) => write!(f, "{line}:{column}"),
            None => write!(f, "<synthetic>"),
        }
    }
}
