//! Lifetimes
//!
//! A lifetime is either *exact* (bound to the scope of a specific
//! declaration) or *annotated* (a user-written tag from a function
//! signature). Lifetimes live in the context's arena; the scoped lifetime
//! table holds the ids of the ones alive at the current program point, so
//! "is this lifetime still alive" is a table lookup.

use rill_ast::{DeclId, Name};

/// Index of a lifetime in the analysis context's lifetime arena. Two
/// lifetimes are the same lifetime iff their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LifetimeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// The lifetime of `decl`, alive for the duration of its enclosing
    /// scope.
    Exact { decl: DeclId },
    /// A named lifetime declared by a function signature, e.g. `.a`.
    Annotated { annot: Name },
}

impl Lifetime {
    pub fn decl(&self) -> Option<DeclId> {
        match self {
            Lifetime::Exact { decl } => Some(*decl),
            Lifetime::Annotated { .. } => None,
        }
    }

    pub fn annot(&self) -> Option<Name> {
        match self {
            Lifetime::Annotated { annot } => Some(*annot),
            Lifetime::Exact { .. } => None,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Lifetime::Exact { .. })
    }
}
