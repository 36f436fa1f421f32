//! Top-level file structure

use super::*;

/// A parsed source file: the list of top-level items.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct File {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Func(FuncDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    /// `extern fn` header; the wrapped function has no body.
    Extern(FuncDecl),
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Func(f) | Item::Extern(f) => f.span,
            Item::Struct(s) => s.span,
            Item::Enum(e) => e.span,
        }
    }
}
