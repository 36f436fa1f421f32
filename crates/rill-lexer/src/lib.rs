//! # Rill Lexer
//!
//! Hand-written scanner for Rill source text. The language is
//! newline-aware: newlines terminate statements, so the lexer emits them as
//! tokens instead of discarding them with the rest of the whitespace.

mod lexer;
mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind};
