//! # Rill Parser
//!
//! Recursive descent parser producing the `rill-ast` tree. Statements are
//! newline (or `;`) terminated. Parse errors are collected rather than
//! aborting at the first one; recovery skips to the next line.

mod decl;
mod error;
mod expr;
mod parser;
mod stmt;
mod types;

pub use error::{ParseError, ParseResult};
pub use parser::Parser;

use rill_ast::{File, NameTable};
use rill_lexer::Token;

/// Parses a token stream into a file, interning identifiers into `names`.
pub fn parse(tokens: Vec<Token>, names: &mut NameTable) -> Result<File, Vec<ParseError>> {
    Parser::new(tokens, names).parse_file()
}
