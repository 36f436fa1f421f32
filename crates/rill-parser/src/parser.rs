//! Core parser struct, token cursor helpers and top-level parsing

use rill_ast::{File, Item, Name, NameTable, Span};
use rill_lexer::{Token, TokenKind};

use crate::error::{ParseError, ParseResult};

/// Recursive descent parser for Rill.
pub struct Parser<'a> {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    pub(crate) names: &'a mut NameTable,
}

impl<'a> Parser<'a> {
    /// Creates a new parser from a token stream. Identifiers are interned
    /// into `names`, which the later passes share.
    pub fn new(tokens: Vec<Token>, names: &'a mut NameTable) -> Self {
        Self {
            tokens,
            pos: 0,
            names,
        }
    }

    /// Parses a complete file of top-level items.
    pub fn parse_file(mut self) -> Result<File, Vec<ParseError>> {
        let mut items = Vec::new();
        let mut errors = Vec::new();

        self.skip_newlines();
        while !self.at_end() {
            match self.parse_item() {
                Ok(item) => items.push(item),
                Err(err) => {
                    errors.push(err);
                    self.synchronize();
                }
            }
            self.skip_newlines();
        }

        if errors.is_empty() {
            Ok(File { items })
        } else {
            Err(errors)
        }
    }

    pub(crate) fn parse_item(&mut self) -> ParseResult<Item> {
        match self.kind() {
            TokenKind::Fn => Ok(Item::Func(self.parse_func_decl()?)),
            TokenKind::Struct => Ok(Item::Struct(self.parse_struct_decl()?)),
            TokenKind::Enum => Ok(Item::Enum(self.parse_enum_decl()?)),
            TokenKind::Extern => Ok(Item::Extern(self.parse_extern_decl()?)),
            _ => Err(self.error_here(format!(
                "unexpected '{}' at toplevel",
                self.current().text
            ))),
        }
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Kind of the token `n` positions ahead, skipping nothing.
    pub(crate) fn peek_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    pub(crate) fn at_end(&self) -> bool {
        self.kind() == TokenKind::Eof
    }

    pub(crate) fn advance(&mut self) -> &Token {
        let token = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    /// Consumes the current token if it has the expected kind, errors
    /// without making progress otherwise.
    pub(crate) fn consume(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.kind() == kind {
            let token = self.current().clone();
            self.advance();
            Ok(token)
        } else {
            Err(self.error_here(format!(
                "expected {}, found '{}'",
                describe(kind),
                self.current().text
            )))
        }
    }

    /// Interns the current token's text and consumes it. The token must be
    /// an identifier.
    pub(crate) fn parse_name(&mut self) -> ParseResult<Name> {
        if self.kind() != TokenKind::Ident {
            return Err(self.error_here(format!(
                "expected an identifier, found '{}'",
                self.current().text
            )));
        }
        let text = self.current().text.clone();
        let name = self.names.intern(&text);
        self.advance();
        Ok(name)
    }

    pub(crate) fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.current().span)
    }

    // =========================================================================
    // Statement termination
    // =========================================================================

    /// The language is newline-aware: newlines (and `;`) end statements, but
    /// a closing brace or the end of input also ends the last statement of a
    /// block.
    pub(crate) fn at_stmt_end(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Newline | TokenKind::RBrace | TokenKind::Eof
        )
    }

    pub(crate) fn expect_stmt_end(&mut self) -> ParseResult<()> {
        match self.kind() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ => Err(self.error_here(format!(
                "expected end of statement, found '{}'",
                self.current().text
            ))),
        }
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Recovery after a parse error: skip the rest of the line.
    pub(crate) fn synchronize(&mut self) {
        while !self.at_end() && !self.check(TokenKind::Newline) {
            self.advance();
        }
        self.skip_newlines();
    }

    // =========================================================================
    // Separated lists
    // =========================================================================

    /// Parses a comma separated list of elements, also accepting newlines as
    /// separators and allowing a trailing comma. Stops in front of `)` or
    /// `}`. Used for parameter lists, struct fields and literal designators.
    pub(crate) fn parse_comma_separated<T>(
        &mut self,
        mut parse_fn: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        let mut list = Vec::new();

        loop {
            self.skip_newlines();
            if matches!(
                self.kind(),
                TokenKind::RParen | TokenKind::RBrace | TokenKind::Eof
            ) {
                break;
            }

            list.push(parse_fn(self)?);

            match self.kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::Newline | TokenKind::RParen | TokenKind::RBrace => {}
                _ => {
                    return Err(self.error_here(format!(
                        "trailing token '{}' after declaration",
                        self.current().text
                    )));
                }
            }
        }

        Ok(list)
    }

    pub(crate) fn span_from(&self, start: Span) -> Span {
        let prev = self
            .tokens
            .get(self.pos.saturating_sub(1))
            .map(|t| t.span)
            .unwrap_or(start);
        start.merge(&prev)
    }
}

fn describe(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Fn => "'fn'",
        TokenKind::Let => "'let'",
        TokenKind::Var => "'var'",
        TokenKind::Struct => "'struct'",
        TokenKind::Enum => "'enum'",
        TokenKind::Extern => "'extern'",
        TokenKind::Return => "'return'",
        TokenKind::If => "'if'",
        TokenKind::Else => "'else'",
        TokenKind::Ident => "an identifier",
        TokenKind::Number => "a number",
        TokenKind::Str => "a string",
        TokenKind::LParen => "'('",
        TokenKind::RParen => "')'",
        TokenKind::LBrace => "'{'",
        TokenKind::RBrace => "'}'",
        TokenKind::LBracket => "'['",
        TokenKind::RBracket => "']'",
        TokenKind::Comma => "','",
        TokenKind::Colon => "':'",
        TokenKind::Dot => "'.'",
        TokenKind::Hash => "'#'",
        TokenKind::Equals => "'='",
        TokenKind::EqEq => "'=='",
        TokenKind::Lt => "'<'",
        TokenKind::Gt => "'>'",
        TokenKind::Plus => "'+'",
        TokenKind::Minus => "'-'",
        TokenKind::Star => "'*'",
        TokenKind::Slash => "'/'",
        TokenKind::Amp => "'&'",
        TokenKind::Arrow => "'->'",
        TokenKind::RevArrow => "'<-'",
        TokenKind::Newline => "end of statement",
        TokenKind::Error => "an error",
        TokenKind::Eof => "end of input",
    }
}
