use rill_ast::Span;

/// The different kinds of tokens in Rill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Fn,
    Let,
    Var,
    Struct,
    Enum,
    Extern,
    Return,
    If,
    Else,

    // Literals and identifiers
    Ident,
    Number,
    Str,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Dot,
    Hash,
    Equals,
    EqEq,
    Lt,
    Gt,
    Plus,
    Minus,
    Star,
    Slash,
    Amp,
    /// `->`
    Arrow,
    /// `<-`, the move assignment operator.
    RevArrow,

    /// End of statement. Emitted for a newline and for `;`.
    Newline,

    Error,
    Eof,
}

impl TokenKind {
    /// Maps an identifier spelling to its keyword kind, if any.
    pub fn keyword(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "fn" => TokenKind::Fn,
            "let" => TokenKind::Let,
            "var" => TokenKind::Var,
            "struct" => TokenKind::Struct,
            "enum" => TokenKind::Enum,
            "extern" => TokenKind::Extern,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            _ => return None,
        };
        Some(kind)
    }
}

/// A single token: its kind, the textual slice it covers, and its byte span
/// in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}
