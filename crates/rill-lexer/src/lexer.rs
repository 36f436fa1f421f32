use rill_ast::Span;

use crate::token::{Token, TokenKind};

/// The lexer for Rill source text.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>,
    current_pos: usize,
    current_char: Option<char>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer from source code.
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.char_indices();
        let current_char = chars.next().map(|(_, c)| c);
        Self {
            source,
            chars,
            current_pos: 0,
            current_char,
        }
    }

    /// Tokenizes the entire source and returns all tokens, ending with
    /// `Eof`. Scan errors come back as `Error` tokens rather than aborting
    /// the stream.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Gets the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_blanks_and_comments();

        let start = self.current_pos;

        let ch = match self.current_char {
            None => return Token::new(TokenKind::Eof, "", Span::point(start)),
            Some(ch) => ch,
        };

        match ch {
            '\n' => {
                self.advance();
                Token::new(TokenKind::Newline, "\n", self.span_from(start))
            }
            ';' => {
                self.advance();
                Token::new(TokenKind::Newline, ";", self.span_from(start))
            }
            '"' => self.read_string(),
            '0'..='9' => self.read_number(),
            c if c.is_alphabetic() || c == '_' => self.read_ident_or_keyword(),
            '(' => self.single(TokenKind::LParen, "("),
            ')' => self.single(TokenKind::RParen, ")"),
            '{' => self.single(TokenKind::LBrace, "{"),
            '}' => self.single(TokenKind::RBrace, "}"),
            '[' => self.single(TokenKind::LBracket, "["),
            ']' => self.single(TokenKind::RBracket, "]"),
            ',' => self.single(TokenKind::Comma, ","),
            ':' => self.single(TokenKind::Colon, ":"),
            '.' => self.single(TokenKind::Dot, "."),
            '#' => self.read_builtin_line(),
            '&' => self.single(TokenKind::Amp, "&"),
            '+' => self.single(TokenKind::Plus, "+"),
            '*' => self.single(TokenKind::Star, "*"),
            '/' => self.single(TokenKind::Slash, "/"),
            '>' => self.single(TokenKind::Gt, ">"),
            '=' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::new(TokenKind::EqEq, "==", self.span_from(start))
                } else {
                    Token::new(TokenKind::Equals, "=", self.span_from(start))
                }
            }
            '<' => {
                self.advance();
                if self.current_char == Some('-') {
                    self.advance();
                    Token::new(TokenKind::RevArrow, "<-", self.span_from(start))
                } else {
                    Token::new(TokenKind::Lt, "<", self.span_from(start))
                }
            }
            '-' => {
                self.advance();
                if self.current_char == Some('>') {
                    self.advance();
                    Token::new(TokenKind::Arrow, "->", self.span_from(start))
                } else {
                    Token::new(TokenKind::Minus, "-", self.span_from(start))
                }
            }
            _ => {
                self.advance();
                Token::new(
                    TokenKind::Error,
                    format!("unexpected character '{}'", ch),
                    self.span_from(start),
                )
            }
        }
    }

    // Helper methods

    fn advance(&mut self) {
        if let Some((pos, ch)) = self.chars.next() {
            self.current_pos = pos;
            self.current_char = Some(ch);
        } else {
            self.current_pos = self.source.len();
            self.current_char = None;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next().map(|(_, c)| c)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.current_pos)
    }

    fn single(&mut self, kind: TokenKind, text: &str) -> Token {
        let start = self.current_pos;
        self.advance();
        Token::new(kind, text, self.span_from(start))
    }

    /// Skips spaces, tabs and `//` comments. Newlines are significant and
    /// stay in the stream.
    fn skip_blanks_and_comments(&mut self) {
        loop {
            match self.current_char {
                Some(ch) if ch.is_whitespace() && ch != '\n' => self.advance(),
                Some('/') if self.peek() == Some('/') => {
                    while let Some(ch) = self.current_char {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_ident_or_keyword(&mut self) -> Token {
        let start = self.current_pos;
        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.current_pos];
        let kind = TokenKind::keyword(text).unwrap_or(TokenKind::Ident);
        Token::new(kind, text, self.span_from(start))
    }

    fn read_number(&mut self) -> Token {
        let start = self.current_pos;
        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.current_pos];
        Token::new(TokenKind::Number, text, self.span_from(start))
    }

    /// A `#` introduces a builtin statement: the rest of the line is carried
    /// through the compiler untouched, so it is lexed as a single token.
    fn read_builtin_line(&mut self) -> Token {
        let start = self.current_pos;
        self.advance(); // '#'
        let text_start = self.current_pos;
        while let Some(ch) = self.current_char {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
        let text = self.source[text_start..self.current_pos].to_string();
        Token::new(TokenKind::Hash, text, self.span_from(start))
    }

    fn read_string(&mut self) -> Token {
        let start = self.current_pos;
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.current_char {
                None | Some('\n') => {
                    return Token::new(
                        TokenKind::Error,
                        "unterminated string literal",
                        self.span_from(start),
                    );
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.current_char {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some(other) => value.push(other),
                        None => continue,
                    }
                    self.advance();
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }
        Token::new(TokenKind::Str, value, self.span_from(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_and_idents() {
        assert_eq!(
            kinds("fn foo let var"),
            vec![
                TokenKind::Fn,
                TokenKind::Ident,
                TokenKind::Let,
                TokenKind::Var,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn arrows() {
        assert_eq!(
            kinds("-> <- < - =="),
            vec![
                TokenKind::Arrow,
                TokenKind::RevArrow,
                TokenKind::Lt,
                TokenKind::Minus,
                TokenKind::EqEq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn newline_and_semicolon_are_statement_ends() {
        assert_eq!(
            kinds("a\nb;c"),
            vec![
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            kinds("a // comment with fn let tokens\nb"),
            vec![
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_literal_with_escapes() {
        let tokens = Lexer::new(r#""hi\n\"there\"""#).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].text, "hi\n\"there\"");
    }

    #[test]
    fn unterminated_string_is_an_error_token() {
        let tokens = Lexer::new("\"oops\nfn").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Error);
        // The lexer recovers and keeps scanning the next line.
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Fn));
    }

    #[test]
    fn spans_cover_the_token_text() {
        let tokens = Lexer::new("let abc = 42").tokenize();
        let abc = &tokens[1];
        assert_eq!(abc.span, Span::new(4, 7));
        assert_eq!(abc.text, "abc");
    }
}
