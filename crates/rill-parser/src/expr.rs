//! Expression parsing

use rill_ast::{BinaryOp, Expr, ExprKind, FieldInit, UnaryOp};
use rill_lexer::TokenKind;

use crate::error::ParseResult;
use crate::parser::Parser;

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Gt => BinaryOp::Gt,
        _ => return None,
    };
    Some(op)
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self) -> ParseResult<Expr> {
        let unary = self.parse_unary_expr()?;
        let binary = self.parse_binary_expr_rhs(unary, 0)?;
        self.parse_member_expr_maybe(binary)
    }

    pub(crate) fn parse_unary_expr(&mut self) -> ParseResult<Expr> {
        let start = self.current().span;

        match self.kind() {
            TokenKind::Number => {
                let text = self.current().text.clone();
                let value: i64 = text
                    .parse()
                    .map_err(|_| self.error_here("integer literal too large"))?;
                self.advance();
                Ok(Expr::new(ExprKind::IntegerLiteral { value }, start))
            }
            TokenKind::Str => {
                let value = self.current().text.clone();
                let span = self.current().span;
                self.advance();
                Ok(Expr::new(ExprKind::StringLiteral { value }, span))
            }
            TokenKind::Ident => {
                let mut expr = self.parse_call_or_declref_expr()?;
                expr = self.parse_member_expr_maybe(expr)?;
                if self.lookahead_struct_lit() {
                    expr = self.parse_struct_lit(expr)?;
                }
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_cast_expr(),
            TokenKind::Star => {
                self.advance();
                let operand = self.parse_unary_expr()?;
                let span = self.span_from(start);
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Deref,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            TokenKind::Amp => {
                self.advance();
                let op = if self.check(TokenKind::Var) {
                    self.advance();
                    UnaryOp::VarRef
                } else {
                    UnaryOp::Ref
                };
                let operand = self.parse_unary_expr()?;
                let span = self.span_from(start);
                Ok(Expr::new(
                    ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.consume(TokenKind::RParen)?;
                let span = self.span_from(start);
                Ok(Expr::new(ExprKind::Paren(Box::new(inner)), span))
            }
            _ => Err(self.error_here(format!(
                "expected an expression, found '{}'",
                self.current().text
            ))),
        }
    }

    /// On seeing an identifier we don't know whether it is a variable, a
    /// function call, or a struct name without lookahead; the following
    /// token decides.
    fn parse_call_or_declref_expr(&mut self) -> ParseResult<Expr> {
        let start = self.current().span;
        let name = self.parse_name()?;

        if self.check(TokenKind::LParen) {
            self.advance();
            let mut args = Vec::new();
            while !self.check(TokenKind::RParen) && !self.at_end() {
                args.push(self.parse_expr()?);
                if self.check(TokenKind::Comma) {
                    self.advance();
                }
            }
            self.consume(TokenKind::RParen)?;
            let span = self.span_from(start);
            Ok(Expr::new(
                ExprKind::Call {
                    callee: name,
                    args,
                    callee_decl: None,
                },
                span,
            ))
        } else {
            // Whether this names a variable or a struct/enum is decided
            // during analysis.
            Ok(Expr::new(ExprKind::DeclRef { name }, start))
        }
    }

    /// Cast expression, `[T](e)`.
    fn parse_cast_expr(&mut self) -> ParseResult<Expr> {
        let start = self.current().span;

        self.consume(TokenKind::LBracket)?;
        let ty = self.parse_type_expr()?;
        self.consume(TokenKind::RBracket)?;

        self.consume(TokenKind::LParen)?;
        let operand = self.parse_expr()?;
        self.consume(TokenKind::RParen)?;

        let span = self.span_from(start);
        Ok(Expr::new(
            ExprKind::Cast {
                ty: Box::new(ty),
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// Extends a parsed term into a binary expression by consuming any
    /// attached RHS terms, as long as operators of at least `precedence`
    /// are seen. Left associative.
    fn parse_binary_expr_rhs(&mut self, lhs: Expr, precedence: i32) -> ParseResult<Expr> {
        let mut root = lhs;

        loop {
            let op = match binary_op(self.kind()) {
                Some(op) if op.precedence() >= precedence => op,
                _ => return Ok(root),
            };
            self.advance();

            let mut rhs = self.parse_unary_expr()?;

            // Look ahead to decide association: "a + b * c" binds the RHS
            // tighter, "a * b + c" does not.
            let next_prec = binary_op(self.kind())
                .map(|op| op.precedence())
                .unwrap_or(-1);
            if op.precedence() < next_prec {
                rhs = self.parse_binary_expr_rhs(rhs, precedence + 1)?;
            }

            let span = root.span.merge(&rhs.span);
            root = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(root),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
    }

    /// Consumes any trailing `.member` accesses.
    fn parse_member_expr_maybe(&mut self, expr: Expr) -> ParseResult<Expr> {
        let mut result = expr;

        while self.check(TokenKind::Dot) {
            self.advance();
            let field = self.parse_name()?;
            let span = self.span_from(result.span);
            result = Expr::new(
                ExprKind::Member {
                    base: Box::new(result),
                    field,
                },
                span,
            );
        }

        Ok(result)
    }

    /// A struct literal needs a `{` followed by a `.designator`; a bare
    /// brace after an identifier is a block (e.g. the body of `if x {}`).
    fn lookahead_struct_lit(&self) -> bool {
        if !self.check(TokenKind::LBrace) {
            return false;
        }
        let mut n = 1;
        while self.peek_kind(n) == TokenKind::Newline {
            n += 1;
        }
        self.peek_kind(n) == TokenKind::Dot
    }

    /// Parses `S { .a = e1, .b = e2 }` given the already-parsed `S`.
    fn parse_struct_lit(&mut self, name_expr: Expr) -> ParseResult<Expr> {
        if !matches!(name_expr.kind, ExprKind::DeclRef { .. }) {
            return Err(self.error_here("qualified struct names are not supported"));
        }

        self.consume(TokenKind::LBrace)?;
        let fields = self.parse_comma_separated(|p| p.parse_field_init())?;
        self.consume(TokenKind::RBrace)?;

        let span = self.span_from(name_expr.span);
        Ok(Expr::new(
            ExprKind::StructLit {
                name_expr: Box::new(name_expr),
                fields,
            },
            span,
        ))
    }

    /// Parses one `.name = expr` designator.
    fn parse_field_init(&mut self) -> ParseResult<FieldInit> {
        let start = self.current().span;
        self.consume(TokenKind::Dot)?;
        let name = self.parse_name()?;
        self.consume(TokenKind::Equals)?;
        let init = self.parse_expr()?;
        Ok(FieldInit {
            name,
            init,
            span: self.span_from(start),
        })
    }
}
