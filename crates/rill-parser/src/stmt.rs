//! Statement parsing

use rill_ast::{CompoundStmt, IfStmt, Stmt, StmtKind};
use rill_lexer::TokenKind;

use crate::error::ParseResult;
use crate::parser::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current().span;

        let kind = match self.kind() {
            TokenKind::LBrace => StmtKind::Compound(self.parse_compound_stmt()?),
            TokenKind::Return => self.parse_return_stmt()?,
            TokenKind::If => StmtKind::If(self.parse_if_stmt()?),
            TokenKind::Hash => {
                let text = self.current().text.clone();
                self.advance();
                self.expect_stmt_end()?;
                StmtKind::Builtin { text }
            }
            _ if self.is_start_of_decl() => {
                let decl = self.parse_decl()?;
                self.expect_stmt_end()?;
                StmtKind::Decl(decl)
            }
            _ => self.parse_expr_or_assign_stmt()?,
        };

        Ok(Stmt::new(kind, self.span_from(start)))
    }

    pub(crate) fn parse_return_stmt(&mut self) -> ParseResult<StmtKind> {
        self.consume(TokenKind::Return)?;

        let expr = if self.at_stmt_end() {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_stmt_end()?;

        Ok(StmtKind::Return { expr })
    }

    /// An else-if clause is parsed as a nested `IfStmt` hanging off the else
    /// branch, so a chain becomes a right-leaning list.
    pub(crate) fn parse_if_stmt(&mut self) -> ParseResult<IfStmt> {
        self.consume(TokenKind::If)?;

        let cond = self.parse_expr()?;
        let then_body = self.parse_compound_stmt()?;

        let mut else_if = None;
        let mut else_body = None;
        if self.check(TokenKind::Else) {
            self.advance();
            if self.check(TokenKind::If) {
                else_if = Some(Box::new(self.parse_if_stmt()?));
            } else {
                else_body = Some(self.parse_compound_stmt()?);
            }
        }

        Ok(IfStmt {
            cond,
            then_body,
            else_if,
            else_body,
        })
    }

    /// On seeing an expression we don't know yet whether it is a bare
    /// expression statement or the LHS of an assignment; the `=` or `<-`
    /// after it decides.
    pub(crate) fn parse_expr_or_assign_stmt(&mut self) -> ParseResult<StmtKind> {
        let lhs = self.parse_expr()?;

        if self.at_stmt_end() {
            self.expect_stmt_end()?;
            return Ok(StmtKind::Expr(lhs));
        }

        let is_move = match self.kind() {
            TokenKind::RevArrow => {
                self.advance();
                true
            }
            TokenKind::Equals => {
                self.advance();
                false
            }
            _ => {
                return Err(self.error_here(format!(
                    "expected '=' or end of statement after expression, found '{}'",
                    self.current().text
                )));
            }
        };

        let rhs = self.parse_expr()?;
        self.expect_stmt_end()?;
        Ok(StmtKind::Assign { lhs, rhs, is_move })
    }

    /// A compound statement is a scoped `{ ... }` block; declarations and
    /// statements may come in any order.
    pub(crate) fn parse_compound_stmt(&mut self) -> ParseResult<CompoundStmt> {
        self.consume(TokenKind::LBrace)?;

        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if self.check(TokenKind::RBrace) || self.at_end() {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }

        self.consume(TokenKind::RBrace)?;
        Ok(CompoundStmt { stmts })
    }
}
