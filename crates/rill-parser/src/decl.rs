//! Declaration parsing

use rill_ast::{
    Decl, EnumDecl, EnumVariantDecl, FuncDecl, StructDecl, VarDecl, VarDeclKind,
};
use rill_lexer::TokenKind;

use crate::error::ParseResult;
use crate::parser::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn is_start_of_decl(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Let | TokenKind::Var | TokenKind::Struct | TokenKind::Fn
        )
    }

    pub(crate) fn parse_decl(&mut self) -> ParseResult<Decl> {
        match self.kind() {
            TokenKind::Let => {
                self.advance();
                Ok(Decl::Var(self.parse_var_decl(VarDeclKind::Local, false)?))
            }
            TokenKind::Var => {
                self.advance();
                Ok(Decl::Var(self.parse_var_decl(VarDeclKind::Local, true)?))
            }
            TokenKind::Struct => Ok(Decl::Struct(self.parse_struct_decl()?)),
            TokenKind::Fn => Ok(Decl::Func(self.parse_func_decl()?)),
            _ => Err(self.error_here("expected a declaration")),
        }
    }

    /// Parses the name/type/initializer part of a variable declaration; the
    /// introducing `let`/`var` keyword (for locals) has already been
    /// consumed. Also used for parameters and struct fields, which require a
    /// type.
    pub(crate) fn parse_var_decl(
        &mut self,
        kind: VarDeclKind,
        mutable: bool,
    ) -> ParseResult<VarDecl> {
        let start = self.current().span;
        let name = self.parse_name()?;

        let mut type_expr = None;
        let mut init = None;

        if self.check(TokenKind::Colon) {
            self.advance();
            type_expr = Some(self.parse_type_expr()?);
        }
        if self.check(TokenKind::Equals) {
            self.advance();
            init = Some(self.parse_expr()?);
        }

        if type_expr.is_none() && init.is_none() {
            return Err(self.error_here("expected '=' or ':' after variable name"));
        }
        if kind != VarDeclKind::Local && type_expr.is_none() {
            return Err(self.error_here(format!(
                "expected ':' and a type after '{}'",
                self.names.get(name)
            )));
        }

        Ok(VarDecl {
            name,
            kind,
            mutable,
            type_expr,
            init,
            span: self.span_from(start),
            decl: None,
        })
    }

    /// Parses a parameter: `name: T` or `var name: T`.
    fn parse_param(&mut self) -> ParseResult<VarDecl> {
        let mutable = if self.check(TokenKind::Var) {
            self.advance();
            true
        } else {
            false
        };
        self.parse_var_decl(VarDeclKind::Param, mutable)
    }

    /// Parses `fn name(params) [-> type]`, without a body.
    pub(crate) fn parse_func_header(&mut self) -> ParseResult<FuncDecl> {
        let start = self.current().span;
        self.consume(TokenKind::Fn)?;
        let name = self.parse_name()?;

        self.consume(TokenKind::LParen)?;
        let params = self.parse_comma_separated(|p| p.parse_param())?;
        self.consume(TokenKind::RParen)?;

        let ret_type_expr = if self.check(TokenKind::Arrow) {
            self.advance();
            Some(self.parse_type_expr()?)
        } else {
            None
        };

        Ok(FuncDecl {
            name,
            params,
            ret_type_expr,
            body: None,
            span: self.span_from(start),
            decl: None,
        })
    }

    pub(crate) fn parse_func_decl(&mut self) -> ParseResult<FuncDecl> {
        let mut func = self.parse_func_header()?;
        let body = self.parse_compound_stmt()?;
        func.body = Some(body);
        func.span = self.span_from(func.span);
        Ok(func)
    }

    pub(crate) fn parse_extern_decl(&mut self) -> ParseResult<FuncDecl> {
        self.consume(TokenKind::Extern)?;
        let func = self.parse_func_header()?;
        self.expect_stmt_end()?;
        Ok(func)
    }

    pub(crate) fn parse_struct_decl(&mut self) -> ParseResult<StructDecl> {
        let start = self.current().span;
        self.consume(TokenKind::Struct)?;
        let name = self.parse_name()?;

        self.consume(TokenKind::LBrace)?;
        let fields =
            self.parse_comma_separated(|p| p.parse_var_decl(VarDeclKind::Field, false))?;
        self.consume(TokenKind::RBrace)?;

        Ok(StructDecl {
            name,
            fields,
            span: self.span_from(start),
            decl: None,
        })
    }

    pub(crate) fn parse_enum_decl(&mut self) -> ParseResult<EnumDecl> {
        let start = self.current().span;
        self.consume(TokenKind::Enum)?;
        let name = self.parse_name()?;

        self.consume(TokenKind::LBrace)?;
        let mut variants = Vec::new();
        loop {
            self.skip_newlines();
            if !self.check(TokenKind::Ident) {
                break;
            }
            variants.push(self.parse_enum_variant()?);
            if self.check(TokenKind::Comma) {
                self.advance();
            }
        }
        self.consume(TokenKind::RBrace)?;

        Ok(EnumDecl {
            name,
            variants,
            span: self.span_from(start),
            decl: None,
        })
    }

    /// Parses one enum variant, e.g. `Pos(int, int)` or a bare `None`.
    fn parse_enum_variant(&mut self) -> ParseResult<EnumVariantDecl> {
        let start = self.current().span;
        let name = self.parse_name()?;

        let mut fields = Vec::new();
        if self.check(TokenKind::LParen) {
            self.advance();
            fields = self.parse_comma_separated(|p| p.parse_type_expr())?;
            self.consume(TokenKind::RParen)?;
        }

        Ok(EnumVariantDecl {
            name,
            fields,
            span: self.span_from(start),
            decl: None,
        })
    }
}
