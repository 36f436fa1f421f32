//! Type expression parsing
//!
//! type-expression:
//!     '&' 'var'? ('.' ident)? type-expression
//!     '*' type-expression
//!     ident

use rill_ast::{name_of_derived_type, TypeExpr, TypeExprKind};
use rill_lexer::TokenKind;

use crate::error::ParseResult;
use crate::parser::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn parse_type_expr(&mut self) -> ParseResult<TypeExpr> {
        let start = self.current().span;

        match self.kind() {
            TokenKind::Amp => {
                self.advance();
                let kind = if self.check(TokenKind::Var) {
                    self.advance();
                    TypeExprKind::VarRef
                } else {
                    TypeExprKind::Ref
                };

                // Lifetime annotation: the `.a` of `&.a T`.
                let lifetime = if self.check(TokenKind::Dot) {
                    self.advance();
                    Some(self.parse_name()?)
                } else {
                    None
                };

                let subexpr = self.parse_type_expr()?;
                let name = name_of_derived_type(self.names, kind, subexpr.name);

                Ok(TypeExpr {
                    kind,
                    name,
                    lifetime,
                    subexpr: Some(Box::new(subexpr)),
                    span: self.span_from(start),
                    ty: None,
                    decl: None,
                })
            }
            TokenKind::Star => {
                self.advance();
                let subexpr = self.parse_type_expr()?;
                let name = name_of_derived_type(self.names, TypeExprKind::Ptr, subexpr.name);

                Ok(TypeExpr {
                    kind: TypeExprKind::Ptr,
                    name,
                    lifetime: None,
                    subexpr: Some(Box::new(subexpr)),
                    span: self.span_from(start),
                    ty: None,
                    decl: None,
                })
            }
            TokenKind::Ident => {
                let name = self.parse_name()?;
                Ok(TypeExpr::new(TypeExprKind::Value, name, start))
            }
            _ => Err(self.error_here(format!(
                "expected a type name, found '{}'",
                self.current().text
            ))),
        }
    }
}
