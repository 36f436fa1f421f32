//! Emitter errors
//!
//! The emitter only runs on a fully analyzed tree, so each of these marks
//! an annotation the analysis should have left behind but did not, or a
//! construct the checker accepts that has no C spelling.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    /// A variable, parameter or field declaration with no resolved type.
    UntypedDecl(String),
    /// A function signature whose return type was never resolved.
    UntypedReturn(String),
    /// A struct literal or cast with no resolved type.
    UntypedExpr,
    /// A function item that needs a body but has none.
    MissingBody(String),
    /// C has no nested functions.
    NestedFunction(String),
    /// A parser recovery placeholder survived into the emitter.
    MalformedNode,
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::UntypedDecl(name) => {
                write!(f, "cannot emit declaration '{}': type not resolved", name)
            }
            CodegenError::UntypedReturn(name) => {
                write!(f, "cannot emit '{}': return type not resolved", name)
            }
            CodegenError::UntypedExpr => {
                write!(f, "cannot emit expression: type not resolved")
            }
            CodegenError::MissingBody(name) => {
                write!(f, "cannot emit function '{}' without a body", name)
            }
            CodegenError::NestedFunction(name) => {
                write!(f, "cannot emit nested function '{}' as C", name)
            }
            CodegenError::MalformedNode => {
                write!(f, "malformed syntax reached the emitter")
            }
        }
    }
}

impl std::error::Error for CodegenError {}
