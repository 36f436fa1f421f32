//! Semantic analysis errors

use rill_ast::Span;
use std::fmt;

/// The error families produced by the analysis passes. Names appearing in
/// messages are resolved to strings at construction time so errors stay
/// self-contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemaErrorKind {
    // Lookup
    UndeclaredIdent(String),
    UndeclaredFunction(String),
    UndeclaredType(String),

    // Redefinition
    Redefinition(String),

    // Arity
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    // Type mismatch
    AssignTypeMismatch {
        lhs: String,
        rhs: String,
    },
    ReturnTypeMismatch {
        expected: String,
        found: String,
    },
    ArgTypeMismatch {
        expected: String,
        found: String,
    },
    IncompatibleBinaryOperands {
        lhs: String,
        rhs: String,
    },

    // Classification
    NotFunction(String),
    NotValue(String),
    NotStruct(String),
    NotMember {
        member: String,
        ty: String,
    },
    DerefNonRef(String),
    ReturnInVoidFunction(String),

    // Mutability
    NotMutable(String),
    NotMutableRef(String),
    AddressOfRvalue,
    AssignToRvalue,
    BorrowImmutableAsMutable(String),

    // Copy/move
    CopyNonCopyable(String),
    MoveOutOfReference {
        moved: String,
        invalidated: String,
    },
    MoveWhileBorrowed(String),
    UseOfMoved,

    // Borrow
    BorrowConflictWithMutable(String),
    BorrowConflictWithImmutable(String),

    // Lifetime
    DoesNotLiveLongEnough(String),
    ReturnsLocalRef(String),
    LifetimeMismatch {
        expected: String,
        found: String,
    },
    MissingLifetimeAnnotation,
    UnknownLifetimeAnnotation(String),
    AnnotationOnLocal,

    // Control flow
    NotGuaranteedReturn,
}

/// A semantic error with the source position it was raised at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemaError {
    pub kind: SemaErrorKind,
    pub span: Span,
}

impl SemaError {
    pub fn new(kind: SemaErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl fmt::Display for SemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for SemaError {}

impl fmt::Display for SemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SemaErrorKind::*;
        match self {
            UndeclaredIdent(name) => {
                write!(f, "use of undeclared identifier '{}'", name)
            }
            UndeclaredFunction(name) => write!(f, "undeclared function '{}'", name),
            UndeclaredType(name) => write!(f, "use of undeclared type '{}'", name),
            Redefinition(name) => write!(f, "redefinition of '{}'", name),
            ArityMismatch {
                name,
                expected,
                found,
            } => write!(f, "'{}' accepts {} arguments, got {}", name, expected, found),
            AssignTypeMismatch { lhs, rhs } => {
                write!(f, "cannot assign '{}' type to '{}'", rhs, lhs)
            }
            ReturnTypeMismatch { expected, found } => write!(
                f,
                "return type mismatch: function returns '{}', but got '{}'",
                expected, found
            ),
            ArgTypeMismatch { expected, found } => write!(
                f,
                "argument type mismatch: expects '{}', got '{}'",
                expected, found
            ),
            IncompatibleBinaryOperands { lhs, rhs } => write!(
                f,
                "incompatible types to binary expression ('{}' and '{}')",
                lhs, rhs
            ),
            NotFunction(name) => write!(f, "'{}' is not a function", name),
            NotValue(name) => write!(f, "'{}' is not a value", name),
            NotStruct(name) => write!(f, "type '{}' is not a struct", name),
            NotMember { member, ty } => {
                write!(f, "'{}' is not a member of '{}'", member, ty)
            }
            DerefNonRef(ty) => {
                write!(f, "dereference of a non-reference type '{}'", ty)
            }
            ReturnInVoidFunction(name) => {
                write!(f, "function '{}' should not return a value", name)
            }
            NotMutable(name) => write!(f, "'{}' is not declared as mutable", name),
            NotMutableRef(name) => write!(f, "'{}' is not a mutable reference", name),
            AddressOfRvalue => write!(f, "cannot take address of an rvalue"),
            AssignToRvalue => write!(f, "cannot assign to an rvalue"),
            BorrowImmutableAsMutable(name) => write!(
                f,
                "cannot borrow '{}' as mutable because it is declared immutable",
                name
            ),
            CopyNonCopyable(ty) => {
                write!(f, "cannot copy non-copyable type '{}'", ty)
            }
            MoveOutOfReference { moved, invalidated } => write!(
                f,
                "cannot move out of '{}' because it will invalidate '{}'",
                moved, invalidated
            ),
            MoveWhileBorrowed(name) => {
                write!(f, "cannot move out of '{}' because it is borrowed", name)
            }
            UseOfMoved => write!(f, "use of moved value"),
            BorrowConflictWithMutable(name) => write!(
                f,
                "cannot borrow '{}' as immutable because it was borrowed as mutable before",
                name
            ),
            BorrowConflictWithImmutable(name) => write!(
                f,
                "cannot borrow '{}' as mutable because it was borrowed as immutable before",
                name
            ),
            DoesNotLiveLongEnough(name) => {
                write!(f, "'{}' does not live long enough", name)
            }
            ReturnsLocalRef(name) => write!(
                f,
                "cannot return value that references local variable '{}'",
                name
            ),
            LifetimeMismatch { expected, found } => write!(
                f,
                "lifetime mismatch: expected .{}, got .{}",
                expected, found
            ),
            MissingLifetimeAnnotation => write!(f, "missing lifetime annotation"),
            UnknownLifetimeAnnotation(name) => {
                write!(f, "unknown lifetime annotation '.{}'", name)
            }
            AnnotationOnLocal => write!(
                f,
                "lifetime annotations are only supported on function parameters"
            ),
            NotGuaranteedReturn => {
                write!(f, "function not guaranteed to return a value")
            }
        }
    }
}
