use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExpressionError>;

/// Errors raised while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    /// The text contains something outside the token grammar.
    #[error("Invalid token in expression: {expression:?}")]
    Lex { expression: String },

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Variable {0:?} not provided")]
    UnboundVariable(String),

    /// A node whose shape does not match its value. Indicates a bug in tree construction.
    #[error("Unknown node {0}")]
    UnknownNode(String),

    #[error("Cannot broadcast arrays of length {left} and {right}")]
    ShapeMismatch { left: usize, right: usize },
}

impl ExpressionError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        ExpressionError::Syntax(message.into())
    }

    /// Returns `true` when the error was caused by the caller's input rather than an
    /// internal invariant violation.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, ExpressionError::UnknownNode(_))
    }
}
