//! Dialect errors.

/// Errors raised while translating a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlDialectError {
    /// The left operand names nothing the store knows about.
    #[error("unknown operand {operand:?} for {table}")]
    UnknownOperand {
        /// Table being queried.
        table: &'static str,
        /// Offending left operand.
        operand: String,
    },

    /// The left operand is known but cannot be translated to SQL.
    #[error("operand {operand:?} is not supported for {table}: {reason}")]
    UnsupportedOperand {
        /// Table being queried.
        table: &'static str,
        /// Offending left operand.
        operand: String,
        /// What is missing.
        reason: &'static str,
    },

    /// The operator string is not recognised.
    #[error("unknown operator {0:?}")]
    UnknownOperator(String),

    /// The right operand does not fit the operator.
    #[error("invalid right operand for {operator}: {reason}")]
    InvalidRightOperand {
        /// Operator symbol.
        operator: &'static str,
        /// What was wrong.
        reason: &'static str,
    },

    /// A quoted path segment was never closed.
    #[error("unterminated quote in {0:?}")]
    UnterminatedQuote(String),
}

/// Convenience result type for the dialect.
pub type SqlResult<T> = Result<T, SqlDialectError>;
