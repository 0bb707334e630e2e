//! Error types for filter parsing and field resolution.

use thiserror::Error;

/// A specialized Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur while parsing a filter or resolving its terms.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The filter expression is empty.
    #[error("filter expression is empty")]
    EmptyExpression,

    /// An unexpected token was encountered during parsing.
    #[error("unexpected token: {token}")]
    UnexpectedToken {
        /// The unexpected token that was encountered.
        token: String,
    },

    /// An unexpected end of input was encountered.
    #[error("unexpected end of expression")]
    UnexpectedEndOfInput,

    /// An unclosed parenthesis was found.
    #[error("unclosed parenthesis")]
    UnclosedParenthesis,

    /// The filter could not be tokenized or the legacy arrays are malformed.
    #[error("invalid filter syntax: {message}")]
    InvalidSyntax { message: String },

    /// The field name does not resolve to a known task attribute.
    #[error("invalid task field '{field}'{}", suggestion_suffix(.suggestion))]
    InvalidField {
        field: String,
        /// A close match among the known fields.
        suggestion: Option<String>,
    },

    /// The comparator is not one of the supported comparators.
    #[error("invalid filter comparator '{comparator}'")]
    InvalidComparator { comparator: String },

    /// The literal cannot be coerced to the field's type.
    #[error("invalid value '{value}' for field '{field}'")]
    InvalidValue { field: String, value: String },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(", did you mean '{s}'?"),
        None => String::new(),
    }
}

impl FilterError {
    /// Creates an unexpected token error.
    pub fn unexpected_token(token: impl Into<String>) -> Self {
        FilterError::UnexpectedToken {
            token: token.into(),
        }
    }

    /// Creates an invalid syntax error.
    pub fn invalid_syntax(message: impl Into<String>) -> Self {
        FilterError::InvalidSyntax {
            message: message.into(),
        }
    }

    /// Creates an invalid field error without a suggestion.
    pub fn invalid_field(field: impl Into<String>) -> Self {
        FilterError::InvalidField {
            field: field.into(),
            suggestion: None,
        }
    }

    /// Creates an invalid comparator error.
    pub fn invalid_comparator(comparator: impl Into<String>) -> Self {
        FilterError::InvalidComparator {
            comparator: comparator.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        FilterError::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Returns true for the errors reported as invalid filter syntax.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            FilterError::EmptyExpression
                | FilterError::UnexpectedToken { .. }
                | FilterError::UnexpectedEndOfInput
                | FilterError::UnclosedParenthesis
                | FilterError::InvalidSyntax { .. }
        )
    }
}
