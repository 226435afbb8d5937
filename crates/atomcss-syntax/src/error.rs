//! Error types for token and value syntax.

use thiserror::Error;

/// Errors that can occur while parsing token syntax.
///
/// Most helpers in this crate are lenient and return `Option`; these errors
/// surface from the strict entry points such as
/// [`try_expand_variant_group`](crate::variant_group::try_expand_variant_group).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyntaxError {
    /// A `(` group was opened but never closed.
    #[error("unclosed variant group starting at position {0}")]
    UnclosedGroup(usize),

    /// A `)` appeared without a matching `(`.
    #[error("unexpected `)` at position {0}")]
    UnexpectedClose(usize),

    /// Group nesting went deeper than the supported limit.
    #[error("variant groups nested deeper than {0} levels")]
    TooDeep(usize),

    /// A numeric value could not be parsed.
    #[error("invalid number: {0}")]
    InvalidNumber(String),
}
