//! Error type shared by the CSS and XPath query engines.

use thiserror::Error;

/// Errors raised while parsing or evaluating a locator expression.
///
/// The uniqueness oracle maps every variant to "not unique" — a malformed
/// candidate must never abort a generation run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Selector or expression text could not be parsed.
    #[error("parse error at offset {offset}: {message}")]
    Parse {
        /// Byte offset where parsing stopped.
        offset: usize,
        /// What the parser expected or rejected.
        message: String,
    },

    /// Parsed fine but uses a feature this engine does not evaluate.
    #[error("unsupported feature: {0}")]
    Unsupported(String),

    /// Empty selector or expression string.
    #[error("empty expression")]
    Empty,
}
