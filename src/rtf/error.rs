//! Error types for RTF parsing.

use thiserror::Error;

/// Result type for RTF operations.
pub type RtfResult<T> = Result<T, RtfError>;

/// RTF parsing errors.
///
/// Only structural failures reach here. Unrecognized control words are never
/// errors, and parameter-level failures (`\u`, `\'` with a bad parameter) are
/// swallowed at the call site rather than surfaced as a variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RtfError {
    /// A required callback was missing when constructing the parser.
    #[error("missing required callback: {0}")]
    Configuration(&'static str),

    /// `}` was encountered with only the root scope remaining on the stack.
    #[error("unbalanced brace: attempted to close the root scope")]
    UnbalancedBrace,

    /// `\` appeared at end of input, or the tokenizer reached an unrecoverable
    /// state while reading an escape.
    #[error("malformed escape sequence: {0}")]
    MalformedEscape(String),

    /// No document was loaded before calling [`RtfParser::parse`](crate::RtfParser::parse).
    #[error("no RTF content has been loaded")]
    NoContent,

    /// Reading the input file failed.
    #[error("failed to read RTF file: {0}")]
    Io(String),
}
