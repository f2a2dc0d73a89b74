use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while decoding a binary catalog file.
///
/// Every variant is fatal to the file being parsed and to nothing else: the
/// loader logs it and moves on to the next candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The first four bytes match neither byte order of the catalog magic number
    #[error("bad magic number 0x{0:08x}")]
    BadMagic(u32),
    /// Only format revision 0 is understood
    #[error("unsupported format revision {0}")]
    UnsupportedRevision(u32),
    /// A header field, descriptor or string slice points past the end of the file
    #[error("truncated {section} at offset {offset}")]
    TruncatedTable {
        section: &'static str,
        offset: usize,
    },
    /// A string could not be decoded with the charset declared in the header
    #[error("string pair {index} is not valid {charset}")]
    BadEncoding { index: usize, charset: &'static str },
}

/// Errors raised while compiling a `Plural-Forms` header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },
    #[error("division by literal zero at offset {offset}")]
    DivisionByZero { offset: usize },
    #[error("missing nplurals in plural forms header")]
    MissingPluralCount,
    #[error("invalid nplurals value '{0}'")]
    InvalidPluralCount(String),
    #[error("missing plural expression in plural forms header")]
    MissingExpression,
}

/// Errors raised while reading one catalog file from a search root.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse '{}': {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

/// Errors raised while reading the registry configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type FormatResult<T> = Result<T, FormatError>;
pub type ExpressionResult<T> = Result<T, ExpressionError>;
