use thiserror::Error;

/// Fatal and line-level error taxonomy for the ingestion and query paths.
///
/// `UnknownReference` and `MalformedLine` are deliberately absent: per the
/// error handling policy, an unknown reference is an empty query result and
/// a structurally truncated line is a silent skip, not a failure.
#[derive(Debug, Error)]
pub enum GtfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed {field} on line {line}: {text:?}")]
    MalformedNumber {
        line: u64,
        field: &'static str,
        text: String,
    },
}

pub type Result<T> = std::result::Result<T, GtfError>;
