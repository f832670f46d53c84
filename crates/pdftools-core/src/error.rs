use thiserror::Error;

/// Client-side validation failures. None of these ever reach the server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("\"{name}\" is too large. Max allowed size is {limit_mb}MB.")]
    FileTooLarge { name: String, limit_mb: u64 },

    #[error("Too many {label}. Max allowed: {max}")]
    TooManyFiles { label: &'static str, max: usize },

    #[error("{0}")]
    WrongType(&'static str),
}

impl SelectionError {
    /// Size and count problems interrupt the user; type problems only show
    /// up in the status banner.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, SelectionError::WrongType(_))
    }
}

/// Failures reported by a finished transfer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Error, Debug)]
pub enum PageCountError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Failed to read file: {0}")]
    ReadError(String),
}
