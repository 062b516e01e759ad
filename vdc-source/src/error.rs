use std::error;
use std::fmt;

#[derive(Debug)]
pub enum SourceError {
    InvalidParam(String),
    NotFound(String),
    NotAvailable(String),
    IoError(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::InvalidParam(msg) => write!(f, "invalid parameter: {}", msg),
            SourceError::NotFound(msg) => write!(f, "not found: {}", msg),
            SourceError::NotAvailable(msg) => write!(f, "not available: {}", msg),
            SourceError::IoError(msg) => write!(f, "i/o error: {}", msg),
        }
    }
}

impl error::Error for SourceError {}
