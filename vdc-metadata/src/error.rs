use std::error;
use std::fmt;
use std::io;

/// Errors raised while building, reading, or writing a collection's master
/// file.
#[derive(Debug)]
pub enum MetadataError {
    InvalidParam(String),
    NotFound(String),
    Corrupt(String),
    IoError(String),
    /// A typed setter was called after `end_define()` froze the schema.
    Busy(String),
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::InvalidParam(msg) => write!(f, "invalid parameter: {}", msg),
            MetadataError::NotFound(msg) => write!(f, "not found: {}", msg),
            MetadataError::Corrupt(msg) => write!(f, "corrupt master file: {}", msg),
            MetadataError::IoError(msg) => write!(f, "i/o error: {}", msg),
            MetadataError::Busy(msg) => write!(f, "busy: {}", msg),
        }
    }
}

impl error::Error for MetadataError {}

impl From<io::Error> for MetadataError {
    fn from(e: io::Error) -> Self {
        MetadataError::IoError(e.to_string())
    }
}

impl From<vdc_wavelet::WaveletError> for MetadataError {
    fn from(e: vdc_wavelet::WaveletError) -> Self {
        MetadataError::InvalidParam(e.to_string())
    }
}
