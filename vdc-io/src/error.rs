use std::error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum IoLayerError {
    InvalidParam(String),
    NotFound(String),
    NotAvailable(String),
    Corrupt(String),
    IoError(String),
    Busy(String),
}

impl fmt::Display for IoLayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoLayerError::InvalidParam(msg) => write!(f, "invalid parameter: {}", msg),
            IoLayerError::NotFound(msg) => write!(f, "not found: {}", msg),
            IoLayerError::NotAvailable(msg) => write!(f, "not available: {}", msg),
            IoLayerError::Corrupt(msg) => write!(f, "corrupt: {}", msg),
            IoLayerError::IoError(msg) => write!(f, "i/o error: {}", msg),
            IoLayerError::Busy(msg) => write!(f, "busy: {}", msg),
        }
    }
}

impl error::Error for IoLayerError {}

impl From<io::Error> for IoLayerError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::NotFound {
            IoLayerError::NotFound(e.to_string())
        } else {
            IoLayerError::IoError(e.to_string())
        }
    }
}

impl From<vdc_codec::CodecError> for IoLayerError {
    fn from(e: vdc_codec::CodecError) -> Self {
        match e {
            vdc_codec::CodecError::InvalidParam(m) => IoLayerError::InvalidParam(m),
            vdc_codec::CodecError::NotAvailable(m) => IoLayerError::NotAvailable(m),
            vdc_codec::CodecError::Corrupt(m) => IoLayerError::Corrupt(m),
            vdc_codec::CodecError::Wavelet(e) => IoLayerError::InvalidParam(e.to_string()),
        }
    }
}
