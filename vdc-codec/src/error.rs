use std::error;
use std::fmt;
use vdc_wavelet::WaveletError;

/// Errors raised by the significance map and brick codec.
#[derive(Debug)]
pub enum CodecError {
    InvalidParam(String),
    NotAvailable(String),
    Corrupt(String),
    Wavelet(WaveletError),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::InvalidParam(msg) => write!(f, "invalid parameter: {}", msg),
            CodecError::NotAvailable(msg) => write!(f, "not available: {}", msg),
            CodecError::Corrupt(msg) => write!(f, "corrupt codec stream: {}", msg),
            CodecError::Wavelet(e) => write!(f, "wavelet error: {}", e),
        }
    }
}

impl error::Error for CodecError {}

impl From<WaveletError> for CodecError {
    fn from(e: WaveletError) -> Self {
        CodecError::Wavelet(e)
    }
}
