use std::error;
use std::fmt;

/// Errors raised by the 1-D and N-D wavelet kernels.
#[derive(Debug)]
pub enum WaveletError {
    /// A caller-supplied parameter (filter order, brick side, thread count) is out of range.
    InvalidParam(String),
    /// A buffer handed to forward/inverse was the wrong length or shape.
    Corrupt(String),
}

impl fmt::Display for WaveletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveletError::InvalidParam(msg) => write!(f, "invalid parameter: {}", msg),
            WaveletError::Corrupt(msg) => write!(f, "corrupt wavelet buffer: {}", msg),
        }
    }
}

impl error::Error for WaveletError {}
