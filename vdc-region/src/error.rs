use std::error;
use std::fmt;

#[derive(Debug)]
pub enum RegionError {
    InvalidParam(String),
    NotFound(String),
    NotAvailable(String),
    Corrupt(String),
    IoError(String),
    Busy(String),
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionError::InvalidParam(msg) => write!(f, "invalid parameter: {}", msg),
            RegionError::NotFound(msg) => write!(f, "not found: {}", msg),
            RegionError::NotAvailable(msg) => write!(f, "not available: {}", msg),
            RegionError::Corrupt(msg) => write!(f, "corrupt: {}", msg),
            RegionError::IoError(msg) => write!(f, "i/o error: {}", msg),
            RegionError::Busy(msg) => write!(f, "busy: {}", msg),
        }
    }
}

impl error::Error for RegionError {}

impl From<vdc_io::IoLayerError> for RegionError {
    fn from(e: vdc_io::IoLayerError) -> Self {
        match e {
            vdc_io::IoLayerError::InvalidParam(m) => RegionError::InvalidParam(m),
            vdc_io::IoLayerError::NotFound(m) => RegionError::NotFound(m),
            vdc_io::IoLayerError::NotAvailable(m) => RegionError::NotAvailable(m),
            vdc_io::IoLayerError::Corrupt(m) => RegionError::Corrupt(m),
            vdc_io::IoLayerError::IoError(m) => RegionError::IoError(m),
            vdc_io::IoLayerError::Busy(m) => RegionError::Busy(m),
        }
    }
}

impl From<vdc_codec::CodecError> for RegionError {
    fn from(e: vdc_codec::CodecError) -> Self {
        match e {
            vdc_codec::CodecError::InvalidParam(m) => RegionError::InvalidParam(m),
            vdc_codec::CodecError::NotAvailable(m) => RegionError::NotAvailable(m),
            vdc_codec::CodecError::Corrupt(m) => RegionError::Corrupt(m),
            vdc_codec::CodecError::Wavelet(e) => RegionError::InvalidParam(e.to_string()),
        }
    }
}

impl From<vdc_metadata::MetadataError> for RegionError {
    fn from(e: vdc_metadata::MetadataError) -> Self {
        RegionError::InvalidParam(e.to_string())
    }
}
