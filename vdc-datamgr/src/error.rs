use std::error;
use std::fmt;

#[derive(Debug)]
pub enum DataMgrError {
    InvalidParam(String),
    NotFound(String),
    NotAvailable(String),
    OutOfMemory(String),
    Busy(String),
}

impl fmt::Display for DataMgrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataMgrError::InvalidParam(msg) => write!(f, "invalid parameter: {}", msg),
            DataMgrError::NotFound(msg) => write!(f, "not found: {}", msg),
            DataMgrError::NotAvailable(msg) => write!(f, "not available: {}", msg),
            DataMgrError::OutOfMemory(msg) => write!(f, "out of memory: {}", msg),
            DataMgrError::Busy(msg) => write!(f, "busy: {}", msg),
        }
    }
}

impl error::Error for DataMgrError {}

impl From<vdc_region::RegionError> for DataMgrError {
    fn from(e: vdc_region::RegionError) -> Self {
        match e {
            vdc_region::RegionError::InvalidParam(m) => DataMgrError::InvalidParam(m),
            vdc_region::RegionError::NotFound(m) => DataMgrError::NotFound(m),
            vdc_region::RegionError::NotAvailable(m) => DataMgrError::NotAvailable(m),
            vdc_region::RegionError::Corrupt(m) => DataMgrError::NotAvailable(m),
            vdc_region::RegionError::IoError(m) => DataMgrError::NotAvailable(m),
            vdc_region::RegionError::Busy(m) => DataMgrError::Busy(m),
        }
    }
}

impl From<vdc_source::SourceError> for DataMgrError {
    fn from(e: vdc_source::SourceError) -> Self {
        match e {
            vdc_source::SourceError::InvalidParam(m) => DataMgrError::InvalidParam(m),
            vdc_source::SourceError::NotFound(m) => DataMgrError::NotFound(m),
            vdc_source::SourceError::NotAvailable(m) => DataMgrError::NotAvailable(m),
            vdc_source::SourceError::IoError(m) => DataMgrError::NotAvailable(m),
        }
    }
}

impl From<vdc_grid::GridError> for DataMgrError {
    fn from(e: vdc_grid::GridError) -> Self {
        match e {
            vdc_grid::GridError::InvalidParam(m) => DataMgrError::InvalidParam(m),
            vdc_grid::GridError::Corrupt(m) => DataMgrError::NotAvailable(m),
        }
    }
}

impl From<vdc_metadata::MetadataError> for DataMgrError {
    fn from(e: vdc_metadata::MetadataError) -> Self {
        DataMgrError::NotFound(e.to_string())
    }
}

impl From<vdc_io::IoLayerError> for DataMgrError {
    fn from(e: vdc_io::IoLayerError) -> Self {
        DataMgrError::NotAvailable(e.to_string())
    }
}
