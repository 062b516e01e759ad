use std::error;
use std::fmt;

#[derive(Debug)]
pub enum GridError {
    InvalidParam(String),
    Corrupt(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::InvalidParam(msg) => write!(f, "invalid parameter: {}", msg),
            GridError::Corrupt(msg) => write!(f, "corrupt grid: {}", msg),
        }
    }
}

impl error::Error for GridError {}
