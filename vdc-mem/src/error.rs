use std::error;
use std::fmt;

/// Errors raised by the block memory manager.
#[derive(Debug)]
pub enum MemError {
    InvalidParam(String),
    OutOfMemory(String),
    /// `RequestMemSize` called while a `MemPool` instance is already active.
    Busy(String),
}

impl fmt::Display for MemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemError::InvalidParam(msg) => write!(f, "invalid parameter: {}", msg),
            MemError::OutOfMemory(msg) => write!(f, "out of memory: {}", msg),
            MemError::Busy(msg) => write!(f, "busy: {}", msg),
        }
    }
}

impl error::Error for MemError {}
