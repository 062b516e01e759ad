//! Block memory manager.
//!
//! A process-wide pool of fixed-size blocks, grown in generations as
//! demand exceeds the current budget and garbage collected a generation
//! at a time once it goes fully idle. `request_mem_size` configures the
//! block size and the overall block budget before the first `MemPool` is
//! created; every `MemPool` instance afterwards draws from the same pool.

pub mod error;
pub mod pool;

pub use error::MemError;
pub use pool::{request_mem_size, Block, MemPool};
