//! Interface-only contract for external data-collection readers (§4.10).
//! No concrete production adaptor ships here; `memory` provides a dense
//! in-memory reference implementation for `vdc-datamgr`'s tests.

pub mod contract;
pub mod error;
pub mod memory;
pub mod types;

pub use contract::{SourceAdaptor, VariableReadHandle};
pub use error::SourceError;
pub use memory::MemorySource;
pub use types::{GridKind, VariableLists};
