//! Cache, derived-variable pipeline registry, and the `GetVariable`/
//! `UnlockGrid` entry point (§4.8) sitting above the region engine, grid
//! geometry, and metadata crates.

pub mod cache;
pub mod error;
pub mod key;
pub mod manager;
pub mod pipeline;

pub use cache::GridCache;
pub use error::DataMgrError;
pub use key::CacheKey;
pub use manager::{DataManager, GridHandle, DEFAULT_SENTINEL};
pub use pipeline::{builtin_registry, ComputeFn, Pipeline, PipelineInput, PipelineRegistry};
