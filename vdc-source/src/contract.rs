use crate::error::SourceError;
use crate::types::{GridKind, VariableLists};

/// The contract an external data-collection reader must satisfy to feed
/// `vdc-datamgr`'s ingest path. Slices are handed back in the caller's
/// requested `(x, y, z)` order, raw: staggered axes are NOT collapsed by
/// the adaptor. `DataManager::ingest_variable` runs `vdc-region`'s
/// `unstagger` itself once full slices are collected, per §4.6's resolution
/// that unstaggering belongs to the region engine rather than the source
/// adaptor. An adaptor may synthesize derived variables (e.g. `ELEVATION`)
/// provided it advertises them through `variable_lists()` like any other
/// variable.
pub trait SourceAdaptor {
    type ReadHandle: VariableReadHandle;

    fn grid_dims(&self) -> [usize; 3];
    fn grid_kind(&self) -> GridKind;

    /// `None` when the source carries no projection metadata.
    fn map_projection(&self) -> Option<&str>;

    /// Extents may vary per timestep for time-varying grids.
    fn extents(&self, t: usize) -> ([f64; 3], [f64; 3]);

    fn variable_lists(&self) -> &VariableLists;

    fn user_times(&self) -> &[f64];

    fn is_missing_value(&self, var: &str, value: f64) -> bool;

    /// Declares that multiple processes are writing disjoint, block-aligned
    /// sub-boxes of the same variable under MPI; the default is a no-op,
    /// meaning independent (non-collective) I/O. See §5's collective-I/O
    /// hook — the real collective-NetCDF transport is an external
    /// collaborator, so this only records the intent.
    fn enable_buffering(&mut self, _dims: [usize; 3], _lod: usize, _rank: usize) {}

    fn open_variable_read(&mut self, t: usize, var: &str) -> Result<Self::ReadHandle, SourceError>;
}

/// A streaming read session opened by `SourceAdaptor::open_variable_read`.
/// `read_slice` is called once per `(x, y)` slab in increasing `z` order;
/// returns `false` once every slab has been delivered. `close` is always
/// called exactly once, even after a `read_slice` error, to release any
/// adaptor-held resources.
pub trait VariableReadHandle {
    fn read_slice(&mut self, buf: &mut [f64]) -> Result<bool, SourceError>;
    fn close(self) -> Result<(), SourceError>;
}
