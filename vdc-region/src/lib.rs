//! Brick-wise sub-box read/write over a variable/timestep's stored
//! levels: boundary padding, staggered-grid unstaggering, missing-value
//! sentinel masking, per-level downsample derivation, and the
//! `ReadSlice`/`WriteSlice` streaming mode, per §4.6.

pub mod downsample;
pub mod error;
pub mod geometry;
pub mod missing;
pub mod region;
pub mod slice;
pub mod stagger;

pub use downsample::downsample_half;
pub use error::RegionError;
pub use missing::{rewrite_sentinel, MissingMask};
pub use region::{RegionBuffer, RegionEngine};
pub use slice::{ReadSliceState, WriteSliceState};
pub use stagger::{unstagger, StaggerAxis};
