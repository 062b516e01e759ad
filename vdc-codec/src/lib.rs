//! Significance maps and the per-brick wavelet codec.
//!
//! `sigmap` is the ordered coefficient-index set each LOD's retained
//! coefficients are named by. `brick` ranks a brick's transformed
//! coefficients by magnitude, splits them into nested LOD segments per the
//! collection's CRatios, and decodes a requested `(level, LOD)` back into a
//! voxel buffer via `vdc-wavelet`.

pub mod brick;
pub mod error;
pub mod sigmap;

pub use brick::{BrickCodec, LodSegment};
pub use error::CodecError;
pub use sigmap::SignificanceMap;
