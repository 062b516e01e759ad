mod axis;
mod error;
mod grid;
mod layered;
mod source;

pub use axis::{GridAxis, IndexFrac, RegularAxis, StretchedAxis};
pub use error::GridError;
pub use grid::Grid;
pub use layered::LayeredGrid;
pub use source::{DenseSource, Interp, VoxelSource};
