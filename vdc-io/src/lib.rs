//! Block I/O layer: per-variable/-timestep brick files with an O(1)-seek
//! header table, per §4.5.

pub mod brickfile;
pub mod error;
pub mod layout;
pub mod variable;

pub use error::IoLayerError;
pub use layout::brick_file_name;
pub use variable::{VariableReader, VariableWriter};
