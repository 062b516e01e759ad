//! Master-file object model: grid geometry, the CRatios/wavelet codec
//! configuration, and the variable/timestep schema, plus its on-disk
//! textual representation.

pub mod attribute;
pub mod error;
pub mod master;
pub mod timestep;
pub mod variable;
pub mod xml;

pub use attribute::{AttrDict, AttrValue};
pub use error::MetadataError;
pub use master::{MasterFile, VdcType, DEFAULT_BRICK_SIZE_2D, DEFAULT_BRICK_SIZE_3D, DEFAULT_CRATIOS};
pub use timestep::{StretchedCoords, TimestepDef};
pub use variable::{NumericType, Orientation, VariableDef};

use log::{info, warn};
use std::fs;
use std::path::Path;

impl MasterFile {
    /// Loads a master file from its textual representation on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<MasterFile, MetadataError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let m = xml::deserialize(&text)?;
        info!("loaded master file from {}", path.display());
        Ok(m)
    }

    /// Writes the master file to disk. If a file already exists at `path`,
    /// it is rolled to `<path>.bak` first, matching the original tool's
    /// in-place edit convention.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MetadataError> {
        let path = path.as_ref();
        if path.exists() {
            let bak = bak_path(path);
            fs::rename(path, &bak)?;
            warn!("rolled existing master file to {}", bak.display());
        }
        let text = xml::serialize(self);
        fs::write(path, text)?;
        info!("wrote master file to {}", path.display());
        Ok(())
    }
}

fn bak_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}
