use crate::attribute::AttrDict;
use crate::error::MetadataError;
use crate::timestep::TimestepDef;
use crate::variable::VariableDef;
use log::{debug, info};
use std::collections::HashMap;
use vdc_wavelet::Wavelet;

/// VDC-1 stores one refinement-level hierarchy per variable with no
/// independent LOD axis; VDC-2 adds the LOD axis on top of level. The two
/// differ only in file naming (`<var>.wb<level>` vs `<var>.<level>.<lod>`);
/// no component here special-cases VDC-1 beyond naming, per the collection's
/// stated design resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VdcType {
    Type1,
    Type2,
}

pub const DEFAULT_CRATIOS: &[usize] = &[1, 10, 100, 500];
pub const DEFAULT_BRICK_SIZE_3D: [usize; 3] = [64, 64, 64];
pub const DEFAULT_BRICK_SIZE_2D: [usize; 2] = [64, 64, 1];

/// The master directory for a collection: grid geometry, the CRatios/wavelet
/// codec configuration, and the variable/timestep schema. Mutable through
/// typed setters until `end_define()` freezes the schema; data-range stats
/// may still be recorded afterward since they are populated incrementally as
/// data is written.
#[derive(Debug, Clone)]
pub struct MasterFile {
    pub dims: [usize; 3],
    pub brick_size: [usize; 3],
    pub num_levels: usize,
    pub cratios: Vec<usize>,
    pub wavelet_name: String,
    pub vdc_type: VdcType,
    pub root_attrs: AttrDict,
    variables: Vec<VariableDef>,
    timesteps: Vec<TimestepDef>,
    data_range: HashMap<(String, usize), (f64, f64)>,
    defined: bool,
}

impl MasterFile {
    pub fn new(
        dims: [usize; 3],
        brick_size: [usize; 3],
        num_levels: usize,
        cratios: Vec<usize>,
        wavelet_name: impl Into<String>,
        vdc_type: VdcType,
    ) -> Result<Self, MetadataError> {
        let wavelet_name = wavelet_name.into();
        Wavelet::by_name(&wavelet_name)?;
        validate_cratios(&cratios)?;
        if dims.iter().any(|&d| d == 0) {
            return Err(MetadataError::InvalidParam("dims must be positive".to_string()));
        }
        if brick_size.iter().any(|&d| d == 0) {
            return Err(MetadataError::InvalidParam(
                "brick_size must be positive".to_string(),
            ));
        }
        info!(
            "new master file: dims={:?} brick_size={:?} levels={} wavelet={} vdc_type={:?}",
            dims, brick_size, num_levels, wavelet_name, vdc_type
        );
        Ok(MasterFile {
            dims,
            brick_size,
            num_levels,
            cratios,
            wavelet_name,
            vdc_type,
            root_attrs: AttrDict::new(),
            variables: Vec::new(),
            timesteps: Vec::new(),
            data_range: HashMap::new(),
            defined: false,
        })
    }

    /// Builds a collection with the factory defaults of §11: `CRatios =
    /// [1, 10, 100, 500]` and a 64-voxel-wide brick.
    pub fn with_defaults(
        dims: [usize; 3],
        num_levels: usize,
        wavelet_name: impl Into<String>,
        vdc_type: VdcType,
    ) -> Result<Self, MetadataError> {
        let brick = if dims[2] <= 1 {
            DEFAULT_BRICK_SIZE_2D
        } else {
            DEFAULT_BRICK_SIZE_3D
        };
        MasterFile::new(dims, brick, num_levels, DEFAULT_CRATIOS.to_vec(), wavelet_name, vdc_type)
    }

    fn ensure_mutable(&self) -> Result<(), MetadataError> {
        if self.defined {
            return Err(MetadataError::Busy(
                "schema is frozen; call occurred after end_define()".to_string(),
            ));
        }
        Ok(())
    }

    pub fn add_variable(&mut self, var: VariableDef) -> Result<(), MetadataError> {
        self.ensure_mutable()?;
        if self.variables.iter().any(|v| v.name == var.name) {
            return Err(MetadataError::InvalidParam(format!(
                "variable {:?} already defined",
                var.name
            )));
        }
        debug!("add_variable: {}", var.name);
        self.variables.push(var);
        Ok(())
    }

    pub fn add_timestep(&mut self, ts: TimestepDef) -> Result<(), MetadataError> {
        self.ensure_mutable()?;
        self.timesteps.push(ts);
        Ok(())
    }

    pub fn set_root_attr(&mut self, name: impl Into<String>, value: crate::attribute::AttrValue) -> Result<(), MetadataError> {
        self.ensure_mutable()?;
        self.root_attrs.set(name, value);
        Ok(())
    }

    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    pub fn timesteps(&self) -> &[TimestepDef] {
        &self.timesteps
    }

    pub fn variable(&self, name: &str) -> Result<&VariableDef, MetadataError> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| MetadataError::NotFound(format!("variable {:?}", name)))
    }

    pub fn num_timesteps(&self) -> usize {
        self.timesteps.len()
    }

    pub fn timestep(&self, t: usize) -> Result<&TimestepDef, MetadataError> {
        self.timesteps
            .get(t)
            .ok_or_else(|| MetadataError::NotFound(format!("timestep {}", t)))
    }

    /// Freezes the schema. After this call, `add_variable`/`add_timestep`/
    /// `set_root_attr` return `Busy`; only data-range stats may still be
    /// recorded.
    pub fn end_define(&mut self) -> Result<(), MetadataError> {
        self.ensure_mutable()?;
        self.defined = true;
        info!(
            "end_define: {} variables, {} timesteps frozen",
            self.variables.len(),
            self.timesteps.len()
        );
        Ok(())
    }

    pub fn is_defined(&self) -> bool {
        self.defined
    }

    /// Records the observed data-min/data-max for a variable at a timestep.
    /// Unlike the schema setters, this is legal both before and after
    /// `end_define()`, since stats are populated as data is written.
    pub fn set_data_range(&mut self, var: &str, t: usize, min: f64, max: f64) -> Result<(), MetadataError> {
        self.variable(var)?;
        self.timestep(t)?;
        self.data_range.insert((var.to_string(), t), (min, max));
        Ok(())
    }

    pub fn data_range(&self, var: &str, t: usize) -> Option<(f64, f64)> {
        self.data_range.get(&(var.to_string(), t)).copied()
    }
}

fn validate_cratios(cratios: &[usize]) -> Result<(), MetadataError> {
    if cratios.is_empty() {
        return Err(MetadataError::InvalidParam("cratios must be non-empty".to_string()));
    }
    if cratios[0] != 1 {
        return Err(MetadataError::InvalidParam("cratios[0] must be 1".to_string()));
    }
    for w in cratios.windows(2) {
        if w[1] <= w[0] {
            return Err(MetadataError::InvalidParam(
                "cratios must be strictly increasing".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::{NumericType, Orientation};

    fn sample() -> MasterFile {
        MasterFile::new([64, 64, 64], [32, 32, 32], 2, vec![1, 10, 100], "bior3.3", VdcType::Type2).unwrap()
    }

    #[test]
    fn rejects_bad_cratios() {
        assert!(MasterFile::new([8, 8, 8], [4, 4, 4], 1, vec![2, 4], "haar", VdcType::Type2).is_err());
        assert!(MasterFile::new([8, 8, 8], [4, 4, 4], 1, vec![1, 1], "haar", VdcType::Type2).is_err());
    }

    #[test]
    fn rejects_unknown_wavelet() {
        assert!(MasterFile::new([8, 8, 8], [4, 4, 4], 1, vec![1], "nope", VdcType::Type2).is_err());
    }

    #[test]
    fn end_define_freezes_schema() {
        let mut m = sample();
        m.add_variable(VariableDef::new("u", Orientation::ThreeD, NumericType::F32))
            .unwrap();
        m.end_define().unwrap();
        let err = m.add_variable(VariableDef::new("v", Orientation::ThreeD, NumericType::F32));
        assert!(err.is_err());
    }

    #[test]
    fn duplicate_variable_name_rejected() {
        let mut m = sample();
        m.add_variable(VariableDef::new("u", Orientation::ThreeD, NumericType::F32))
            .unwrap();
        let err = m.add_variable(VariableDef::new("u", Orientation::ThreeD, NumericType::F32));
        assert!(err.is_err());
    }

    #[test]
    fn data_range_recordable_after_end_define() {
        let mut m = sample();
        m.add_variable(VariableDef::new("u", Orientation::ThreeD, NumericType::F32))
            .unwrap();
        m.add_timestep(TimestepDef::new(0.0, [0.0; 3], [1.0; 3])).unwrap();
        m.end_define().unwrap();
        m.set_data_range("u", 0, -1.0, 1.0).unwrap();
        assert_eq!(m.data_range("u", 0), Some((-1.0, 1.0)));
    }

    #[test]
    fn with_defaults_picks_3d_or_2d_brick() {
        let m3 = MasterFile::with_defaults([128, 128, 128], 3, "bior2.2", VdcType::Type2).unwrap();
        assert_eq!(m3.brick_size, DEFAULT_BRICK_SIZE_3D);
        let m2 = MasterFile::with_defaults([128, 128, 1], 3, "bior2.2", VdcType::Type2).unwrap();
        assert_eq!(m2.brick_size, DEFAULT_BRICK_SIZE_2D);
    }
}
