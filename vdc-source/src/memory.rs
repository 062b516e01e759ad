use crate::contract::{SourceAdaptor, VariableReadHandle};
use crate::error::SourceError;
use crate::types::{GridKind, VariableLists};
use log::debug;
use std::collections::HashMap;

/// A dense in-memory adaptor, mainly exercised by `vdc-datamgr`'s tests in
/// place of a real file-format reader.
pub struct MemorySource {
    dims: [usize; 3],
    extent_min: [f64; 3],
    extent_max: [f64; 3],
    lists: VariableLists,
    user_times: Vec<f64>,
    missing: Option<f64>,
    data: HashMap<String, Vec<f64>>,
}

impl MemorySource {
    pub fn new(dims: [usize; 3], extent_min: [f64; 3], extent_max: [f64; 3], user_times: Vec<f64>, missing: Option<f64>) -> Self {
        MemorySource { dims, extent_min, extent_max, lists: VariableLists::default(), user_times, missing, data: HashMap::new() }
    }

    pub fn add_3d_variable(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        self.lists.three_d.push(name.clone());
        self.data.insert(name, values);
    }
}

impl SourceAdaptor for MemorySource {
    type ReadHandle = MemoryReadHandle;

    fn grid_dims(&self) -> [usize; 3] {
        self.dims
    }

    fn grid_kind(&self) -> GridKind {
        GridKind::Regular
    }

    fn map_projection(&self) -> Option<&str> {
        None
    }

    fn extents(&self, _t: usize) -> ([f64; 3], [f64; 3]) {
        (self.extent_min, self.extent_max)
    }

    fn variable_lists(&self) -> &VariableLists {
        &self.lists
    }

    fn user_times(&self) -> &[f64] {
        &self.user_times
    }

    fn is_missing_value(&self, _var: &str, value: f64) -> bool {
        self.missing == Some(value)
    }

    fn open_variable_read(&mut self, t: usize, var: &str) -> Result<MemoryReadHandle, SourceError> {
        let values = self.data.get(var).ok_or_else(|| SourceError::NotFound(format!("no such variable: {}", var)))?.clone();
        debug!("openVariableRead: var={} t={}", var, t);
        Ok(MemoryReadHandle { values, plane: self.dims[0] * self.dims[1], next_z: 0, nz: self.dims[2] })
    }
}

pub struct MemoryReadHandle {
    values: Vec<f64>,
    plane: usize,
    next_z: usize,
    nz: usize,
}

impl VariableReadHandle for MemoryReadHandle {
    fn read_slice(&mut self, buf: &mut [f64]) -> Result<bool, SourceError> {
        if self.next_z >= self.nz {
            return Ok(false);
        }
        let off = self.next_z * self.plane;
        if buf.len() != self.plane || off + self.plane > self.values.len() {
            return Err(SourceError::InvalidParam("read_slice: buffer size mismatch".to_string()));
        }
        buf.copy_from_slice(&self.values[off..off + self.plane]);
        self.next_z += 1;
        Ok(true)
    }

    fn close(self) -> Result<(), SourceError> {
        Ok(())
    }
}
