/// A closure-like sampler over a region's raw `(i, j, k)` voxels. Grid
/// geometry is generic over this trait so it carries no dependency on the
/// cache/data-manager layer; `vdc-datamgr` supplies the concrete source
/// backed by its cache.
pub trait VoxelSource {
    fn dims(&self) -> (usize, usize, usize);
    fn get(&self, i: usize, j: usize, k: usize) -> f64;
    fn is_missing(&self, i: usize, j: usize, k: usize) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interp {
    Linear,
    Nearest,
}

/// A dense in-memory source, mainly for tests and for small derived-field
/// scratch buffers (e.g. an ELEVATION field staged for a layered grid
/// lookup).
pub struct DenseSource {
    nx: usize,
    ny: usize,
    nz: usize,
    values: Vec<f64>,
    missing: Option<f64>,
}

impl DenseSource {
    pub fn new(nx: usize, ny: usize, nz: usize, values: Vec<f64>, missing: Option<f64>) -> Self {
        assert_eq!(values.len(), nx * ny * nz);
        DenseSource { nx, ny, nz, values, missing }
    }

    fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.ny + j) * self.nx + i
    }
}

impl VoxelSource for DenseSource {
    fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        self.values[self.index(i, j, k)]
    }

    fn is_missing(&self, i: usize, j: usize, k: usize) -> bool {
        match self.missing {
            Some(m) => self.values[self.index(i, j, k)] == m,
            None => false,
        }
    }
}
