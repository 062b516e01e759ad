use crate::error::RegionError;
use crate::geometry::bricks_per_axis;
use crate::region::RegionEngine;
use log::debug;
use vdc_io::{VariableReader, VariableWriter};

/// Streaming write state for `WriteSlice`: buffers one brick-height Z-slab
/// of XY slices at a time, encoding and flushing a full Z-row of bricks
/// once the buffer fills. Must be driven exactly `Nz` times; `close()`
/// zero-pads and flushes a partial tail slab.
pub struct WriteSliceState<'a> {
    engine: &'a RegionEngine,
    level: usize,
    dims: [usize; 3],
    slab_height: usize,
    slab: Vec<f64>,
    slices_in_slab: usize,
    next_z: usize,
}

impl<'a> WriteSliceState<'a> {
    pub fn new(engine: &'a RegionEngine, level: usize) -> Result<Self, RegionError> {
        let dims = engine.level_dims(level);
        let slab_height = engine.brick_size_z();
        Ok(WriteSliceState {
            engine,
            level,
            dims,
            slab_height,
            slab: vec![0.0; dims[0] * dims[1] * slab_height],
            slices_in_slab: 0,
            next_z: 0,
        })
    }

    /// `slice` must contain exactly `dims.x * dims.y` values for one XY
    /// plane. Flushes a full brick-row once `brick_size.z` slices have
    /// accumulated.
    pub fn write_slice(&mut self, writer: &mut VariableWriter, slice: &[f64]) -> Result<(), RegionError> {
        let plane = self.dims[0] * self.dims[1];
        if slice.len() != plane {
            return Err(RegionError::InvalidParam("write_slice: slice size mismatch".to_string()));
        }
        let off = self.slices_in_slab * plane;
        self.slab[off..off + plane].copy_from_slice(slice);
        self.slices_in_slab += 1;
        self.next_z += 1;
        if self.slices_in_slab == self.slab_height {
            self.flush_slab(writer)?;
        }
        Ok(())
    }

    fn flush_slab(&mut self, writer: &mut VariableWriter) -> Result<(), RegionError> {
        let bk = (self.next_z - self.slices_in_slab) / self.slab_height;
        debug!("writeSlice: flushing slab bk={}", bk);
        self.engine.write_brick_row(writer, self.level, bk, &self.slab, self.slab_height)?;
        self.slab.iter_mut().for_each(|v| *v = 0.0);
        self.slices_in_slab = 0;
        Ok(())
    }

    /// Closes the stream; if `Nz` was not a multiple of `brick_size.z`, the
    /// final partial slab is zero-padded and flushed.
    pub fn close(mut self, writer: &mut VariableWriter) -> Result<(), RegionError> {
        if self.slices_in_slab > 0 {
            self.flush_slab(writer)?;
        }
        Ok(())
    }
}

/// Streaming read state for `ReadSlice`: decodes one Z-row of bricks at a
/// time and yields one XY slice per call.
pub struct ReadSliceState<'a> {
    engine: &'a RegionEngine,
    level: usize,
    lod: usize,
    dims: [usize; 3],
    slab: Vec<f64>,
    cursor: usize,
    next_z: usize,
}

impl<'a> ReadSliceState<'a> {
    pub fn new(engine: &'a RegionEngine, level: usize, lod: usize) -> Self {
        let dims = engine.level_dims(level);
        ReadSliceState { engine, level, lod, dims, slab: Vec::new(), cursor: 0, next_z: 0 }
    }

    pub fn next_slice(&mut self, reader: &mut VariableReader) -> Result<Option<Vec<f64>>, RegionError> {
        if self.next_z >= self.dims[2] {
            return Ok(None);
        }
        let plane = self.dims[0] * self.dims[1];
        if self.cursor >= self.slab.len() {
            let height = self.engine.brick_size_z().min(self.dims[2] - self.next_z);
            let bk = self.next_z / self.engine.brick_size_z();
            let region = self.engine.read_slab_at(reader, self.level, self.lod, bk, height)?;
            self.slab = region;
            self.cursor = 0;
        }
        let out = self.slab[self.cursor..self.cursor + plane].to_vec();
        self.cursor += plane;
        self.next_z += 1;
        Ok(Some(out))
    }
}

impl RegionEngine {
    fn brick_size_z(&self) -> usize {
        self.brick_size()[2]
    }

    fn read_slab_at(&self, reader: &mut VariableReader, level: usize, lod: usize, bk: usize, height: usize) -> Result<Vec<f64>, RegionError> {
        let dims = self.level_dims(level);
        let z0 = bk * self.brick_size_z();
        let z1 = (z0 + height).min(dims[2]);
        let region = self.read_region(reader, level, lod, [0, 0, z0], [dims[0], dims[1], z1])?;
        Ok(region.data)
    }
}
