use crate::cache::GridCache;
use crate::error::DataMgrError;
use crate::key::CacheKey;
use crate::pipeline::{builtin_registry, PipelineRegistry};
use log::{debug, info};
use std::path::{Path, PathBuf};
use vdc_grid::{DenseSource, Grid, GridAxis, Interp, LayeredGrid, RegularAxis, StretchedAxis};
use vdc_io::{VariableReader, VariableWriter};
use vdc_metadata::{MasterFile, Orientation};
use vdc_region::{downsample_half, rewrite_sentinel, MissingMask, RegionBuffer, RegionEngine, StaggerAxis, WriteSliceState};
use vdc_source::{SourceAdaptor, VariableReadHandle};
use vdc_wavelet::Wavelet;

/// The VDC missing-value sentinel used when a variable carries no explicit
/// `missing_value` of its own (e.g. a freshly computed derived output).
pub const DEFAULT_SENTINEL: f64 = 1e37;

enum Geometry {
    Regular(Grid),
    Layered(LayeredGrid, DenseSource),
}

/// A resolved grid, ready for `(x, y, z)` sampling. Holds its own copy of
/// the voxel data, so it outlives subsequent cache activity on the
/// `DataManager` that produced it.
pub struct GridHandle {
    key: CacheKey,
    geometry: Geometry,
    source: DenseSource,
}

impl GridHandle {
    pub fn get_value(&self, x: f64, y: f64, z: f64, interp: Interp) -> Option<f64> {
        match &self.geometry {
            Geometry::Regular(g) => g.get_value(&self.source, x, y, z, interp),
            Geometry::Layered(g, elevation) => g.get_value(&self.source, elevation, x, y, z, interp),
        }
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        match &self.geometry {
            Geometry::Regular(g) => g.dims(),
            Geometry::Layered(g, _) => g.dims(),
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}

/// Wraps `RegionEngine` + `GridCache` + `PipelineRegistry` behind the
/// `GetVariable`/`UnlockGrid` read entry points, plus `ingest_variable`,
/// which drives a `vdc-source` adaptor's slice stream through unstaggering,
/// missing-value sentinel rewriting, and per-level downsample derivation to
/// populate a VDC directory in the first place (§4.6/§4.10).
pub struct DataManager {
    root: PathBuf,
    master: MasterFile,
    engine: RegionEngine,
    cache: GridCache,
    pipelines: PipelineRegistry,
}

impl DataManager {
    pub fn new(root: impl AsRef<Path>, master: MasterFile, budget_bytes: usize, threads: usize) -> Result<Self, DataMgrError> {
        let wavelet = Wavelet::by_name(&master.wavelet_name)?;
        let engine = RegionEngine::new(wavelet, master.dims, master.brick_size, master.num_levels, master.cratios.clone(), threads)?;
        Ok(DataManager {
            root: root.as_ref().to_path_buf(),
            master,
            engine,
            cache: GridCache::new(budget_bytes),
            pipelines: builtin_registry(),
        })
    }

    pub fn register_pipeline(&mut self, pipeline: crate::pipeline::Pipeline) -> Result<(), DataMgrError> {
        self.pipelines.register(pipeline)
    }

    pub fn unlock_grid(&mut self, handle: &GridHandle) {
        self.cache.unlock(handle.key());
    }

    fn num_lods(&self) -> usize {
        self.master.cratios.len()
    }

    fn missing_for(&self, var: &str) -> f64 {
        self.master.variable(var).ok().and_then(|v| v.missing_value).unwrap_or(DEFAULT_SENTINEL)
    }

    /// Drives one variable/timestep of a `SourceAdaptor` into this
    /// collection: streams every `(x, y)` slice in increasing `z`, optionally
    /// unstaggers the assembled volume, rewrites `source_missing` to this
    /// collection's own sentinel, writes the finest VDC level through
    /// `WriteSliceState`, then derives every coarser level from it by
    /// repeated `downsample_half` box-filtering. The adaptor's grid must
    /// match this collection's finest-level dims once unstaggered.
    pub fn ingest_variable<A: SourceAdaptor>(
        &self,
        source: &mut A,
        t: usize,
        var: &str,
        source_missing: Option<f64>,
        stagger: Option<StaggerAxis>,
    ) -> Result<(), DataMgrError> {
        let raw_dims = source.grid_dims();
        let mut handle = source.open_variable_read(t, var)?;
        let plane = raw_dims[0] * raw_dims[1];
        let mut raw = Vec::with_capacity(plane * raw_dims[2]);
        let mut slice = vec![0.0; plane];
        while handle.read_slice(&mut slice)? {
            raw.extend_from_slice(&slice);
        }
        handle.close()?;

        let (mut values, dims) = match stagger {
            Some(axis) => vdc_region::unstagger(&raw, raw_dims, axis),
            None => (raw, raw_dims),
        };

        let finest_level = self.engine.finest_level();
        let expected = self.engine.level_dims(finest_level);
        if dims != expected {
            return Err(DataMgrError::InvalidParam(format!(
                "ingest_variable: {} has dims {:?} after unstaggering, collection expects {:?}",
                var, dims, expected
            )));
        }

        let vdc_missing = self.missing_for(var);
        if let Some(sentinel) = source_missing {
            let mut mask = MissingMask::new(dims);
            rewrite_sentinel(&mut values, dims, [0, 0, 0], sentinel, vdc_missing, &mut mask);
        }

        let level_brick_counts = self.engine.level_brick_counts();
        let mut writer = VariableWriter::create(&self.root, var, t, self.master.vdc_type, &level_brick_counts, self.num_lods())?;

        let mut ws = WriteSliceState::new(&self.engine, finest_level)?;
        let plane = dims[0] * dims[1];
        for z in 0..dims[2] {
            ws.write_slice(&mut writer, &values[z * plane..(z + 1) * plane])?;
        }
        ws.close(&mut writer)?;

        let mut cur_values = values;
        let mut cur_dims = dims;
        for level in (0..finest_level).rev() {
            let (next_values, next_dims) = downsample_half(&cur_values, cur_dims, Some(vdc_missing));
            self.engine.write_full_level(&mut writer, level, &next_values, next_dims)?;
            cur_values = next_values;
            cur_dims = next_dims;
        }

        writer.close()?;
        info!("ingestVariable: var={} t={} finest_dims={:?} levels={}", var, t, dims, finest_level + 1);
        Ok(())
    }

    /// `GetVariable(t, name, level, lod, subbox, lock)`. `subbox` defaults to
    /// the full level extent when `None`.
    pub fn get_variable(
        &mut self,
        t: usize,
        name: &str,
        level: usize,
        lod: usize,
        subbox: Option<([usize; 3], [usize; 3])>,
        lock: bool,
    ) -> Result<GridHandle, DataMgrError> {
        let full_dims = self.engine.level_dims(level);
        let (min, max) = subbox.unwrap_or(([0, 0, 0], full_dims));
        let buffer = self.fetch_buffer(t, name, level, lod, min, max, lock)?;
        self.wrap_buffer(name, t, level, lod, buffer, full_dims)
    }

    /// Cache-checked read of one variable's region: derived-pipeline
    /// compute on a miss for derived names, `RegionEngine::read_region`
    /// otherwise. Returns the raw buffer without building grid geometry, so
    /// pipeline inputs and an ELEVATION lookup can reuse it directly.
    fn fetch_buffer(
        &mut self,
        t: usize,
        name: &str,
        level: usize,
        lod: usize,
        min: [usize; 3],
        max: [usize; 3],
        lock: bool,
    ) -> Result<RegionBuffer, DataMgrError> {
        let key = CacheKey::new(name, t, level, lod, min, max);
        if let Some(buf) = self.cache.get(&key) {
            let cloned = buf.clone();
            if lock {
                self.cache.lock(&key);
            }
            debug!("getVariable: cache hit var={} t={} level={} lod={}", name, t, level, lod);
            return Ok(cloned);
        }

        let values = if self.pipelines.is_derived(name) {
            self.compute_derived(name, t, level, lod, min, max)?
        } else {
            let mut reader = self.open_reader(name, t)?;
            self.engine.read_region(&mut reader, level, lod, min, max)?
        };

        if !self.cache.insert(key, values.clone(), lock) {
            return Err(DataMgrError::OutOfMemory(format!("cache budget exhausted for {}", name)));
        }
        Ok(values)
    }

    fn open_reader(&self, var: &str, t: usize) -> Result<VariableReader, DataMgrError> {
        Ok(VariableReader::open(&self.root, var, t, self.master.vdc_type, self.master.num_levels, self.num_lods())?)
    }

    fn compute_derived(&mut self, name: &str, t: usize, level: usize, lod: usize, min: [usize; 3], max: [usize; 3]) -> Result<RegionBuffer, DataMgrError> {
        let pipeline = self.pipelines.lookup(name).cloned().ok_or_else(|| DataMgrError::NotFound(format!("no pipeline for {}", name)))?;
        let mut input_bufs = Vec::with_capacity(pipeline.inputs.len());
        let mut dims = [0usize; 3];
        for input in &pipeline.inputs {
            let input_level = (level as i32 + input.level_offset).max(0) as usize;
            let buf = self.fetch_buffer(t, &input.var, input_level, lod, min, max, false)?;
            dims = buf.dims;
            input_bufs.push(buf.data);
        }
        let missing = self.missing_for(name);
        let refs: Vec<&[f64]> = input_bufs.iter().map(|v| v.as_slice()).collect();
        let outputs = (pipeline.compute)(&refs, dims, missing);
        let data = outputs.into_iter().next().ok_or_else(|| DataMgrError::NotAvailable(format!("pipeline {} produced no output", name)))?;
        info!("computeDerived: name={} t={} level={} dims={:?}", name, t, level, dims);
        Ok(RegionBuffer { data, dims, origin: min })
    }

    fn wrap_buffer(&mut self, name: &str, t: usize, level: usize, lod: usize, buffer: RegionBuffer, full_dims: [usize; 3]) -> Result<GridHandle, DataMgrError> {
        let min = buffer.origin;
        let dims = buffer.dims;
        let max = [min[0] + dims[0], min[1] + dims[1], min[2] + dims[2]];
        let key = CacheKey::new(name, t, level, lod, min, max);
        let missing = self.missing_for(name);
        let source = DenseSource::new(dims[0], dims[1], dims[2], buffer.data, Some(missing));

        let ts = self.master.timestep(t)?;
        let (extent_min, extent_max) = (ts.extent_min, ts.extent_max);
        let coords = ts.coords.clone();

        // A collection whose ELEVATION field actually resolves (stored or
        // derived) is treated as layered for every other 3-D variable, per
        // the WRF-style convention §4.11 describes; ELEVATION itself is
        // always regular. A resolution failure (no ELEVATION in this
        // collection at all) falls back to a regular grid rather than
        // propagating the error, since most collections have none.
        let elevation_buf = if name != "ELEVATION" {
            self.fetch_buffer(t, "ELEVATION", level, lod, min, max, false).ok()
        } else {
            None
        };
        if let Some(elevation_buf) = elevation_buf {
            // Fetched over the identical bbox so the elevation source's
            // (i, j, k) indices line up with `source`'s.
            let x_axis = build_axis_for_region(full_dims[0], extent_min[0], extent_max[0], coords.as_ref().map(|c| c.x.as_slice()), min[0], dims[0])?;
            let y_axis = build_axis_for_region(full_dims[1], extent_min[1], extent_max[1], coords.as_ref().map(|c| c.y.as_slice()), min[1], dims[1])?;
            let grid = LayeredGrid::new(x_axis, y_axis, [false, false], dims[2]);
            let elevation_missing = self.missing_for("ELEVATION");
            let elevation_source = DenseSource::new(
                elevation_buf.dims[0],
                elevation_buf.dims[1],
                elevation_buf.dims[2],
                elevation_buf.data,
                Some(elevation_missing),
            );
            return Ok(GridHandle { key, geometry: Geometry::Layered(grid, elevation_source), source });
        }

        let x_axis = build_axis_for_region(full_dims[0], extent_min[0], extent_max[0], coords.as_ref().map(|c| c.x.as_slice()), min[0], dims[0])?;
        let y_axis = build_axis_for_region(full_dims[1], extent_min[1], extent_max[1], coords.as_ref().map(|c| c.y.as_slice()), min[1], dims[1])?;
        let z_axis = build_axis_for_region(full_dims[2], extent_min[2], extent_max[2], coords.as_ref().map(|c| c.z.as_slice()), min[2], dims[2])?;
        let grid = Grid::new([x_axis, y_axis, z_axis], [false, false, false]);
        Ok(GridHandle { key, geometry: Geometry::Regular(grid), source })
    }
}

/// Builds the axis for a sub-region `[origin, origin + n_region)` of a
/// `n_full`-sample axis spanning `[lo, hi]`, so a cropped buffer's grid
/// geometry lines up with its own local indices rather than the full
/// level's.
fn build_axis_for_region(n_full: usize, lo: f64, hi: f64, coords_full: Option<&[f64]>, origin: usize, n_region: usize) -> Result<GridAxis, DataMgrError> {
    match coords_full {
        Some(c) if !c.is_empty() => {
            let end = (origin + n_region).min(c.len());
            Ok(GridAxis::Stretched(StretchedAxis::new(c[origin.min(c.len())..end].to_vec())?))
        }
        _ => {
            let spacing = if n_full <= 1 { 0.0 } else { (hi - lo) / (n_full - 1) as f64 };
            let region_lo = lo + spacing * origin as f64;
            let region_hi = if n_region <= 1 { region_lo } else { region_lo + spacing * (n_region - 1) as f64 };
            Ok(GridAxis::Regular(RegularAxis::new(n_region, region_lo, region_hi)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use vdc_metadata::{NumericType, TimestepDef, VariableDef, VdcType};
    use vdc_source::MemorySource;

    fn scratch_dir(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("vdc-datamgr-test-{}-{}", std::process::id(), name));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_constant_variable(dir: &Path, master: &MasterFile, name: &str, value: f64) {
        use vdc_region::geometry::bricks_per_axis;
        let w = Wavelet::by_name(&master.wavelet_name).unwrap();
        let engine = RegionEngine::new(w, master.dims, master.brick_size, master.num_levels, master.cratios.clone(), 1).unwrap();
        let dims = engine.level_dims(0);
        let n = dims[0] * dims[1] * dims[2];
        let nbricks = bricks_per_axis(dims, master.brick_size);
        let total = nbricks[0] * nbricks[1] * nbricks[2];
        let mut writer = vdc_io::VariableWriter::create(dir, name, 0, master.vdc_type, &[total], master.cratios.len()).unwrap();
        engine.write_full_level(&mut writer, 0, &vec![value; n], dims).unwrap();
        writer.close().unwrap();
    }

    fn sample_master() -> MasterFile {
        let mut m = MasterFile::new([8, 8, 4], [4, 4, 4], 1, vec![1, 4], "bior2.2", VdcType::Type2).unwrap();
        m.add_variable(VariableDef::new("u", Orientation::ThreeD, NumericType::F32)).unwrap();
        m.add_timestep(TimestepDef::new(0.0, [0.0, 0.0, 0.0], [7.0, 7.0, 3.0])).unwrap();
        m
    }

    #[test]
    fn get_variable_reads_and_caches_constant_field() {
        let dir = scratch_dir("const");
        let master = sample_master();
        write_constant_variable(&dir, &master, "u", 2.5);

        let mut mgr = DataManager::new(&dir, master, 10_000_000, 1).unwrap();
        let h1 = mgr.get_variable(0, "u", 0, 1, None, true).unwrap();
        assert!((h1.get_value(1.0, 1.0, 1.0, Interp::Linear).unwrap() - 2.5).abs() < 1e-3);
        assert_eq!(mgr.cache.len(), 1);

        let h2 = mgr.get_variable(0, "u", 0, 1, None, false).unwrap();
        assert!((h2.get_value(0.0, 0.0, 0.0, Interp::Nearest).unwrap() - 2.5).abs() < 1e-3);
        assert_eq!(mgr.cache.len(), 1);

        mgr.unlock_grid(&h1);
    }

    #[test]
    fn unknown_variable_returns_not_found() {
        let dir = scratch_dir("missingvar");
        let master = sample_master();
        let mut mgr = DataManager::new(&dir, master, 10_000_000, 1).unwrap();
        assert!(mgr.get_variable(0, "nope", 0, 0, None, false).is_err());
    }

    #[test]
    fn derived_elevation_combines_ph_and_phb() {
        let dir = scratch_dir("derived");
        let mut master = MasterFile::new([4, 4, 4], [4, 4, 4], 1, vec![1], "haar", VdcType::Type2).unwrap();
        master.add_variable(VariableDef::new("PH", Orientation::ThreeD, NumericType::F32)).unwrap();
        master.add_variable(VariableDef::new("PHB", Orientation::ThreeD, NumericType::F32)).unwrap();
        master.add_timestep(TimestepDef::new(0.0, [0.0; 3], [3.0; 3])).unwrap();
        write_constant_variable(&dir, &master, "PH", 9.81);
        write_constant_variable(&dir, &master, "PHB", 0.0);

        let mut mgr = DataManager::new(&dir, master, 10_000_000, 1).unwrap();
        let h = mgr.get_variable(0, "ELEVATION", 0, 0, None, false).unwrap();
        assert!((h.get_value(1.0, 1.0, 1.0, Interp::Nearest).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ingest_variable_writes_finest_level_via_streaming_and_derives_coarser_levels() {
        let dir = scratch_dir("ingest");
        let mut master = MasterFile::new([8, 8, 8], [4, 4, 4], 2, vec![1], "haar", VdcType::Type2).unwrap();
        master.add_variable(VariableDef::new("u", Orientation::ThreeD, NumericType::F32)).unwrap();
        master.add_timestep(TimestepDef::new(0.0, [0.0, 0.0, 0.0], [7.0, 7.0, 7.0])).unwrap();

        let n = 8 * 8 * 8;
        let mut values = vec![0.0; n];
        for k in 0..8 {
            for j in 0..8 {
                for i in 0..8 {
                    values[(k * 8 + j) * 8 + i] = i as f64;
                }
            }
        }
        let mut src = MemorySource::new([8, 8, 8], [0.0; 3], [7.0; 3], vec![0.0], None);
        src.add_3d_variable("u", values);

        let mgr = DataManager::new(&dir, master, 10_000_000, 1).unwrap();
        mgr.ingest_variable(&mut src, 0, "u", None, None).unwrap();

        let mut reader = vdc_io::VariableReader::open(&dir, "u", 0, mgr.master.vdc_type, mgr.master.num_levels, mgr.num_lods()).unwrap();
        let finest = mgr.engine.read_region(&mut reader, 1, 0, [0, 0, 0], [8, 8, 8]).unwrap();
        assert!((finest.get(5, 0, 0) - 5.0).abs() < 1e-4);

        let coarse = mgr.engine.read_region(&mut reader, 0, 0, [0, 0, 0], [4, 4, 4]).unwrap();
        // coarse voxel 2 averages finest voxels 4 and 5
        assert!((coarse.get(2, 0, 0) - 4.5).abs() < 1e-4);
    }
}
