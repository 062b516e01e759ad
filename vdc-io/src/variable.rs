use crate::brickfile::{BrickFileReader, BrickFileWriter};
use crate::error::IoLayerError;
use crate::layout::brick_file_name;
use log::info;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use vdc_codec::LodSegment;
use vdc_metadata::VdcType;

/// Holds write handles for every `(level, LOD)` file a variable-timestep
/// needs open simultaneously. VDC-1 collections have no LOD axis, so `lod`
/// is always `0` for them and only one file per level is opened.
pub struct VariableWriter {
    var: String,
    t: usize,
    vdc_type: VdcType,
    writers: HashMap<(usize, usize), BrickFileWriter>,
    min: f64,
    max: f64,
    seen_any: bool,
}

impl VariableWriter {
    /// `level_brick_counts[level]` is the number of bricks at that level;
    /// `num_lods` is `1` for VDC-1.
    pub fn create(
        dir: impl AsRef<Path>,
        var: impl Into<String>,
        t: usize,
        vdc_type: VdcType,
        level_brick_counts: &[usize],
        num_lods: usize,
    ) -> Result<Self, IoLayerError> {
        let var = var.into();
        let dir = dir.as_ref();
        let lods = if vdc_type == VdcType::Type1 { 1 } else { num_lods };
        let mut writers = HashMap::new();
        for (level, &num_bricks) in level_brick_counts.iter().enumerate() {
            for lod in 0..lods {
                let path = dir.join(brick_file_name(&var, t, level, lod, vdc_type));
                writers.insert((level, lod), BrickFileWriter::create(path, num_bricks)?);
            }
        }
        info!(
            "openVariableWrite: var={} t={} levels={} lods={}",
            var,
            level_brick_counts.len(),
            lods
        );
        Ok(VariableWriter { var, t, vdc_type, writers, min: f64::INFINITY, max: f64::NEG_INFINITY, seen_any: false })
    }

    pub fn write_bricks(&mut self, level: usize, lod: usize, segs: &[LodSegment]) -> Result<(), IoLayerError> {
        let lod = if self.vdc_type == VdcType::Type1 { 0 } else { lod };
        let w = self
            .writers
            .get_mut(&(level, lod))
            .ok_or_else(|| IoLayerError::InvalidParam(format!("no open file for level {} lod {}", level, lod)))?;
        for seg in segs {
            w.write_brick(seg)?;
        }
        Ok(())
    }

    /// Folds a raw sample value into the running data-min/max, to be
    /// flushed to the metadata file at `close`.
    pub fn observe_value(&mut self, v: f64) {
        if v.is_finite() {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
            self.seen_any = true;
        }
    }

    /// Flushes every open file's header table and returns the accumulated
    /// `(min, max)`, if any finite sample was observed.
    pub fn close(self) -> Result<Option<(f64, f64)>, IoLayerError> {
        for (_, w) in self.writers {
            w.finalize()?;
        }
        info!("closeVariable: var={} t={}", self.var, self.t);
        Ok(if self.seen_any { Some((self.min, self.max)) } else { None })
    }
}

/// Holds read handles for every `(level, LOD)` file needed to decode up to
/// the requested level/LOD, opened once at `open` time per §4.5.
pub struct VariableReader {
    readers: HashMap<(usize, usize), BrickFileReader>,
}

impl VariableReader {
    pub fn open(
        dir: impl AsRef<Path>,
        var: &str,
        t: usize,
        vdc_type: VdcType,
        num_levels: usize,
        num_lods: usize,
    ) -> Result<Self, IoLayerError> {
        let dir = dir.as_ref();
        let lods = if vdc_type == VdcType::Type1 { 1 } else { num_lods };
        let mut readers = HashMap::new();
        for level in 0..num_levels {
            for lod in 0..lods {
                let path: PathBuf = dir.join(brick_file_name(var, t, level, lod, vdc_type));
                readers.insert((level, lod), BrickFileReader::open(path)?);
            }
        }
        Ok(VariableReader { readers })
    }

    pub fn num_bricks(&self, level: usize, lod: usize) -> Result<usize, IoLayerError> {
        self.readers
            .get(&(level, lod))
            .map(|r| r.num_bricks())
            .ok_or_else(|| IoLayerError::NotAvailable(format!("level {} lod {} not open", level, lod)))
    }

    /// `seekBrick` + `readBricks` collapsed into one call: seeks directly to
    /// brick `idx` via the file's header table and reads its segment.
    pub fn read_brick(&mut self, level: usize, lod: usize, idx: usize, capacity: usize) -> Result<LodSegment, IoLayerError> {
        let r = self
            .readers
            .get_mut(&(level, lod))
            .ok_or_else(|| IoLayerError::NotAvailable(format!("level {} lod {} not open", level, lod)))?;
        r.read_brick(idx, capacity)
    }

    pub fn read_bricks(
        &mut self,
        level: usize,
        lod: usize,
        start_idx: usize,
        n: usize,
        capacity: usize,
    ) -> Result<Vec<LodSegment>, IoLayerError> {
        (start_idx..start_idx + n).map(|i| self.read_brick(level, lod, i, capacity)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdc_codec::SignificanceMap;

    fn scratch_dir(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("vdc-io-variable-test-{}-{}", std::process::id(), name));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn seg(v: f32, idx: u32, capacity: usize) -> LodSegment {
        let mut sigmap = SignificanceMap::new(capacity);
        sigmap.append(idx).unwrap();
        LodSegment { coeffs: vec![v], sigmap }
    }

    #[test]
    fn write_then_read_round_trips_across_levels_and_lods() {
        let dir = scratch_dir("rt");
        let mut w = VariableWriter::create(&dir, "u", 0, VdcType::Type2, &[2, 4], 2).unwrap();
        w.write_bricks(0, 0, &[seg(1.0, 0, 8), seg(2.0, 0, 8)]).unwrap();
        w.write_bricks(0, 1, &[seg(1.5, 1, 8), seg(2.5, 1, 8)]).unwrap();
        w.write_bricks(1, 0, &[seg(9.0, 0, 8); 4]).unwrap();
        w.observe_value(1.0);
        w.observe_value(9.0);
        let range = w.close().unwrap();
        assert_eq!(range, Some((1.0, 9.0)));

        let mut r = VariableReader::open(&dir, "u", 0, VdcType::Type2, 2, 2).unwrap();
        assert_eq!(r.num_bricks(0, 0).unwrap(), 2);
        let b = r.read_brick(0, 1, 1, 8).unwrap();
        assert_eq!(b.coeffs, vec![2.5]);
    }

    #[test]
    fn type1_ignores_lod_axis() {
        let dir = scratch_dir("vdc1");
        let mut w = VariableWriter::create(&dir, "v", 0, VdcType::Type1, &[1], 1).unwrap();
        w.write_bricks(0, 0, &[seg(4.0, 2, 16)]).unwrap();
        w.close().unwrap().unwrap();

        let mut r = VariableReader::open(&dir, "v", 0, VdcType::Type1, 1, 1).unwrap();
        let b = r.read_brick(0, 0, 0, 16).unwrap();
        assert_eq!(b.coeffs, vec![4.0]);
    }
}
