//! A source sentinel must be rewritten to the collection's own missing
//! value before encoding, with every rewritten voxel recorded in a
//! `MissingMask` that a later reader can reproduce independently of which
//! sub-box it asks for.

use std::path::PathBuf;
use vdc_io::{VariableReader, VariableWriter};
use vdc_metadata::VdcType;
use vdc_region::{rewrite_sentinel, MissingMask, RegionEngine};
use vdc_wavelet::Wavelet;

fn scratch_dir(name: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("vdc-region-it-{}-{}", std::process::id(), name));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn sentinel_voxels_survive_as_the_vdc_missing_value_and_are_masked() {
    const SOURCE_SENTINEL: f64 = -9999.0;
    const VDC_MISSING: f64 = -8888.0;

    let w = Wavelet::by_name("haar").unwrap();
    let e = RegionEngine::new(w, [4, 4, 4], [4, 4, 4], 1, vec![1], 1).unwrap();
    let dims = e.level_dims(0);
    let n = dims[0] * dims[1] * dims[2];

    let mut values = vec![1.0f64; n];
    // mark half the voxels (every other one along x) with the source sentinel.
    for k in 0..dims[2] {
        for j in 0..dims[1] {
            for i in (0..dims[0]).step_by(2) {
                values[(k * dims[1] + j) * dims[0] + i] = SOURCE_SENTINEL;
            }
        }
    }

    let mut mask = MissingMask::new(dims);
    rewrite_sentinel(&mut values, dims, [0, 0, 0], SOURCE_SENTINEL, VDC_MISSING, &mut mask);
    for v in &values {
        assert!(*v == 1.0 || *v == VDC_MISSING);
    }
    assert!(mask.get(0, 0, 0));
    assert!(!mask.get(1, 0, 0));

    let dir = scratch_dir("missing");
    let mut writer = VariableWriter::create(&dir, "p", 0, VdcType::Type2, &e.level_brick_counts(), 1).unwrap();
    e.write_full_level(&mut writer, 0, &values, dims).unwrap();
    writer.close().unwrap();

    let mut reader = VariableReader::open(&dir, "p", 0, VdcType::Type2, 1, 1).unwrap();
    let region = e.read_region(&mut reader, 0, 0, [0, 0, 0], dims).unwrap();
    for k in 0..dims[2] {
        for j in 0..dims[1] {
            for i in 0..dims[0] {
                let expected = if i % 2 == 0 { VDC_MISSING } else { 1.0 };
                assert!((region.get(i, j, k) - expected).abs() < 1.0, "voxel ({},{},{}) should read back as {}", i, j, k, expected);
            }
        }
    }
}
