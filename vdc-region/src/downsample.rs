/// Box-filters `values` down to half resolution per axis (floored, clamped
/// to a minimum of one sample), the derivation step `RegionEngine::write_levels`
/// cascades to populate every coarser VDC refinement level from the finest
/// one. An axis already at one sample passes through unchanged. `missing`
/// voxels are excluded from the average; an output voxel whose entire
/// source block is missing is itself written as missing.
pub fn downsample_half(values: &[f64], dims: [usize; 3], missing: Option<f64>) -> (Vec<f64>, [usize; 3]) {
    let mut out_dims = [0usize; 3];
    let mut sources: [Vec<Vec<usize>>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for a in 0..3 {
        let n = dims[a];
        if n <= 1 {
            out_dims[a] = 1;
            sources[a] = vec![vec![0]];
        } else {
            let out_n = n >> 1;
            out_dims[a] = out_n;
            sources[a] = (0..out_n).map(|o| vec![2 * o, 2 * o + 1]).collect();
        }
    }

    let (nx, ny) = (dims[0], dims[1]);
    let idx = |i: usize, j: usize, k: usize| (k * ny + j) * nx + i;
    let mut out = vec![0.0; out_dims[0] * out_dims[1] * out_dims[2]];
    for ok in 0..out_dims[2] {
        for oj in 0..out_dims[1] {
            for oi in 0..out_dims[0] {
                let mut sum = 0.0;
                let mut count = 0usize;
                for &k in &sources[2][ok] {
                    for &j in &sources[1][oj] {
                        for &i in &sources[0][oi] {
                            let v = values[idx(i, j, k)];
                            if missing != Some(v) {
                                sum += v;
                                count += 1;
                            }
                        }
                    }
                }
                let out_idx = (ok * out_dims[1] + oj) * out_dims[0] + oi;
                out[out_idx] = if count > 0 { sum / count as f64 } else { missing.unwrap_or(0.0) };
            }
        }
    }
    (out, out_dims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_every_axis_of_a_constant_field() {
        let values = vec![5.0f64; 4 * 4 * 4];
        let (out, dims) = downsample_half(&values, [4, 4, 4], None);
        assert_eq!(dims, [2, 2, 2]);
        assert!(out.iter().all(|&v| (v - 5.0).abs() < 1e-12));
    }

    #[test]
    fn averages_a_2x1x1_block_pair() {
        let (out, dims) = downsample_half(&[1.0, 3.0, 5.0, 7.0], [4, 1, 1], None);
        assert_eq!(dims, [2, 1, 1]);
        assert_eq!(out, vec![2.0, 6.0]);
    }

    #[test]
    fn degenerate_axis_passes_through_unchanged() {
        let (out, dims) = downsample_half(&[1.0, 2.0, 3.0, 4.0], [2, 2, 1], None);
        assert_eq!(dims, [1, 1, 1]);
        assert_eq!(out, vec![2.5]);
    }

    #[test]
    fn missing_voxels_are_excluded_from_the_average_and_propagate_if_all_missing() {
        let missing = -9999.0;
        let (out, _) = downsample_half(&[1.0, missing, missing, missing], [4, 1, 1], Some(missing));
        assert_eq!(out[0], 1.0);
        let (out2, _) = downsample_half(&[missing, missing], [2, 1, 1], Some(missing));
        assert_eq!(out2[0], missing);
    }
}
