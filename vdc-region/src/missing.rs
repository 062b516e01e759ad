/// A persistent per-voxel missing-value bitmask for one variable/timestep,
/// sized to a level's full grid regardless of which sub-box was last
/// touched, so readers can reproduce masks independent of whether a
/// particular slab actually contained sentinel values.
#[derive(Debug, Clone)]
pub struct MissingMask {
    dims: [usize; 3],
    bits: Vec<u64>,
}

impl MissingMask {
    pub fn new(dims: [usize; 3]) -> Self {
        let n = dims[0] * dims[1] * dims[2];
        MissingMask { dims, bits: vec![0u64; n.div_ceil(64)] }
    }

    fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.dims[1] + j) * self.dims[0] + i
    }

    pub fn set(&mut self, i: usize, j: usize, k: usize, missing: bool) {
        let idx = self.index(i, j, k);
        let (word, bit) = (idx / 64, idx % 64);
        if missing {
            self.bits[word] |= 1 << bit;
        } else {
            self.bits[word] &= !(1 << bit);
        }
    }

    pub fn get(&self, i: usize, j: usize, k: usize) -> bool {
        let idx = self.index(i, j, k);
        let (word, bit) = (idx / 64, idx % 64);
        self.bits[word] & (1 << bit) != 0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    pub fn from_bytes(dims: [usize; 3], bytes: &[u8]) -> Self {
        let n = dims[0] * dims[1] * dims[2];
        let nwords = n.div_ceil(64);
        let mut bits = vec![0u64; nwords];
        for (i, b) in bits.iter_mut().enumerate() {
            let off = i * 8;
            if off + 8 <= bytes.len() {
                *b = u64::from_le_bytes(bytes[off..off + 8].try_into().unwrap());
            }
        }
        MissingMask { dims, bits }
    }
}

/// Rewrites any voxel equal to `source_sentinel` to `vdc_sentinel` in
/// place, recording each rewritten position in `mask`. `base` is the
/// voxel-space origin of `values` within the mask's full grid.
pub fn rewrite_sentinel(
    values: &mut [f64],
    dims: [usize; 3],
    base: [usize; 3],
    source_sentinel: f64,
    vdc_sentinel: f64,
    mask: &mut MissingMask,
) {
    let mut lin = 0;
    for k in 0..dims[2] {
        for j in 0..dims[1] {
            for i in 0..dims[0] {
                if values[lin] == source_sentinel {
                    values[lin] = vdc_sentinel;
                    mask.set(base[0] + i, base[1] + j, base[2] + k, true);
                }
                lin += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let mut m = MissingMask::new([4, 4, 4]);
        m.set(1, 2, 3, true);
        assert!(m.get(1, 2, 3));
        assert!(!m.get(0, 0, 0));
        m.set(1, 2, 3, false);
        assert!(!m.get(1, 2, 3));
    }

    #[test]
    fn to_bytes_from_bytes_round_trips() {
        let mut m = MissingMask::new([10, 10, 10]);
        m.set(5, 5, 5, true);
        m.set(0, 0, 9, true);
        let bytes = m.to_bytes();
        let m2 = MissingMask::from_bytes([10, 10, 10], &bytes);
        assert!(m2.get(5, 5, 5));
        assert!(m2.get(0, 0, 9));
        assert!(!m2.get(1, 1, 1));
    }

    #[test]
    fn rewrite_sentinel_rewrites_matching_values_and_marks_mask() {
        let mut values = vec![1.0, 1e37, 3.0, 1e37];
        let mut mask = MissingMask::new([4, 1, 1]);
        rewrite_sentinel(&mut values, [4, 1, 1], [0, 0, 0], 1e37, -9999.0, &mut mask);
        assert_eq!(values, vec![1.0, -9999.0, 3.0, -9999.0]);
        assert!(mask.get(1, 0, 0));
        assert!(mask.get(3, 0, 0));
        assert!(!mask.get(0, 0, 0));
    }
}
