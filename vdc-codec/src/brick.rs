use crate::error::CodecError;
use crate::sigmap::SignificanceMap;
use log::{debug, trace};
use vdc_wavelet::{lambda_dims, BrickDims, Wavelet};

/// One LOD's contribution to a brick: the newly-ranked-in coefficients plus
/// the significance map naming their positions.
#[derive(Debug, Clone)]
pub struct LodSegment {
    pub coeffs: Vec<f32>,
    pub sigmap: SignificanceMap,
}

impl LodSegment {
    /// Self-contained convenience framing (sigmap, then coefficients) used
    /// by tests and by callers that don't maintain an external length
    /// table. `vdc-io`'s on-disk layout instead records `(coeff_len,
    /// sigmap_len)` per brick in a per-level header table and stores the
    /// coefficient stream before the significance map, per DESIGN.md.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = self.sigmap.serialize();
        for v in &self.coeffs {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    pub fn from_bytes(bytes: &[u8], capacity: usize) -> Result<Self, CodecError> {
        if bytes.len() < 4 {
            return Err(CodecError::Corrupt("lod segment: truncated header".to_string()));
        }
        let count = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
        let sigmap_len = 4 + 4 * count;
        if bytes.len() < sigmap_len {
            return Err(CodecError::Corrupt("lod segment: truncated significance map".to_string()));
        }
        let sigmap = SignificanceMap::deserialize(&bytes[..sigmap_len], capacity)?;
        let coeff_bytes = &bytes[sigmap_len..];
        if coeff_bytes.len() < 4 * count {
            return Err(CodecError::Corrupt("lod segment: truncated coefficient stream".to_string()));
        }
        let mut coeffs = Vec::with_capacity(count);
        for i in 0..count {
            let off = i * 4;
            coeffs.push(f32::from_le_bytes(coeff_bytes[off..off + 4].try_into().unwrap()));
        }
        Ok(LodSegment { coeffs, sigmap })
    }
}

/// Encodes and decodes single bricks per the fixed `(wavelet, dims, levels,
/// cratios)` configuration of the collection that owns it.
pub struct BrickCodec {
    wavelet: Wavelet,
    dims: BrickDims,
    levels: usize,
    cratios: Vec<usize>,
    threads: usize,
}

impl BrickCodec {
    pub fn new(
        wavelet: Wavelet,
        dims: BrickDims,
        levels: usize,
        cratios: Vec<usize>,
        threads: usize,
    ) -> Result<Self, CodecError> {
        if cratios.is_empty() {
            return Err(CodecError::InvalidParam("cratios must be non-empty".to_string()));
        }
        if cratios[0] != 1 {
            return Err(CodecError::InvalidParam("cratios[0] must be 1".to_string()));
        }
        for w in cratios.windows(2) {
            if w[1] <= w[0] {
                return Err(CodecError::InvalidParam("cratios must be strictly increasing".to_string()));
            }
        }
        let n = dims.len();
        if let Some(&last) = cratios.last() {
            if last > n {
                return Err(CodecError::InvalidParam(format!(
                    "cratios contains {} which exceeds the maximum achievable ratio {}",
                    last, n
                )));
            }
        }
        Ok(BrickCodec {
            wavelet,
            dims,
            levels,
            cratios,
            threads,
        })
    }

    /// Maximum achievable compression ratio for this brick's size: the
    /// point at which only the DC coefficient is retained.
    pub fn max_compression_ratio(&self) -> usize {
        self.dims.len()
    }

    pub fn num_lods(&self) -> usize {
        self.cratios.len()
    }

    /// Configured intra-brick wavelet decomposition depth.
    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn dims(&self) -> BrickDims {
        self.dims
    }

    pub fn encode(&self, raw: &[f64]) -> Result<Vec<LodSegment>, CodecError> {
        if raw.len() != self.dims.len() {
            return Err(CodecError::InvalidParam(format!(
                "encode: brick has {} voxels, expected {}",
                raw.len(),
                self.dims.len()
            )));
        }
        let coeffs = vdc_wavelet::forward_multilevel(raw, self.dims, &self.wavelet, self.levels, self.threads)?;
        let n = coeffs.len();

        let mut order: Vec<u32> = (0..n as u32).collect();
        order.sort_by(|&a, &b| {
            let ma = coeffs[a as usize].abs();
            let mb = coeffs[b as usize].abs();
            mb.partial_cmp(&ma).unwrap().then(a.cmp(&b))
        });

        let floor = 1usize.min(n);
        let mut n_prev = 0usize;
        let mut segments = Vec::with_capacity(self.cratios.len());
        // cratios is stored increasing with c1 = 1 (§3 invariant), but LOD 0
        // is the coarsest stored representation and LOD L-1 is full
        // fidelity, so the cumulative retention counts are built walking
        // the list from its largest (most compressive) ratio down to 1.
        for &c in self.cratios.iter().rev() {
            let n_l = n.div_ceil(c).max(floor).min(n);
            let delta = n_l.saturating_sub(n_prev);
            let mut sigmap = SignificanceMap::new(n);
            let mut vals = Vec::with_capacity(delta);
            for &idx in &order[n_prev..n_prev + delta] {
                sigmap.append(idx)?;
                vals.push(coeffs[idx as usize] as f32);
            }
            trace!("encode: lod with c={} retains {} new coefficients", c, delta);
            segments.push(LodSegment { coeffs: vals, sigmap });
            n_prev = n_l;
        }
        debug!(
            "encode: brick {}x{}x{} levels={} lods={}",
            self.dims.nx,
            self.dims.ny,
            self.dims.nz,
            self.levels,
            segments.len()
        );
        Ok(segments)
    }

    /// Decodes at refinement level `level` (0 = coarsest) and LOD `lod`
    /// (inclusive index into `segments`).
    pub fn decode(&self, segments: &[LodSegment], level: usize, lod: usize) -> Result<Vec<f64>, CodecError> {
        if lod >= segments.len() {
            return Err(CodecError::NotAvailable(format!(
                "requested lod {} exceeds stored {} lods",
                lod,
                segments.len()
            )));
        }
        if level > self.levels {
            return Err(CodecError::NotAvailable(format!(
                "requested level {} exceeds stored {} levels",
                level, self.levels
            )));
        }
        let n = self.dims.len();
        let mut buf = vec![0.0f64; n];
        for seg in &segments[..=lod] {
            if seg.sigmap.len() != seg.coeffs.len() {
                return Err(CodecError::Corrupt(
                    "lod segment: coefficient/significance-map length mismatch".to_string(),
                ));
            }
            for (i, idx) in seg.sigmap.iter().enumerate() {
                if idx as usize >= n {
                    return Err(CodecError::Corrupt(format!(
                        "significance map index {} out of brick range",
                        idx
                    )));
                }
                buf[idx as usize] = seg.coeffs[i] as f64;
            }
        }

        if level < self.levels {
            self.clear_finer_than(&mut buf, level);
        }

        let out = vdc_wavelet::inverse_multilevel(&buf, self.dims, &self.wavelet, self.levels, self.threads)?;
        Ok(out)
    }

    fn region_chain(&self) -> Vec<BrickDims> {
        let mut regions = vec![self.dims];
        let mut cur = self.dims;
        for _ in 0..self.levels {
            cur = lambda_dims(cur);
            regions.push(cur);
        }
        regions
    }

    fn clear_finer_than(&self, buf: &mut [f64], level: usize) {
        let regions = self.region_chain();
        let slab = self.dims.ny * self.dims.nx;
        for (lin, v) in buf.iter_mut().enumerate() {
            let z = lin / slab;
            let rem = lin % slab;
            let y = rem / self.dims.nx;
            let x = rem % self.dims.nx;
            let mut k = 0;
            for i in 1..=self.levels {
                if x < regions[i].nx && y < regions[i].ny && z < regions[i].nz {
                    k = i;
                } else {
                    break;
                }
            }
            let required_r = if k == self.levels { 0 } else { self.levels - k };
            if required_r > level {
                *v = 0.0;
            }
        }
    }

    /// Recomputes the retention-count table used by `encode`, exposed so
    /// callers (the region engine) can size buffers before encoding.
    pub fn retention_counts(&self) -> Vec<usize> {
        let n = self.dims.len();
        self.cratios.iter().rev().map(|&c| n.div_ceil(c).max(1).min(n)).collect()
    }
}
