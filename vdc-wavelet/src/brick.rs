use crate::error::WaveletError;
use crate::transpose::transpose2d;
use crate::wavelet::{forward1d, inverse1d, Wavelet};
use log::{debug, trace};
use std::thread;

/// Dimensions of a brick in voxels. `nz == 1` selects the 2-D code path
/// (Z pass is skipped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrickDims {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl BrickDims {
    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_2d(&self) -> bool {
        self.nz == 1
    }
}

fn transform_line(line: &[f64], wavelet: &Wavelet, forward: bool) -> Result<Vec<f64>, WaveletError> {
    let mut out = vec![0.0; line.len()];
    if forward {
        forward1d(line, wavelet, &mut out)?;
    } else {
        inverse1d(line, wavelet, &mut out)?;
    }
    Ok(out)
}

/// Applies C1 along every X-row of a `(nz, ny, nx)` row-major buffer
/// (x contiguous). Splits the z range across `threads` scoped worker
/// threads when `threads > 1`; threads operate on disjoint z-slabs, so no
/// synchronization beyond the implicit join (the barrier called for in the
/// design notes) is required.
fn pass_x(buf: &mut [f64], dims: BrickDims, wavelet: &Wavelet, forward: bool, threads: usize) -> Result<(), WaveletError> {
    let slab_len = dims.ny * dims.nx;
    let threads = threads.max(1).min(dims.nz.max(1));
    if threads <= 1 {
        return pass_x_range(buf, dims, wavelet, forward);
    }
    let chunk_slabs = dims.nz.div_ceil(threads);
    let chunk_len = chunk_slabs * slab_len;
    let mut first_err: Option<WaveletError> = None;
    thread::scope(|scope| {
        let mut handles = Vec::new();
        for chunk in buf.chunks_mut(chunk_len) {
            let nz_chunk = chunk.len() / slab_len;
            let chunk_dims = BrickDims { nx: dims.nx, ny: dims.ny, nz: nz_chunk };
            let w = *wavelet;
            handles.push(scope.spawn(move || pass_x_range(chunk, chunk_dims, &w, forward)));
        }
        for h in handles {
            if let Err(e) = h.join().expect("wavelet worker thread panicked") {
                first_err = Some(e);
            }
        }
    });
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn pass_x_range(buf: &mut [f64], dims: BrickDims, wavelet: &Wavelet, forward: bool) -> Result<(), WaveletError> {
    for z in 0..dims.nz {
        for y in 0..dims.ny {
            let off = (z * dims.ny + y) * dims.nx;
            let row = &buf[off..off + dims.nx];
            let out = transform_line(row, wavelet, forward)?;
            buf[off..off + dims.nx].copy_from_slice(&out);
        }
    }
    Ok(())
}

/// Applies C1 along every Y-row. Swaps each z-slab into `(nx, ny)` layout
/// via the blocked transpose so the Y axis is contiguous, transforms, then
/// transposes back so the buffer stays in its canonical `(z, y, x)` layout
/// between passes.
fn pass_y(buf: &mut [f64], dims: BrickDims, wavelet: &Wavelet, forward: bool) -> Result<(), WaveletError> {
    let slab_len = dims.ny * dims.nx;
    let mut slab_t = vec![0.0; slab_len];
    for z in 0..dims.nz {
        let slab = &buf[z * slab_len..(z + 1) * slab_len];
        transpose2d(slab, &mut slab_t, dims.ny, dims.nx);
        for x in 0..dims.nx {
            let off = x * dims.ny;
            let row = &slab_t[off..off + dims.ny];
            let out = transform_line(row, wavelet, forward)?;
            slab_t[off..off + dims.ny].copy_from_slice(&out);
        }
        let slab_mut = &mut buf[z * slab_len..(z + 1) * slab_len];
        transpose2d(&slab_t, slab_mut, dims.nx, dims.ny);
    }
    Ok(())
}

/// Applies C1 along every Z-column (3-D bricks only). Columns are strided
/// (stride `ny*nx`) so they are gathered/scattered directly rather than
/// through `transpose2d`.
fn pass_z(buf: &mut [f64], dims: BrickDims, wavelet: &Wavelet, forward: bool) -> Result<(), WaveletError> {
    let slab_len = dims.ny * dims.nx;
    let mut col = vec![0.0; dims.nz];
    for y in 0..dims.ny {
        for x in 0..dims.nx {
            let base = y * dims.nx + x;
            for z in 0..dims.nz {
                col[z] = buf[z * slab_len + base];
            }
            let out = transform_line(&col, wavelet, forward)?;
            for z in 0..dims.nz {
                buf[z * slab_len + base] = out[z];
            }
        }
    }
    Ok(())
}

/// One-level separable forward transform over a brick. See module docs for
/// the pass ordering; inversion undoes passes in reverse order.
pub fn forward_level(buf: &[f64], dims: BrickDims, wavelet: &Wavelet, threads: usize) -> Result<Vec<f64>, WaveletError> {
    if buf.len() != dims.len() {
        return Err(WaveletError::Corrupt(format!(
            "forward_level: buffer length {} does not match dims {}x{}x{}",
            buf.len(),
            dims.nx,
            dims.ny,
            dims.nz
        )));
    }
    let mut cur = buf.to_vec();
    pass_x(&mut cur, dims, wavelet, true, threads)?;
    pass_y(&mut cur, dims, wavelet, true)?;
    if !dims.is_2d() {
        pass_z(&mut cur, dims, wavelet, true)?;
    }
    trace!("forward_level dims={}x{}x{}", dims.nx, dims.ny, dims.nz);
    Ok(cur)
}

/// Inverse of `forward_level`.
pub fn inverse_level(coeffs: &[f64], dims: BrickDims, wavelet: &Wavelet, threads: usize) -> Result<Vec<f64>, WaveletError> {
    if coeffs.len() != dims.len() {
        return Err(WaveletError::Corrupt(format!(
            "inverse_level: buffer length {} does not match dims {}x{}x{}",
            coeffs.len(),
            dims.nx,
            dims.ny,
            dims.nz
        )));
    }
    let mut cur = coeffs.to_vec();
    if !dims.is_2d() {
        pass_z(&mut cur, dims, wavelet, false)?;
    }
    pass_y(&mut cur, dims, wavelet, false)?;
    pass_x(&mut cur, dims, wavelet, false, threads)?;
    Ok(cur)
}

/// Dimensions of the low-pass ("lambda") corner produced by one level of
/// `forward_level`: `ceil(n/2)` along each non-degenerate axis.
pub fn lambda_dims(dims: BrickDims) -> BrickDims {
    BrickDims {
        nx: dims.nx.div_ceil(2),
        ny: dims.ny.div_ceil(2),
        nz: if dims.nz > 1 { dims.nz.div_ceil(2) } else { 1 },
    }
}

/// Deepest intra-brick decomposition `forward_multilevel`/`inverse_multilevel`
/// can run before every axis collapses to a single lambda sample: the count
/// of `lambda_dims` halvings until a further halving would no longer shrink
/// any axis.
pub fn max_transform_levels(dims: BrickDims) -> usize {
    let mut cur = dims;
    let mut levels = 0;
    loop {
        let next = lambda_dims(cur);
        if next.nx == cur.nx && next.ny == cur.ny && next.nz == cur.nz {
            return levels;
        }
        cur = next;
        levels += 1;
    }
}

fn extract_subbox(buf: &[f64], full: BrickDims, sub: BrickDims) -> Vec<f64> {
    let mut out = Vec::with_capacity(sub.len());
    for z in 0..sub.nz {
        for y in 0..sub.ny {
            let off = (z * full.ny + y) * full.nx;
            out.extend_from_slice(&buf[off..off + sub.nx]);
        }
    }
    out
}

fn write_subbox(buf: &mut [f64], full: BrickDims, sub: BrickDims, data: &[f64]) {
    let mut it = data.chunks(sub.nx);
    for z in 0..sub.nz {
        for y in 0..sub.ny {
            let off = (z * full.ny + y) * full.nx;
            let row = it.next().expect("subbox data shorter than expected");
            buf[off..off + sub.nx].copy_from_slice(row);
        }
    }
}

/// The sequence of brick dimensions each recursion level of
/// `forward_multilevel` operates on: `region_sizes(dims, L)[0] == dims`,
/// and `region_sizes(dims, L)[i+1] == lambda_dims(region_sizes(dims, L)[i])`.
/// Used by `vdc-codec` to classify coefficients by the refinement level at
/// which they first appear.
pub fn region_sizes(dims: BrickDims, levels: usize) -> Vec<BrickDims> {
    let mut sizes = Vec::with_capacity(levels);
    let mut cur = dims;
    for _ in 0..levels {
        sizes.push(cur);
        cur = lambda_dims(cur);
        if cur.nx == 0 || cur.ny == 0 {
            break;
        }
    }
    sizes
}

/// Multi-level forward transform: each level's one-level transform is
/// applied only to the low-pass corner ("lambda sub-brick") left by the
/// previous level, per the recursion rule in the design.
pub fn forward_multilevel(buf: &[f64], dims: BrickDims, wavelet: &Wavelet, levels: usize, threads: usize) -> Result<Vec<f64>, WaveletError> {
    let mut cur = buf.to_vec();
    for sub_dims in region_sizes(dims, levels) {
        let sub = extract_subbox(&cur, dims, sub_dims);
        let transformed = forward_level(&sub, sub_dims, wavelet, threads)?;
        write_subbox(&mut cur, dims, sub_dims, &transformed);
    }
    debug!(
        "forward_multilevel dims={}x{}x{} levels={}",
        dims.nx, dims.ny, dims.nz, levels
    );
    Ok(cur)
}

/// Inverse of `forward_multilevel`.
pub fn inverse_multilevel(coeffs: &[f64], dims: BrickDims, wavelet: &Wavelet, levels: usize, threads: usize) -> Result<Vec<f64>, WaveletError> {
    let mut cur = coeffs.to_vec();
    for sub_dims in region_sizes(dims, levels).into_iter().rev() {
        let sub = extract_subbox(&cur, dims, sub_dims);
        let inv = inverse_level(&sub, sub_dims, wavelet, threads)?;
        write_subbox(&mut cur, dims, sub_dims, &inv);
    }
    Ok(cur)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_3d_single_level() {
        let w = Wavelet::by_name("bior2.2").unwrap();
        let dims = BrickDims { nx: 8, ny: 8, nz: 8 };
        let x: Vec<f64> = (0..dims.len()).map(|i| (i % 13) as f64 - 6.0).collect();
        let coeffs = forward_level(&x, dims, &w, 1).unwrap();
        let back = inverse_level(&coeffs, dims, &w, 1).unwrap();
        for (a, b) in x.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn round_trip_2d_single_level() {
        let w = Wavelet::by_name("haar").unwrap();
        let dims = BrickDims { nx: 16, ny: 16, nz: 1 };
        let x: Vec<f64> = (0..dims.len()).map(|i| i as f64 * 0.3).collect();
        let coeffs = forward_level(&x, dims, &w, 1).unwrap();
        let back = inverse_level(&coeffs, dims, &w, 1).unwrap();
        for (a, b) in x.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn round_trip_multilevel() {
        let w = Wavelet::by_name("bior2.2").unwrap();
        let dims = BrickDims { nx: 32, ny: 32, nz: 32 };
        let x: Vec<f64> = (0..dims.len()).map(|i| ((i * 7) % 29) as f64 - 14.0).collect();
        let coeffs = forward_multilevel(&x, dims, &w, 3, 1).unwrap();
        let back = inverse_multilevel(&coeffs, dims, &w, 3, 1).unwrap();
        for (a, b) in x.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn max_transform_levels_halves_until_fixed_point() {
        assert_eq!(max_transform_levels(BrickDims { nx: 4, ny: 4, nz: 4 }), 2);
        assert_eq!(max_transform_levels(BrickDims { nx: 8, ny: 8, nz: 8 }), 3);
        assert_eq!(max_transform_levels(BrickDims { nx: 16, ny: 16, nz: 1 }), 4);
        assert_eq!(max_transform_levels(BrickDims { nx: 1, ny: 1, nz: 1 }), 0);
    }

    #[test]
    fn threaded_matches_single_threaded() {
        let w = Wavelet::by_name("haar").unwrap();
        let dims = BrickDims { nx: 16, ny: 16, nz: 16 };
        let x: Vec<f64> = (0..dims.len()).map(|i| (i % 11) as f64).collect();
        let single = forward_level(&x, dims, &w, 1).unwrap();
        let multi = forward_level(&x, dims, &w, 4).unwrap();
        for (a, b) in single.iter().zip(multi.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_field_is_fixed_point_3d() {
        let w = Wavelet::by_name("bior3.3").unwrap();
        let dims = BrickDims { nx: 8, ny: 8, nz: 8 };
        let x = vec![7.5f64; dims.len()];
        let coeffs = forward_multilevel(&x, dims, &w, 2, 1).unwrap();
        let back = inverse_multilevel(&coeffs, dims, &w, 2, 1).unwrap();
        for v in back {
            assert!((v - 7.5).abs() < 1e-5);
        }
    }
}
