use crate::axis::GridAxis;
use crate::source::{Interp, VoxelSource};

/// X/Y vary as a regular or stretched axis; Z is not a coordinate array but
/// a per-`(i,j)` lookup into an ELEVATION field living in the same region,
/// assumed monotonically increasing along `k` (§4.11). Column-local Z
/// interpolation is resolved first (1-D, within one `(i,j)` elevation
/// profile), then the four XY corners are bilinearly blended — a
/// two-stage simplification of full trilinear blending across
/// heterogeneous per-column Z profiles.
#[derive(Debug, Clone)]
pub struct LayeredGrid {
    x_axis: GridAxis,
    y_axis: GridAxis,
    periodic_xy: [bool; 2],
    nz: usize,
}

impl LayeredGrid {
    pub fn new(x_axis: GridAxis, y_axis: GridAxis, periodic_xy: [bool; 2], nz: usize) -> Self {
        LayeredGrid { x_axis, y_axis, periodic_xy, nz }
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.x_axis.len(), self.y_axis.len(), self.nz)
    }

    pub fn user_extents_xy(&self) -> ([f64; 2], [f64; 2]) {
        let (xlo, xhi) = self.x_axis.extent();
        let (ylo, yhi) = self.y_axis.extent();
        ([xlo, ylo], [xhi, yhi])
    }

    /// Binary search along column `(i, j)`'s elevation profile, which is
    /// read live rather than materialized, since every `(i, j)` has its own
    /// profile.
    fn locate_column(&self, elevation: &impl VoxelSource, i: usize, j: usize, z: f64) -> Option<(usize, f64)> {
        if self.nz == 0 {
            return None;
        }
        if self.nz == 1 {
            return Some((0, 0.0));
        }
        let first = elevation.get(i, j, 0);
        let last = elevation.get(i, j, self.nz - 1);
        if z <= first {
            return Some((0, 0.0));
        }
        if z >= last {
            return Some((self.nz - 2, 1.0));
        }
        let (mut lo, mut hi) = (0usize, self.nz - 1);
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if elevation.get(i, j, mid) <= z {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let denom = elevation.get(i, j, hi) - elevation.get(i, j, lo);
        let frac = if denom > 0.0 { (z - elevation.get(i, j, lo)) / denom } else { 0.0 };
        Some((lo, frac))
    }

    fn column_value(&self, data: &impl VoxelSource, elevation: &impl VoxelSource, i: usize, j: usize, z: f64) -> Option<f64> {
        let (k0, wz) = self.locate_column(elevation, i, j, z)?;
        let k1 = (k0 + 1).min(self.nz - 1);
        if elevation.is_missing(i, j, k0) || elevation.is_missing(i, j, k1) {
            return None;
        }
        if data.is_missing(i, j, k0) || data.is_missing(i, j, k1) {
            return None;
        }
        Some(data.get(i, j, k0) * (1.0 - wz) + data.get(i, j, k1) * wz)
    }

    pub fn get_value(
        &self,
        data: &impl VoxelSource,
        elevation: &impl VoxelSource,
        x: f64,
        y: f64,
        z: f64,
        interp: Interp,
    ) -> Option<f64> {
        let fx = self.x_axis.locate(x, self.periodic_xy[0]);
        let fy = self.y_axis.locate(y, self.periodic_xy[1]);
        let (nx, ny, _) = self.dims();
        match interp {
            Interp::Nearest => {
                let i = if fx.frac >= 0.5 { (fx.index + 1).min(nx - 1) } else { fx.index };
                let j = if fy.frac >= 0.5 { (fy.index + 1).min(ny - 1) } else { fy.index };
                self.column_value(data, elevation, i, j, z)
            }
            Interp::Linear => {
                let i0 = fx.index;
                let i1 = (i0 + 1).min(nx - 1);
                let j0 = fy.index;
                let j1 = (j0 + 1).min(ny - 1);
                let v00 = self.column_value(data, elevation, i0, j0, z)?;
                let v10 = self.column_value(data, elevation, i1, j0, z)?;
                let v01 = self.column_value(data, elevation, i0, j1, z)?;
                let v11 = self.column_value(data, elevation, i1, j1, z)?;
                let wx = fx.frac;
                let wy = fy.frac;
                Some(
                    v00 * (1.0 - wx) * (1.0 - wy)
                        + v10 * wx * (1.0 - wy)
                        + v01 * (1.0 - wx) * wy
                        + v11 * wx * wy,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::RegularAxis;
    use crate::source::DenseSource;

    // 2x1x4 grid; ELEVATION at column i=0: [0,1,3,7], at i=1: [0,2,4,6]
    fn elevation() -> DenseSource {
        DenseSource::new(2, 1, 4, vec![0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 7.0, 6.0], None)
    }

    fn data() -> DenseSource {
        // data = k index, independent of i for simplicity
        DenseSource::new(2, 1, 4, vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0], None)
    }

    fn grid() -> LayeredGrid {
        LayeredGrid::new(
            GridAxis::Regular(RegularAxis::new(2, 0.0, 1.0).unwrap()),
            GridAxis::Regular(RegularAxis::new(1, 0.0, 0.0).unwrap()),
            [false, false],
            4,
        )
    }

    #[test]
    fn exact_elevation_match_returns_exact_data() {
        let g = grid();
        let v = g.get_value(&data(), &elevation(), 0.0, 0.0, 3.0, Interp::Nearest).unwrap();
        assert!((v - 2.0).abs() < 1e-9);
    }

    #[test]
    fn interpolates_between_elevation_slices() {
        let g = grid();
        // at i=0, z=5 is between elevation[2]=3 (k=2) and elevation[3]=7 (k=3), frac=0.5
        let v = g.get_value(&data(), &elevation(), 0.0, 0.0, 5.0, Interp::Nearest).unwrap();
        assert!((v - 2.5).abs() < 1e-9);
    }

    #[test]
    fn missing_elevation_or_data_propagates() {
        let g = grid();
        let mut vals = vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0];
        vals[6] = 9999.0;
        let missing_data = DenseSource::new(2, 1, 4, vals, Some(9999.0));
        let v = g.get_value(&missing_data, &elevation(), 0.0, 0.0, 6.5, Interp::Nearest);
        assert!(v.is_none());
    }
}
