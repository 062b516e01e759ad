use crate::axis::GridAxis;
use crate::source::{Interp, VoxelSource};

/// Regular or stretched geometry over all three axes (layered grids, whose
/// Z axis needs an ELEVATION lookup instead of a coordinate array, are
/// `LayeredGrid` instead).
#[derive(Debug, Clone)]
pub struct Grid {
    axes: [GridAxis; 3],
    periodic: [bool; 3],
}

impl Grid {
    pub fn new(axes: [GridAxis; 3], periodic: [bool; 3]) -> Self {
        Grid { axes, periodic }
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.axes[0].len(), self.axes[1].len(), self.axes[2].len())
    }

    pub fn user_extents(&self) -> ([f64; 3], [f64; 3]) {
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for a in 0..3 {
            let (lo, hi) = self.axes[a].extent();
            min[a] = lo;
            max[a] = hi;
        }
        (min, max)
    }

    pub fn user_coordinates(&self, i: usize, j: usize, k: usize) -> (f64, f64, f64) {
        (self.axes[0].to_coord(i), self.axes[1].to_coord(j), self.axes[2].to_coord(k))
    }

    /// Floor index plus fractional offsets for `(x, y, z)`.
    pub fn ijk_index_floor(&self, x: f64, y: f64, z: f64) -> ((usize, usize, usize), (f64, f64, f64)) {
        let fx = self.axes[0].locate(x, self.periodic[0]);
        let fy = self.axes[1].locate(y, self.periodic[1]);
        let fz = self.axes[2].locate(z, self.periodic[2]);
        ((fx.index, fy.index, fz.index), (fx.frac, fy.frac, fz.frac))
    }

    pub fn get_value(&self, source: &impl VoxelSource, x: f64, y: f64, z: f64, interp: Interp) -> Option<f64> {
        let ((i0, j0, k0), (wx, wy, wz)) = self.ijk_index_floor(x, y, z);
        let (nx, ny, nz) = source.dims();
        match interp {
            Interp::Nearest => {
                let i = if wx >= 0.5 { (i0 + 1).min(nx - 1) } else { i0 };
                let j = if wy >= 0.5 { (j0 + 1).min(ny - 1) } else { j0 };
                let k = if wz >= 0.5 { (k0 + 1).min(nz - 1) } else { k0 };
                if source.is_missing(i, j, k) {
                    None
                } else {
                    Some(source.get(i, j, k))
                }
            }
            Interp::Linear => trilinear(source, nx, ny, nz, i0, j0, k0, wx, wy, wz),
        }
    }
}

pub(crate) fn trilinear(
    source: &impl VoxelSource,
    nx: usize,
    ny: usize,
    nz: usize,
    i0: usize,
    j0: usize,
    k0: usize,
    wx: f64,
    wy: f64,
    wz: f64,
) -> Option<f64> {
    let mut acc = 0.0;
    for &(di, wdx) in &[(0usize, 1.0 - wx), (1, wx)] {
        for &(dj, wdy) in &[(0usize, 1.0 - wy), (1, wy)] {
            for &(dk, wdz) in &[(0usize, 1.0 - wz), (1, wz)] {
                let ii = (i0 + di).min(nx.saturating_sub(1));
                let jj = (j0 + dj).min(ny.saturating_sub(1));
                let kk = (k0 + dk).min(nz.saturating_sub(1));
                if source.is_missing(ii, jj, kk) {
                    return None;
                }
                acc += wdx * wdy * wdz * source.get(ii, jj, kk);
            }
        }
    }
    Some(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::RegularAxis;
    use crate::source::DenseSource;

    fn cube() -> DenseSource {
        // f(i,j,k) = i + 2j + 4k over a 2x2x2 cube
        let mut vals = vec![0.0; 8];
        for k in 0..2 {
            for j in 0..2 {
                for i in 0..2 {
                    vals[(k * 2 + j) * 2 + i] = i as f64 + 2.0 * j as f64 + 4.0 * k as f64;
                }
            }
        }
        DenseSource::new(2, 2, 2, vals, None)
    }

    fn grid() -> Grid {
        Grid::new(
            [
                GridAxis::Regular(RegularAxis::new(2, 0.0, 1.0).unwrap()),
                GridAxis::Regular(RegularAxis::new(2, 0.0, 1.0).unwrap()),
                GridAxis::Regular(RegularAxis::new(2, 0.0, 1.0).unwrap()),
            ],
            [false; 3],
        )
    }

    #[test]
    fn exact_corner_matches_source() {
        let g = grid();
        let s = cube();
        let v = g.get_value(&s, 1.0, 0.0, 0.0, Interp::Linear).unwrap();
        assert!((v - 1.0).abs() < 1e-9);
    }

    #[test]
    fn midpoint_linear_is_average_of_all_corners() {
        let g = grid();
        let s = cube();
        let v = g.get_value(&s, 0.5, 0.5, 0.5, Interp::Linear).unwrap();
        let expected: f64 = (0..8).map(|n| n as f64).sum::<f64>() / 8.0;
        // f(i,j,k)=i+2j+4k over {0,1}^3 sums to the same set {0..7}
        assert!((v - expected).abs() < 1e-9);
    }

    #[test]
    fn missing_corner_propagates_in_linear_mode() {
        let g = grid();
        let mut vals = vec![0.0; 8];
        vals[0] = 99.0;
        let s = DenseSource::new(2, 2, 2, vals, Some(99.0));
        assert!(g.get_value(&s, 0.5, 0.5, 0.5, Interp::Linear).is_none());
    }

    #[test]
    fn missing_only_when_selected_corner_missing_in_nearest_mode() {
        let g = grid();
        let mut vals = vec![0.0; 8];
        vals[0] = 99.0; // corner (0,0,0)
        let s = DenseSource::new(2, 2, 2, vals, Some(99.0));
        // nearest to (0.9,0.9,0.9) selects corner (1,1,1), not missing
        assert!(g.get_value(&s, 0.9, 0.9, 0.9, Interp::Nearest).is_some());
        // nearest to (0.1,0.1,0.1) selects corner (0,0,0), missing
        assert!(g.get_value(&s, 0.1, 0.1, 0.1, Interp::Nearest).is_none());
    }

    #[test]
    fn clamps_out_of_extent_queries() {
        let g = grid();
        let s = cube();
        let v = g.get_value(&s, 50.0, 50.0, 50.0, Interp::Nearest).unwrap();
        assert!((v - 7.0).abs() < 1e-9);
    }
}
