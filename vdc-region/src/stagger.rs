/// Which axis of a source variable is staggered (`N+1` samples instead of
/// the unstaggered grid's `N`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaggerAxis {
    X,
    Y,
    Z,
}

/// Averages adjacent pairs along `axis` to collapse an `(N+1)`-sample
/// staggered field down to the `N`-sample unstaggered field that gets
/// encoded. Run before encoding; the collapse is recorded in metadata so
/// it is not repeated on read (§4.6).
pub fn unstagger(values: &[f64], dims: [usize; 3], axis: StaggerAxis) -> (Vec<f64>, [usize; 3]) {
    let (nx, ny, nz) = (dims[0], dims[1], dims[2]);
    let mut out_dims = dims;
    let a = match axis {
        StaggerAxis::X => 0,
        StaggerAxis::Y => 1,
        StaggerAxis::Z => 2,
    };
    out_dims[a] = dims[a].saturating_sub(1).max(1);
    let (onx, ony, onz) = (out_dims[0], out_dims[1], out_dims[2]);
    let mut out = vec![0.0; onx * ony * onz];
    let src = |i: usize, j: usize, k: usize| values[(k * ny + j) * nx + i];
    for k in 0..onz {
        for j in 0..ony {
            for i in 0..onx {
                let v = match axis {
                    StaggerAxis::X => (src(i, j, k) + src(i + 1, j, k)) * 0.5,
                    StaggerAxis::Y => (src(i, j, k) + src(i, j + 1, k)) * 0.5,
                    StaggerAxis::Z => (src(i, j, k) + src(i, j, k + 1)) * 0.5,
                };
                out[(k * ony + j) * onx + i] = v;
            }
        }
    }
    (out, out_dims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unstaggers_x_axis_by_averaging_adjacent_pairs() {
        // 3x1x1 staggered -> 2x1x1 unstaggered
        let (out, dims) = unstagger(&[0.0, 2.0, 4.0], [3, 1, 1], StaggerAxis::X);
        assert_eq!(dims, [2, 1, 1]);
        assert_eq!(out, vec![1.0, 3.0]);
    }

    #[test]
    fn unstaggers_z_axis() {
        let vals = vec![0.0, 0.0, 2.0, 2.0, 4.0, 4.0]; // 2x1x3
        let (out, dims) = unstagger(&vals, [2, 1, 3], StaggerAxis::Z);
        assert_eq!(dims, [2, 1, 2]);
        assert_eq!(out, vec![1.0, 1.0, 3.0, 3.0]);
    }
}
