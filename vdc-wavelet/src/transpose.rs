/// Cache-blocked transpose of a `rows x cols` matrix stored row-major in
/// `src`, written row-major (`cols x rows`) into `dst`. Ported from the
/// 32-element blocking used by `Transpose.h`.
const BLOCK_SIZE: usize = 32;

pub fn transpose2d(src: &[f64], dst: &mut [f64], rows: usize, cols: usize) {
    debug_assert_eq!(src.len(), rows * cols);
    debug_assert_eq!(dst.len(), rows * cols);
    let mut bi = 0;
    while bi < rows {
        let imax = (bi + BLOCK_SIZE).min(rows);
        let mut bj = 0;
        while bj < cols {
            let jmax = (bj + BLOCK_SIZE).min(cols);
            for i in bi..imax {
                for j in bj..jmax {
                    dst[j * rows + i] = src[i * cols + j];
                }
            }
            bj += BLOCK_SIZE;
        }
        bi += BLOCK_SIZE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transposes_rectangular() {
        let rows = 3;
        let cols = 5;
        let src: Vec<f64> = (0..rows * cols).map(|i| i as f64).collect();
        let mut dst = vec![0.0; rows * cols];
        transpose2d(&src, &mut dst, rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                assert_eq!(dst[j * rows + i], src[i * cols + j]);
            }
        }
    }

    #[test]
    fn transpose_twice_is_identity() {
        let rows = 40;
        let cols = 40;
        let src: Vec<f64> = (0..rows * cols).map(|i| (i % 17) as f64).collect();
        let mut mid = vec![0.0; rows * cols];
        transpose2d(&src, &mut mid, rows, cols);
        let mut back = vec![0.0; rows * cols];
        transpose2d(&mid, &mut back, cols, rows);
        assert_eq!(src, back);
    }
}
