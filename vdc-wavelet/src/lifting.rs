use crate::extension::{extend_index, Extension};

/// Offsets (relative to the sample being predicted/updated) for an `n`-tap
/// Deslauriers-Dubuc interpolating-subdivision filter, centered so that an
/// even `n` straddles the midpoint symmetrically.
fn tap_offsets(n: usize) -> Vec<isize> {
    let half = n as isize / 2;
    (-(half - 1)..=half).collect()
}

/// Lagrange-interpolation weights for evaluating the unique degree-`(n-1)`
/// polynomial through `n` equally spaced integer points at the half-integer
/// midpoint `x = 0.5`. This is the generic construction behind the classic
/// named biorthogonal filters: `n=2` yields `[0.5, 0.5]` (the 5/3 predict
/// filter), `n=4` yields `[-1/16, 9/16, 9/16, -1/16]` (the 9/7-family
/// 4-point interpolation filter).
pub fn lagrange_midpoint_coeffs(n: usize) -> Vec<f64> {
    let offsets = tap_offsets(n);
    let x = 0.5f64;
    let mut coeffs = vec![0.0f64; n];
    for (k, &xk_off) in offsets.iter().enumerate() {
        let xk = xk_off as f64;
        let mut num = 1.0f64;
        let mut den = 1.0f64;
        for (j, &xj_off) in offsets.iter().enumerate() {
            if j == k {
                continue;
            }
            let xj = xj_off as f64;
            num *= x - xj;
            den *= xk - xj;
        }
        coeffs[k] = num / den;
    }
    coeffs
}

/// One lifting stage: predicts `dst[i]` from `n` taps of `src`, either
/// subtracting (predict step, `sign = -1`) or adding (update step,
/// `sign = +1`) the weighted sum.
///
/// `src` is indexed relative to `dst`'s index space (predict reads evens to
/// produce odds; update reads the freshly produced odds to correct evens).
pub fn lift_pass(dst: &mut [f64], src: &[f64], coeffs: &[f64], sign: f64, mode: Extension) {
    let offsets = tap_offsets(coeffs.len());
    for (i, d) in dst.iter_mut().enumerate() {
        let mut acc = 0.0f64;
        for (k, &off) in offsets.iter().enumerate() {
            let idx = extend_index(i as isize + off, src.len(), mode);
            acc += coeffs[k] * src[idx];
        }
        *d += sign * acc;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_tap_matches_five_three() {
        let c = lagrange_midpoint_coeffs(2);
        assert!((c[0] - 0.5).abs() < 1e-12);
        assert!((c[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn four_tap_matches_known_constants() {
        let c = lagrange_midpoint_coeffs(4);
        let expected = [-1.0 / 16.0, 9.0 / 16.0, 9.0 / 16.0, -1.0 / 16.0];
        for (a, b) in c.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
