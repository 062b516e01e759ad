/// Forward Haar transform. Returns `(lambda, gamma)`: lambda holds
/// `ceil(n/2)` low-pass averages, gamma holds `floor(n/2)` differences. For
/// odd `n` the trailing lambda sample is computed so the transform
/// preserves the input mean exactly (see `WaveletBlock1D`'s
/// `forward_transform1d_haar`).
pub fn forward_haar(x: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = x.len();
    let pairs = n / 2;
    let odd = n % 2 == 1;
    let mut lambda = Vec::with_capacity(pairs + if odd { 1 } else { 0 });
    let mut gamma = Vec::with_capacity(pairs);
    for i in 0..pairs {
        let a = x[2 * i];
        let b = x[2 * i + 1];
        let g = b - a;
        let l = a + g / 2.0;
        lambda.push(l);
        gamma.push(g);
    }
    if odd {
        // lambda_last = N * mean(x) - sum(other lambda), which simplifies to
        // lambda_last = sum(other lambda) + x[n-1] since the paired lambdas
        // each average one pair and those pairs cover every sample but the
        // last.
        let other_sum: f64 = lambda.iter().sum();
        lambda.push(other_sum + x[n - 1]);
    }
    (lambda, gamma)
}

/// Inverse of `forward_haar`.
pub fn inverse_haar(lambda: &[f64], gamma: &[f64]) -> Vec<f64> {
    let pairs = gamma.len();
    let odd = lambda.len() == pairs + 1;
    let n = 2 * pairs + if odd { 1 } else { 0 };
    let mut x = vec![0.0f64; n];
    for i in 0..pairs {
        let g = gamma[i];
        let l = lambda[i];
        let a = l - g / 2.0;
        let b = a + g;
        x[2 * i] = a;
        x[2 * i + 1] = b;
    }
    if odd {
        let other_sum: f64 = lambda[..pairs].iter().sum();
        x[n - 1] = lambda[pairs] - other_sum;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_even() {
        let x = vec![1.0, 2.0, 5.0, 4.0];
        let (l, g) = forward_haar(&x);
        let back = inverse_haar(&l, &g);
        for (a, b) in x.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn round_trip_odd_preserves_mean() {
        let x = vec![1.0, 2.0, 5.0, 4.0, 9.0];
        let (l, g) = forward_haar(&x);
        let back = inverse_haar(&l, &g);
        for (a, b) in x.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn constant_field_is_fixed_point() {
        let x = vec![7.5; 8];
        let (l, g) = forward_haar(&x);
        assert!(g.iter().all(|&v| v.abs() < 1e-12));
        let back = inverse_haar(&l, &g);
        for v in back {
            assert!((v - 7.5).abs() < 1e-12);
        }
    }
}
