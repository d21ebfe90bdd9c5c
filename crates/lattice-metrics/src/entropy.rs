//! Histogram-based spatial entropy.

use crate::NORM_EPS;

/// Default number of histogram bins over `[0, 1]`.
pub const DEFAULT_ENTROPY_BINS: usize = 32;

/// Shannon entropy of the value histogram over `[0, 1]`, normalized by
/// `log2(bins)` so a uniform spread scores 1.0.
///
/// Values outside `[0, 1]` (and NaN) are not counted; exactly 1.0 lands in
/// the last bin.
pub fn spatial_entropy(values: &[f64], bins: usize) -> f64 {
    if bins < 2 || values.is_empty() {
        return 0.0;
    }
    let mut hist = vec![0u64; bins];
    for &v in values {
        if !(0.0..=1.0).contains(&v) {
            continue;
        }
        let idx = ((v * bins as f64) as usize).min(bins - 1);
        hist[idx] += 1;
    }
    let total: u64 = hist.iter().sum();
    let denom = total as f64 + NORM_EPS;

    let mut h = 0.0;
    for &c in &hist {
        if c > 0 {
            let p = c as f64 / denom;
            h -= p * p.log2();
        }
    }
    h / (bins as f64).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_field_zero_entropy() {
        let h = spatial_entropy(&[0.5; 1000], DEFAULT_ENTROPY_BINS);
        assert!(h.abs() < 1e-9);
    }

    #[test]
    fn test_uniform_spread_near_one() {
        let values: Vec<f64> = (0..3200).map(|i| (i as f64 + 0.5) / 3200.0).collect();
        let h = spatial_entropy(&values, DEFAULT_ENTROPY_BINS);
        assert!((h - 1.0).abs() < 1e-6, "h = {h}");
    }

    #[test]
    fn test_two_spikes_half() {
        // Two equally populated bins out of 4 -> 1 bit / 2 bits.
        let values = [0.0, 0.0, 1.0, 1.0];
        let h = spatial_entropy(&values, 4);
        assert!((h - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_ignored() {
        assert_eq!(spatial_entropy(&[-0.5, 1.5, f64::NAN], 8), 0.0);
        assert_eq!(spatial_entropy(&[], 8), 0.0);
    }
}
