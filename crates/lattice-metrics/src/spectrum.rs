//! Isotropic power spectra and line-of-sight projection.

use rustfft::{FftDirection, num_complex::Complex};

use crate::fft::{fft_nd, radial_wavenumbers};
use crate::stats::normalize_unit;

/// Radially binned power spectrum.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PowerSpectrum {
    /// Bin midpoints in integer-wavenumber units.
    pub k: Vec<f64>,
    /// Mean `|F(k)|^2` per bin; 0 for bins with no modes.
    pub power: Vec<f64>,
    /// Number of Fourier modes that fell in each bin.
    pub modes: Vec<usize>,
}

impl PowerSpectrum {
    pub fn len(&self) -> usize {
        self.k.len()
    }

    pub fn is_empty(&self) -> bool {
        self.k.is_empty()
    }

    /// Index of the bin with the largest mean power.
    pub fn peak_bin(&self) -> Option<usize> {
        self.power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    }

    /// `(k, P)` rows in bin order.
    pub fn rows(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.k.iter().copied().zip(self.power.iter().copied())
    }
}

/// Evenly spaced values on `[start, stop]`, last value exact.
pub(crate) fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut out: Vec<f64> = (0..num).map(|i| start + i as f64 * step).collect();
            out[num - 1] = stop;
            out
        }
    }
}

/// Bin index of `x` given monotone `edges`, with `x == edges.last()`
/// falling outside every bin.
fn digitize(x: f64, edges: &[f64]) -> Option<usize> {
    let i = edges.partition_point(|&e| e <= x);
    if i == 0 || i >= edges.len() {
        None
    } else {
        Some(i - 1)
    }
}

/// Power spectrum of a real `n^dims` field binned by `|k|` into `bins`
/// equal-width bins spanning `[0, max |k|]`.
pub fn isotropic_power_spectrum(
    field: &[f64],
    n: usize,
    dims: usize,
    bins: usize,
) -> PowerSpectrum {
    if bins == 0 || n == 0 || field.len() != n.pow(dims as u32) {
        return PowerSpectrum::default();
    }

    let mut buffer: Vec<Complex<f64>> = field.iter().map(|&v| Complex::new(v, 0.0)).collect();
    fft_nd(&mut buffer, n, dims, FftDirection::Forward);

    let kk = radial_wavenumbers(n, dims);
    let k_max = kk.iter().copied().fold(0.0, f64::max);
    let edges = linspace(0.0, k_max, bins + 1);

    let mut sums = vec![0.0; bins];
    let mut modes = vec![0usize; bins];
    for (coeff, &k) in buffer.iter().zip(&kk) {
        if let Some(bin) = digitize(k, &edges) {
            sums[bin] += coeff.norm_sqr();
            modes[bin] += 1;
        }
    }

    let power = sums
        .iter()
        .zip(&modes)
        .map(|(&s, &m)| if m > 0 { s / m as f64 } else { 0.0 })
        .collect();
    let k = edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect();

    PowerSpectrum { k, power, modes }
}

/// Sum a cubic field along its last axis and normalize the resulting
/// `n x n` map to zero mean and unit variance.
pub fn project_and_normalize(field: &[f64], n: usize) -> Vec<f64> {
    if n == 0 || field.len() != n * n * n {
        return Vec::new();
    }
    let projected: Vec<f64> = field.chunks_exact(n).map(|l| l.iter().sum()).collect();
    normalize_unit(&projected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn plane_wave(n: usize, k0: usize) -> Vec<f64> {
        let mut field = Vec::with_capacity(n * n * n);
        for x in 0..n {
            for _y in 0..n {
                for _z in 0..n {
                    field.push((2.0 * PI * k0 as f64 * x as f64 / n as f64).cos());
                }
            }
        }
        field
    }

    #[test]
    fn test_linspace_endpoints() {
        let e = linspace(0.0, 3.0, 4);
        assert_eq!(e, vec![0.0, 1.0, 2.0, 3.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_digitize_top_edge_excluded() {
        let edges = [0.0, 1.0, 2.0];
        assert_eq!(digitize(0.0, &edges), Some(0));
        assert_eq!(digitize(1.5, &edges), Some(1));
        assert_eq!(digitize(2.0, &edges), None);
        assert_eq!(digitize(-0.1, &edges), None);
    }

    #[test]
    fn test_single_wavenumber_peaks_in_its_bin() {
        let n = 16;
        let k0 = 3;
        let ps = isotropic_power_spectrum(&plane_wave(n, k0), n, 3, 40);
        assert_eq!(ps.len(), 40);

        let peak = ps.peak_bin().unwrap();
        let width = ps.k[1] - ps.k[0];
        let lo = ps.k[peak] - 0.5 * width;
        let hi = ps.k[peak] + 0.5 * width;
        assert!(
            lo <= k0 as f64 && (k0 as f64) < hi,
            "peak bin [{lo}, {hi}) does not contain k={k0}"
        );
        assert!(ps.power[peak] > 0.0);
    }

    #[test]
    fn test_empty_bins_are_zero_not_nan() {
        let n = 4;
        let ps = isotropic_power_spectrum(&plane_wave(n, 1), n, 3, 40);
        assert!(ps.power.iter().all(|p| p.is_finite()));
        assert!(ps.modes.iter().any(|&m| m == 0));
        for (p, m) in ps.power.iter().zip(&ps.modes) {
            if *m == 0 {
                assert_eq!(*p, 0.0);
            }
        }
    }

    #[test]
    fn test_zero_field_has_zero_power() {
        let n = 8;
        let ps = isotropic_power_spectrum(&vec![0.0; n * n], n, 2, 30);
        assert_eq!(ps.len(), 30);
        assert!(ps.power.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_mismatched_length_is_empty() {
        let ps = isotropic_power_spectrum(&[1.0, 2.0, 3.0], 4, 3, 10);
        assert!(ps.is_empty());
    }

    #[test]
    fn test_projection_is_unit_normalized() {
        let n = 8;
        let map = project_and_normalize(&plane_wave(n, 2), n);
        assert_eq!(map.len(), n * n);
        let m: f64 = map.iter().sum::<f64>() / map.len() as f64;
        let var: f64 = map.iter().map(|v| (v - m).powi(2)).sum::<f64>() / map.len() as f64;
        assert!(m.abs() < 1e-9);
        assert!((var - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_projection_of_constant_is_finite() {
        let n = 4;
        let map = project_and_normalize(&vec![0.25; n * n * n], n);
        assert!(map.iter().all(|v| v.is_finite() && v.abs() < 1e-9));
    }
}
