//! Initial conditions: a Gaussian random field with a wiggled power
//! spectrum seeds both the fixed bias terrain and the starting coherence.

use std::f64::consts::SQRT_2;

use lattice_metrics::{
    Complex, FftDirection, NORM_EPS, fft_nd, normalize_unit, radial_wavenumbers,
};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::config::InitialSpectrum;
use crate::grid::Grid3;

/// Zero-mean, unit-variance real field on an `n^3` grid whose Fourier
/// amplitudes follow `sqrt(P(k) / 2)`.
///
/// Draws `n^3` real-part normals, then `n^3` imaginary-part normals, from
/// `rng`. The DC mode is zeroed.
pub fn gaussian_random_field<R: Rng + ?Sized>(
    n: usize,
    spectrum: &InitialSpectrum,
    rng: &mut R,
) -> Vec<f64> {
    let len = n * n * n;
    let real: Vec<f64> = (0..len).map(|_| rng.sample(StandardNormal)).collect();
    let imag: Vec<f64> = (0..len).map(|_| rng.sample(StandardNormal)).collect();

    let kk = radial_wavenumbers(n, 3);
    let mut modes: Vec<Complex<f64>> = kk
        .iter()
        .zip(real.iter().zip(&imag))
        .map(|(&k, (&re, &im))| {
            let amp = spectrum.power(k).max(0.0).sqrt() / SQRT_2;
            Complex::new(amp * re, amp * im)
        })
        .collect();
    if let Some(dc) = modes.first_mut() {
        *dc = Complex::new(0.0, 0.0);
    }

    fft_nd(&mut modes, n, 3, FftDirection::Inverse);
    let field: Vec<f64> = modes.iter().map(|c| c.re).collect();
    normalize_unit(&field)
}

/// Bias terrain and starting coherence derived from one raw field.
#[derive(Debug, Clone)]
pub struct InitialConditions {
    /// Raw field rescaled by its largest magnitude into `[-1, 1]`.
    pub bias: Vec<f64>,
    /// `clip(0.5 + 0.1 * raw, 0, 1)`.
    pub coherence: Grid3,
}

impl InitialConditions {
    pub fn from_raw(n: usize, raw: &[f64]) -> Self {
        let peak = raw.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        let bias = raw.iter().map(|v| v / (peak + NORM_EPS)).collect();
        let start = raw
            .iter()
            .map(|v| (0.5 + 0.1 * v).clamp(0.0, 1.0))
            .collect();
        let coherence = Grid3::from_vec(n, start).unwrap_or_else(|| Grid3::filled(n, 0.5));
        Self { bias, coherence }
    }

    pub fn generate<R: Rng + ?Sized>(n: usize, spectrum: &InitialSpectrum, rng: &mut R) -> Self {
        let raw = gaussian_random_field(n, spectrum, rng);
        Self::from_raw(n, &raw)
    }
}
