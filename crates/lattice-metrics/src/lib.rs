//! # lattice-metrics
//!
//! Numeric observables for lattice fields, independent of any particular
//! simulator:
//!
//! - [`fft`]: multi-dimensional complex FFT over cubic/square grids.
//! - [`spectrum`]: isotropic (radially binned) power spectra and the 2D
//!   projection used for the convergence map.
//! - [`entropy`]: histogram-based spatial entropy of a `[0, 1]` field.
//! - [`complexity`]: Lempel–Ziv phrase complexity of a binarized pattern.
//! - [`stats`]: population moments, unit normalization and geometric
//!   histogram binning.
//!
//! Grids are flat row-major slices of length `n^dims`; every function takes
//! the side length explicitly.

pub mod complexity;
pub mod entropy;
pub mod fft;
pub mod spectrum;
pub mod stats;

pub use complexity::{binarize, lz_complexity, lz_phrase_count};
pub use entropy::{DEFAULT_ENTROPY_BINS, spatial_entropy};
pub use fft::{fft_frequency, fft_nd, radial_wavenumbers};
pub use spectrum::{PowerSpectrum, isotropic_power_spectrum, project_and_normalize};
pub use stats::{GeometricHistogram, geometric_histogram, mean, normalize_unit, population_std};

pub use rustfft::{FftDirection, num_complex::Complex};

/// Additive guard applied to normalization denominators.
pub const NORM_EPS: f64 = 1e-12;
