//! Population moments and histogram helpers.

use statrs::statistics::Statistics;

use crate::NORM_EPS;

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

/// Population (ddof = 0) standard deviation; 0 for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().population_std_dev()
}

/// Shift to zero mean and scale by `std + 1e-12`.
pub fn normalize_unit(values: &[f64]) -> Vec<f64> {
    let m = mean(values);
    let centred: Vec<f64> = values.iter().map(|v| v - m).collect();
    let sd = population_std(&centred) + NORM_EPS;
    centred.into_iter().map(|v| v / sd).collect()
}

/// Histogram over log-spaced bins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometricHistogram {
    pub edges: Vec<f64>,
    /// Geometric mean of each bin's edges.
    pub centers: Vec<f64>,
    pub counts: Vec<u64>,
}

impl GeometricHistogram {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Histogram of `values` over `edge_count` log-spaced edges from `min` to
/// `max` (both pinned exactly). Edges are non-decreasing and the last bin
/// includes its right edge; values outside `[min, max]` and non-finite
/// values are not counted.
pub fn geometric_histogram(
    values: &[f64],
    min: f64,
    max: f64,
    edge_count: usize,
) -> GeometricHistogram {
    if edge_count < 2 || !(min > 0.0) || !(max >= min) || !max.is_finite() {
        return GeometricHistogram::default();
    }
    let lo = min.log10();
    let hi = max.log10();
    let step = (hi - lo) / (edge_count - 1) as f64;
    let mut edges: Vec<f64> = (0..edge_count)
        .map(|i| 10f64.powf(lo + i as f64 * step))
        .collect();
    edges[0] = min;
    edges[edge_count - 1] = max;
    // powf rounding can overshoot the pinned endpoints when the range is narrow.
    for i in 1..edge_count - 1 {
        edges[i] = edges[i].clamp(edges[i - 1], max);
    }

    let bins = edge_count - 1;
    let mut counts = vec![0u64; bins];
    for &v in values {
        if !(min..=max).contains(&v) {
            continue;
        }
        let i = edges.partition_point(|&e| e <= v);
        let bin = if i >= edge_count { bins - 1 } else { i - 1 };
        counts[bin] += 1;
    }
    let centers = edges.windows(2).map(|w| (w[0] * w[1]).sqrt()).collect();

    GeometricHistogram {
        edges,
        centers,
        counts,
    }
}
