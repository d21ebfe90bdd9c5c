//! Toy halo finder: connected regions of high density contrast.

use lattice_metrics::{GeometricHistogram, geometric_histogram};

use crate::labeling::ComponentLabeler;

/// Number of log-spaced edges in the mass function (15 bins).
pub const MASS_FUNCTION_EDGES: usize = 16;

/// Halos found in one density-contrast field.
#[derive(Debug, Clone, PartialEq)]
pub struct HaloCatalog {
    /// Cell counts of kept components, largest first.
    pub masses: Vec<usize>,
    /// Components found before the mass cut.
    pub components: usize,
    pub labeling_available: bool,
}

impl HaloCatalog {
    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    pub fn largest(&self) -> Option<usize> {
        self.masses.first().copied()
    }
}

/// Label cells with `delta > threshold` and keep components of at least
/// `mass_min` cells.
pub fn find_halos(
    delta: &[f64],
    n: usize,
    threshold: f64,
    mass_min: usize,
    labeler: &dyn ComponentLabeler,
) -> HaloCatalog {
    let available = labeler.is_available();
    if !available {
        return HaloCatalog {
            masses: Vec::new(),
            components: 0,
            labeling_available: false,
        };
    }

    let mask: Vec<bool> = delta.iter().map(|&d| d > threshold).collect();
    let labeling = labeler.label(&mask, n);
    let mut masses: Vec<usize> = labeling
        .component_sizes()
        .into_iter()
        .filter(|&m| m >= mass_min)
        .collect();
    masses.sort_unstable_by(|a, b| b.cmp(a));

    log::debug!(
        "{}: {} component(s), {} above mass floor {}",
        labeler.name(),
        labeling.count,
        masses.len(),
        mass_min
    );

    HaloCatalog {
        masses,
        components: labeling.count,
        labeling_available: available,
    }
}

/// Histogram of halo masses over log-spaced bins from the mass floor to the
/// largest halo. `None` for an empty catalog.
pub fn mass_function(catalog: &HaloCatalog, mass_min: usize) -> Option<GeometricHistogram> {
    let largest = catalog.largest()?;
    let floor = mass_min.max(1) as f64;
    let values: Vec<f64> = catalog.masses.iter().map(|&m| m as f64).collect();
    Some(geometric_histogram(
        &values,
        floor,
        (largest as f64).max(floor),
        MASS_FUNCTION_EDGES,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeling::{FaceConnectedLabeler, UnavailableLabeler};

    /// `n^3` field of zeros with a solid `side^3` block of ones at `origin`.
    fn block_field(n: usize, origin: (usize, usize, usize), side: usize) -> Vec<f64> {
        let mut field = vec![0.0; n * n * n];
        for x in origin.0..origin.0 + side {
            for y in origin.1..origin.1 + side {
                for z in origin.2..origin.2 + side {
                    field[(x * n + y) * n + z] = 1.0;
                }
            }
        }
        field
    }

    #[test]
    fn test_single_block_is_one_halo() {
        let delta = block_field(10, (2, 3, 4), 3);
        let catalog = find_halos(&delta, 10, 0.15, 20, &FaceConnectedLabeler);
        assert_eq!(catalog.masses, vec![27]);
        assert!(catalog.labeling_available);
    }

    #[test]
    fn test_unavailable_backend_yields_nothing() {
        let delta = block_field(10, (2, 3, 4), 3);
        let catalog = find_halos(&delta, 10, 0.15, 20, &UnavailableLabeler);
        assert!(catalog.is_empty());
        assert!(!catalog.labeling_available);
        assert!(mass_function(&catalog, 20).is_none());
    }

    #[test]
    fn test_small_components_cut() {
        let mut delta = block_field(10, (0, 0, 0), 3);
        delta[(8 * 10 + 8) * 10 + 8] = 1.0;
        let catalog = find_halos(&delta, 10, 0.15, 20, &FaceConnectedLabeler);
        assert_eq!(catalog.components, 2);
        assert_eq!(catalog.masses, vec![27]);
    }

    #[test]
    fn test_mass_function_counts_every_halo() {
        let catalog = HaloCatalog {
            masses: vec![400, 90, 30, 20],
            components: 9,
            labeling_available: true,
        };
        let hmf = mass_function(&catalog, 20).unwrap();
        assert_eq!(hmf.counts.len(), MASS_FUNCTION_EDGES - 1);
        assert_eq!(hmf.total(), 4);
        assert!(hmf.centers.iter().all(|c| c.is_finite() && *c > 0.0));
    }

    #[test]
    fn test_mass_function_single_mass() {
        let catalog = HaloCatalog {
            masses: vec![27],
            components: 1,
            labeling_available: true,
        };
        let hmf = mass_function(&catalog, 20).unwrap();
        assert_eq!(hmf.total(), 1);
    }

    #[test]
    fn test_halo_at_mass_floor_lands_in_last_bin() {
        // 2x2x5 slab: exactly 20 cells
        let n = 10;
        let mut delta = vec![0.0; n * n * n];
        for x in 1..3 {
            for y in 4..6 {
                for z in 2..7 {
                    delta[(x * n + y) * n + z] = 1.0;
                }
            }
        }
        let catalog = find_halos(&delta, n, 0.15, 20, &FaceConnectedLabeler);
        assert_eq!(catalog.masses, vec![20]);

        let hmf = mass_function(&catalog, 20).unwrap();
        assert_eq!(hmf.total(), 1);
        assert_eq!(hmf.counts[MASS_FUNCTION_EDGES - 2], 1);
        assert!(hmf.edges.iter().all(|&e| e == 20.0));
    }
}
