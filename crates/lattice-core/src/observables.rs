//! Observables extracted from the final coherence field.

use lattice_metrics::{
    GeometricHistogram, PowerSpectrum, isotropic_power_spectrum, project_and_normalize,
};

use crate::config::RunParams;
use crate::grid::Grid3;
use crate::halos::{HaloCatalog, find_halos, mass_function};
use crate::labeling::ComponentLabeler;

/// `s - mean(s)`.
pub fn density_contrast(field: &Grid3) -> Vec<f64> {
    let m = field.mean();
    field.as_slice().iter().map(|v| v - m).collect()
}

/// End-of-run derived products.
#[derive(Debug, Clone)]
pub struct FinalObservables {
    pub delta: Vec<f64>,
    /// Isotropic 3D spectrum of `delta`.
    pub pk: PowerSpectrum,
    /// Normalized projection of `delta` along z (`n x n`, row-major).
    pub kappa: Vec<f64>,
    pub kappa_pk: PowerSpectrum,
    pub halos: HaloCatalog,
    pub mass_function: Option<GeometricHistogram>,
}

impl FinalObservables {
    pub fn compute(field: &Grid3, params: &RunParams, labeler: &dyn ComponentLabeler) -> Self {
        let n = field.side();
        let delta = density_contrast(field);
        let pk = isotropic_power_spectrum(&delta, n, 3, params.pk_bins);
        let kappa = project_and_normalize(&delta, n);
        let kappa_pk = isotropic_power_spectrum(&kappa, n, 2, params.kappa_bins);
        let halos = find_halos(&delta, n, params.delta_threshold, params.mass_min, labeler);
        let mass_function = mass_function(&halos, params.mass_min);

        Self {
            delta,
            pk,
            kappa,
            kappa_pk,
            halos,
            mass_function,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeling::{FaceConnectedLabeler, UnavailableLabeler};

    #[test]
    fn test_density_contrast_zero_mean() {
        let g = Grid3::from_vec(2, vec![0.0, 1.0, 0.5, 0.5, 0.2, 0.8, 0.3, 0.7]).unwrap();
        let d = density_contrast(&g);
        assert!(d.iter().sum::<f64>().abs() < 1e-12);
    }

    #[test]
    fn test_compute_shapes() {
        let n = 8;
        let mut g = Grid3::filled(n, 0.4);
        for x in 2..6 {
            for y in 2..6 {
                for z in 2..6 {
                    g.set(x, y, z, 0.9);
                }
            }
        }
        let params = RunParams {
            grid_size: n,
            ..RunParams::default()
        };
        let obs = FinalObservables::compute(&g, &params, &FaceConnectedLabeler);
        assert_eq!(obs.pk.len(), 40);
        assert_eq!(obs.kappa.len(), n * n);
        assert_eq!(obs.kappa_pk.len(), 30);
        assert_eq!(obs.halos.masses, vec![64]);
        assert_eq!(obs.mass_function.map(|h| h.total()), Some(1));

        let none = FinalObservables::compute(&g, &params, &UnavailableLabeler);
        assert!(none.halos.is_empty());
        assert!(none.mass_function.is_none());
    }
}
