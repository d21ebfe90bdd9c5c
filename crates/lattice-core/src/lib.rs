//! # lattice-core
//!
//! Seeded 3D lattice coherence simulator.
//!
//! A cubic grid of coherence values `s ∈ [0, 1]` evolves under a periodic
//! drive plus Gaussian noise. Cells whose combined excitation crosses a
//! threshold collapse to 0 or 1 (biased by a fixed terrain drawn from a
//! Gaussian random field) and accumulate an irreversible trace; the rest
//! relax toward their neighbors. The final field is reduced to power
//! spectra, a projected convergence map and a halo mass function.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lattice_core::{Experiment, RunParams};
//!
//! let params = RunParams { grid_size: 32, ..RunParams::default() };
//! let outcome = Experiment::new(params, "cosmo3d_outputs", None).execute()?;
//! println!("final <s> = {:.4}", outcome.summary.final_mean_s);
//! # Ok::<(), lattice_core::LatticeError>(())
//! ```
//!
//! ## Determinism
//!
//! Every random draw comes from one `StdRng` seeded with
//! [`RunParams::seed`]: initial real parts, initial imaginary parts, then
//! per step the noise field followed (only when something triggers) by the
//! collapse uniforms. Two runs with equal parameters produce identical
//! output.

pub mod config;
pub mod error;
pub mod experiment;
pub mod grid;
pub mod halos;
pub mod initial;
pub mod labeling;
pub mod observables;
pub mod output;
pub mod simulator;

pub use config::{
    DEFAULT_GRID_SIZE, DEFAULT_OUTPUT_BASE, DEFAULT_SEED, DEFAULT_SNAP_EVERY, DEFAULT_STEPS,
    DriveSchedule, ENV_KEYS, EnvOverrides, InitialSpectrum, Phase, RunParams, run_tag, sanitize_tag,
};
pub use error::{ConfigError, LatticeError, Result};
pub use experiment::{Experiment, ExperimentOutcome};
pub use grid::Grid3;
pub use halos::{HaloCatalog, MASS_FUNCTION_EDGES, find_halos, mass_function};
pub use initial::{InitialConditions, gaussian_random_field};
pub use labeling::{ComponentLabeler, FaceConnectedLabeler, Labeling, UnavailableLabeler};
pub use observables::{FinalObservables, density_contrast};
pub use output::{RunSummary, RunWriter, SUMMARY_FILE, list_runs, load_summary};
pub use simulator::{RunResult, Simulator, Snapshot, StepReport, TimeSeries};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
