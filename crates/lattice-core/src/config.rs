//! Run parameters and environment overrides.
//!
//! A [`RunParams`] bundle is built once at process entry (defaults, then
//! CLI flags, then one pass over the environment via [`EnvOverrides`]) and
//! is never mutated while a run is in progress.

use std::f64::consts::{LN_2, PI};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_GRID_SIZE: usize = 96;
pub const DEFAULT_STEPS: usize = 300;
pub const DEFAULT_SEED: u64 = 123;
pub const DEFAULT_SNAP_EVERY: usize = 50;
pub const DEFAULT_OUTPUT_BASE: &str = "cosmo3d_outputs";

/// Environment variables recognised by [`EnvOverrides`].
pub const ENV_KEYS: &[&str] = &[
    "BETA",
    "LAMBDA_R",
    "ETA_THRESH",
    "DRIVE_A",
    "DRIVE_W",
    "NOISE_STD",
    "RUN_TAG",
    "PHASE1_A",
    "PHASE1_T",
    "PHASE2_A",
    "PHASE2_T",
];

// ---------------------------------------------------------------------------
// Initial power spectrum
// ---------------------------------------------------------------------------

/// Smooth power law with a Gaussian cutoff, multiplied by a damped
/// oscillatory wiggle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialSpectrum {
    pub ns_index: f64,
    pub k0_cutoff: f64,
    /// Wiggle amplitude.
    pub bao_amplitude: f64,
    /// Wiggle characteristic scale; the phase is `k * scale / 800`.
    pub bao_scale: f64,
    /// Wiggle damping width; the envelope is `exp(-(k * damping * 10)^2)`.
    pub bao_damping: f64,
}

impl Default for InitialSpectrum {
    fn default() -> Self {
        Self {
            ns_index: 0.0,
            k0_cutoff: 0.15,
            bao_amplitude: 0.06,
            bao_scale: 105.0,
            bao_damping: 0.02,
        }
    }
}

impl InitialSpectrum {
    /// Target power at radial wavenumber `k`.
    pub fn power(&self, k: f64) -> f64 {
        let smooth = (k + 1e-12).powf(self.ns_index) * (-(k * self.k0_cutoff).powi(2)).exp();
        let wiggle = 1.0
            + self.bao_amplitude
                * (k * (self.bao_scale / 800.0)).sin()
                * (-(k * self.bao_damping * 10.0).powi(2)).exp();
        smooth * wiggle
    }
}

// ---------------------------------------------------------------------------
// Drive schedule
// ---------------------------------------------------------------------------

/// One constant-amplitude segment of a two-phase schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub amplitude: f64,
    pub steps: usize,
}

/// Amplitude of the periodic drive over the run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DriveSchedule {
    /// Fixed amplitude for `steps` steps.
    Constant { amplitude: f64, steps: usize },
    /// `first.amplitude` for `first.steps`, then `second.amplitude` for
    /// `second.steps` (hysteresis runs).
    TwoPhase { first: Phase, second: Phase },
}

impl Default for DriveSchedule {
    fn default() -> Self {
        Self::Constant {
            amplitude: 0.65,
            steps: DEFAULT_STEPS,
        }
    }
}

impl DriveSchedule {
    /// Default hysteresis schedule: 0.90 for 200 steps, then 0.30 for 200.
    pub fn default_two_phase() -> Self {
        Self::TwoPhase {
            first: Phase {
                amplitude: 0.90,
                steps: 200,
            },
            second: Phase {
                amplitude: 0.30,
                steps: 200,
            },
        }
    }

    pub fn amplitude_at(&self, t: usize) -> f64 {
        match self {
            Self::Constant { amplitude, .. } => *amplitude,
            Self::TwoPhase { first, second } => {
                if t < first.steps {
                    first.amplitude
                } else {
                    second.amplitude
                }
            }
        }
    }

    pub fn total_steps(&self) -> usize {
        match self {
            Self::Constant { steps, .. } => *steps,
            Self::TwoPhase { first, second } => first.steps + second.steps,
        }
    }

    pub fn is_two_phase(&self) -> bool {
        matches!(self, Self::TwoPhase { .. })
    }
}

// ---------------------------------------------------------------------------
// Run parameters
// ---------------------------------------------------------------------------

/// Immutable parameter bundle for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    /// Lattice side length `N` (grid holds `N^3` cells).
    pub grid_size: usize,
    pub seed: u64,
    /// Snapshot cadence in steps; the final step is always recorded.
    pub snap_every: usize,
    pub spectrum: InitialSpectrum,

    /// Collapse bias strength β.
    pub beta: f64,
    /// Relaxation fraction λR toward the neighbor mean.
    pub lambda_r: f64,
    /// Collapse threshold η*.
    pub eta_threshold: f64,
    /// Drive angular frequency in rad/step.
    pub drive_frequency: f64,
    pub noise_std: f64,
    /// Trace added per collapse event.
    pub trace_cost: f64,

    pub drift_epsilon: f64,
    pub drift_growth: f64,
    pub drift_damping: f64,

    /// Density-contrast threshold for halo cells.
    pub delta_threshold: f64,
    /// Minimum component size kept as a halo.
    pub mass_min: usize,

    pub pk_bins: usize,
    pub kappa_bins: usize,

    pub drive: DriveSchedule,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            seed: DEFAULT_SEED,
            snap_every: DEFAULT_SNAP_EVERY,
            spectrum: InitialSpectrum::default(),
            beta: 3.0,
            lambda_r: 0.20,
            eta_threshold: 0.55,
            drive_frequency: 2.0 * PI / 30.0,
            noise_std: 0.35,
            trace_cost: LN_2,
            drift_epsilon: 0.08,
            drift_growth: 0.9,
            drift_damping: 0.6,
            delta_threshold: 0.15,
            mass_min: 20,
            pk_bins: 40,
            kappa_bins: 30,
            drive: DriveSchedule::default(),
        }
    }
}

impl RunParams {
    /// Defaults with the two-phase hysteresis schedule.
    pub fn hysteresis() -> Self {
        Self {
            drive: DriveSchedule::default_two_phase(),
            ..Self::default()
        }
    }

    pub fn total_steps(&self) -> usize {
        self.drive.total_steps()
    }

    /// Cells in the `grid_size^3` lattice.
    pub fn cell_count(&self) -> usize {
        self.grid_size.pow(3)
    }

    /// Reject parameter bundles the simulator cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(invalid("grid_size", "must be at least 1"));
        }
        if self.total_steps() == 0 {
            return Err(invalid("steps", "run must have at least one step"));
        }
        if self.snap_every == 0 {
            return Err(invalid("snap_every", "must be at least 1"));
        }
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(invalid("noise_std", "must be finite and non-negative"));
        }
        if !(0.0..=1.0).contains(&self.lambda_r) {
            return Err(invalid("lambda_r", "must lie in [0, 1]"));
        }
        let finite = [
            ("beta", self.beta),
            ("eta_threshold", self.eta_threshold),
            ("drive_frequency", self.drive_frequency),
            ("trace_cost", self.trace_cost),
            ("drift_epsilon", self.drift_epsilon),
            ("drift_growth", self.drift_growth),
            ("drift_damping", self.drift_damping),
            ("delta_threshold", self.delta_threshold),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(invalid(name, "must be finite"));
            }
        }
        match self.drive {
            DriveSchedule::Constant { amplitude, .. } if !amplitude.is_finite() => {
                Err(invalid("drive_amplitude", "must be finite"))
            }
            DriveSchedule::TwoPhase { first, second }
                if !first.amplitude.is_finite() || !second.amplitude.is_finite() =>
            {
                Err(invalid("phase_amplitude", "must be finite"))
            }
            _ => Ok(()),
        }
    }
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidParam {
        name,
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

/// Parsed environment overrides. Every field is optional; absent keys
/// leave the corresponding parameter at its current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub beta: Option<f64>,
    pub lambda_r: Option<f64>,
    pub eta_threshold: Option<f64>,
    pub drive_amplitude: Option<f64>,
    pub drive_frequency: Option<f64>,
    pub noise_std: Option<f64>,
    pub run_tag: Option<String>,
    pub phase1_amplitude: Option<f64>,
    pub phase1_steps: Option<usize>,
    pub phase2_amplitude: Option<f64>,
    pub phase2_steps: Option<usize>,
}

impl EnvOverrides {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            beta: parse_float(&lookup, "BETA")?,
            lambda_r: parse_float(&lookup, "LAMBDA_R")?,
            eta_threshold: parse_float(&lookup, "ETA_THRESH")?,
            drive_amplitude: parse_float(&lookup, "DRIVE_A")?,
            drive_frequency: parse_float(&lookup, "DRIVE_W")?,
            noise_std: parse_float(&lookup, "NOISE_STD")?,
            run_tag: lookup("RUN_TAG"),
            phase1_amplitude: parse_float(&lookup, "PHASE1_A")?,
            phase1_steps: parse_count(&lookup, "PHASE1_T")?,
            phase2_amplitude: parse_float(&lookup, "PHASE2_A")?,
            phase2_steps: parse_count(&lookup, "PHASE2_T")?,
        })
    }

    /// Apply overrides in place. `DRIVE_A` only affects constant
    /// schedules; the `PHASE*` keys only affect two-phase schedules.
    pub fn apply(&self, params: &mut RunParams) {
        if let Some(v) = self.beta {
            params.beta = v;
        }
        if let Some(v) = self.lambda_r {
            params.lambda_r = v;
        }
        if let Some(v) = self.eta_threshold {
            params.eta_threshold = v;
        }
        if let Some(v) = self.drive_frequency {
            params.drive_frequency = v;
        }
        if let Some(v) = self.noise_std {
            params.noise_std = v;
        }
        match &mut params.drive {
            DriveSchedule::Constant { amplitude, .. } => {
                if let Some(v) = self.drive_amplitude {
                    *amplitude = v;
                }
            }
            DriveSchedule::TwoPhase { first, second } => {
                if let Some(v) = self.phase1_amplitude {
                    first.amplitude = v;
                }
                if let Some(v) = self.phase1_steps {
                    first.steps = v;
                }
                if let Some(v) = self.phase2_amplitude {
                    second.amplitude = v;
                }
                if let Some(v) = self.phase2_steps {
                    second.steps = v;
                }
            }
        }
    }
}

fn parse_float<F>(lookup: &F, key: &'static str) -> Result<Option<f64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<f64>().map_err(|_| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                expected: "float",
            })
        })
        .transpose()
}

fn parse_count<F>(lookup: &F, key: &'static str) -> Result<Option<usize>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                expected: "non-negative integer",
            })
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// Run tags
// ---------------------------------------------------------------------------

/// Output subdirectory name for a run: the explicit tag if given, else one
/// derived from the parameters. Always passed through [`sanitize_tag`].
pub fn run_tag(params: &RunParams, explicit: Option<&str>) -> String {
    if let Some(tag) = explicit {
        let clean = sanitize_tag(tag);
        if !clean.is_empty() {
            return clean;
        }
    }
    let derived = match params.drive {
        DriveSchedule::Constant { amplitude, .. } => format!(
            "beta{:?}_lr{:?}_eta{:?}_A{:?}_W{:?}",
            params.beta, params.lambda_r, params.eta_threshold, amplitude, params.drive_frequency
        ),
        DriveSchedule::TwoPhase { first, second } => format!(
            "hyst_A{:?}x{}_A{:?}x{}",
            first.amplitude, first.steps, second.amplitude, second.steps
        ),
    };
    sanitize_tag(&derived)
}

/// Trim whitespace and replace `/` and `\` so the tag is a single path
/// component.
pub fn sanitize_tag(tag: &str) -> String {
    tag.trim().replace(['\\', '/'], "_")
}
