//! The per-step coherence update loop.
//!
//! Each step:
//!
//! 1. `drive = A(t) * sin(W * t)`.
//! 2. Draw one Gaussian noise value per cell.
//! 3. A cell triggers iff `|drive| + |noise| > η*`.
//! 4. Triggered cells collapse to 0 or 1 with `P(1) = 1 / (1 + exp(-β b))`;
//!    every collapse adds `trace_cost` to the trace field.
//! 5. Untriggered cells relax toward their 6-neighbor mean by `λR`.
//! 6. Every cell drifts by `ε (growth * (s - <s>) - damping * dR/dt)`.
//!
//! The coherence field is clamped to `[0, 1]` after every mutation. All
//! randomness comes from one `StdRng` seeded from the run parameters.

use lattice_metrics::{DEFAULT_ENTROPY_BINS, binarize, lz_complexity, spatial_entropy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Serialize;

use crate::config::RunParams;
use crate::error::ConfigError;
use crate::grid::Grid3;
use crate::initial::InitialConditions;

/// Threshold for the binarized pattern fed to the complexity estimate.
const BINARIZE_AT: f64 = 0.5;

/// What one call to [`Simulator::step`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub t: usize,
    pub amplitude: f64,
    pub drive: f64,
    /// Cells that took the collapse branch.
    pub triggered: usize,
    /// Cells that took the relaxation branch.
    pub relaxed: usize,
    /// Collapses whose outcome went against the more likely side.
    pub pruned: u64,
}

/// One row of the time-series log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    pub t: usize,
    pub amplitude: f64,
    pub mean_s: f64,
    pub entropy: f64,
    pub complexity: f64,
    /// Cumulative prune count.
    pub prunes: u64,
    pub trace_total: f64,
}

/// Append-only snapshot log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    snapshots: Vec<Snapshot>,
}

impl TimeSeries {
    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    pub fn as_slice(&self) -> &[Snapshot] {
        &self.snapshots
    }
}

/// Final state of a completed run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub coherence: Grid3,
    pub trace: Grid3,
    pub trace_total: f64,
    pub prunes: u64,
    pub steps: usize,
    pub series: TimeSeries,
}

impl RunResult {
    pub fn final_mean(&self) -> f64 {
        self.coherence.mean()
    }
}

/// Lattice coherence simulator for one parameter set.
pub struct Simulator {
    params: RunParams,
    rng: StdRng,
    noise: Normal<f64>,
    /// `1 / (1 + exp(-β b))`, fixed for the run.
    collapse_prob: Vec<f64>,
    coherence: Grid3,
    trace: Grid3,
    trace_total: f64,
    prunes: u64,
    triggered: Vec<bool>,
    t: usize,
}

impl Simulator {
    /// Validate `params`, seed the generator and draw initial conditions.
    pub fn new(params: RunParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let noise = Normal::new(0.0, params.noise_std).map_err(|e| ConfigError::InvalidParam {
            name: "noise_std",
            reason: e.to_string(),
        })?;

        let mut rng = StdRng::seed_from_u64(params.seed);
        let n = params.grid_size;
        let initial = InitialConditions::generate(n, &params.spectrum, &mut rng);
        let collapse_prob = initial
            .bias
            .iter()
            .map(|b| 1.0 / (1.0 + (-params.beta * b).exp()))
            .collect();

        log::debug!(
            "initialised {n}^3 lattice, seed={}, <s0>={:.4}",
            params.seed,
            initial.coherence.mean()
        );

        Ok(Self {
            rng,
            noise,
            collapse_prob,
            coherence: initial.coherence,
            trace: Grid3::filled(n, 0.0),
            trace_total: 0.0,
            prunes: 0,
            triggered: vec![false; params.cell_count()],
            t: 0,
            params,
        })
    }

    pub fn params(&self) -> &RunParams {
        &self.params
    }

    /// Index of the next step to run.
    pub fn time(&self) -> usize {
        self.t
    }

    pub fn is_finished(&self) -> bool {
        self.t >= self.params.total_steps()
    }

    pub fn coherence(&self) -> &Grid3 {
        &self.coherence
    }

    pub fn trace(&self) -> &Grid3 {
        &self.trace
    }

    pub fn trace_total(&self) -> f64 {
        self.trace_total
    }

    pub fn prunes(&self) -> u64 {
        self.prunes
    }

    /// Collapse mask of the most recent step.
    pub fn triggered_mask(&self) -> &[bool] {
        &self.triggered
    }

    /// Advance the lattice by one step.
    pub fn step(&mut self) -> StepReport {
        let t = self.t;
        let amplitude = self.params.drive.amplitude_at(t);
        let drive = amplitude * (self.params.drive_frequency * t as f64).sin();
        let threshold = self.params.eta_threshold;
        let cost = self.params.trace_cost;

        let mut triggered = 0usize;
        for hit in self.triggered.iter_mut() {
            let noise: f64 = self.noise.sample(&mut self.rng);
            *hit = drive.abs() + noise.abs() > threshold;
            triggered += usize::from(*hit);
        }
        let relaxed = self.triggered.len() - triggered;

        let mut pruned = 0u64;
        if triggered > 0 {
            let cells = self
                .coherence
                .as_mut_slice()
                .iter_mut()
                .zip(self.trace.as_mut_slice().iter_mut())
                .zip(self.triggered.iter().zip(&self.collapse_prob));
            for ((cell, trace), (&hit, &p)) in cells {
                let u: f64 = self.rng.random();
                if !hit {
                    continue;
                }
                let outcome = u < p;
                if (p > 0.5 && !outcome) || (p < 0.5 && outcome) {
                    pruned += 1;
                }
                *cell = if outcome { 1.0 } else { 0.0 };
                *trace += cost;
            }
            self.trace_total += cost * triggered as f64;
            self.prunes += pruned;
        }

        if relaxed > 0 {
            let neighbors = self.coherence.neighbor_mean();
            let lambda = self.params.lambda_r;
            let cells = self
                .coherence
                .as_mut_slice()
                .iter_mut()
                .zip(neighbors.as_slice())
                .zip(&self.triggered);
            for ((cell, &nb), &hit) in cells {
                if !hit {
                    *cell = (*cell + lambda * (nb - *cell)).clamp(0.0, 1.0);
                }
            }
        }

        let mean = self.coherence.mean();
        let eps = self.params.drift_epsilon;
        let growth = self.params.drift_growth;
        let damping = self.params.drift_damping;
        let cells = self
            .coherence
            .as_mut_slice()
            .iter_mut()
            .zip(&self.triggered);
        for (cell, &hit) in cells {
            let d_r = if hit { cost } else { 0.0 };
            let drifted = *cell + eps * (growth * (*cell - mean) - damping * d_r);
            *cell = drifted.clamp(0.0, 1.0);
        }

        self.t += 1;
        log::trace!("t={t} drive={drive:+.3} triggered={triggered} pruned={pruned}");

        StepReport {
            t,
            amplitude,
            drive,
            triggered,
            relaxed,
            pruned,
        }
    }

    /// Measure the current field as the snapshot for step `t`.
    pub fn snapshot(&self, t: usize) -> Snapshot {
        let values = self.coherence.as_slice();
        Snapshot {
            t,
            amplitude: self.params.drive.amplitude_at(t),
            mean_s: self.coherence.mean(),
            entropy: spatial_entropy(values, DEFAULT_ENTROPY_BINS),
            complexity: lz_complexity(&binarize(values, BINARIZE_AT)),
            prunes: self.prunes,
            trace_total: self.trace_total,
        }
    }

    /// Whether step `t` is recorded in the time series.
    pub fn is_snapshot_step(&self, t: usize) -> bool {
        t % self.params.snap_every == 0 || t + 1 == self.params.total_steps()
    }

    /// Run every remaining step.
    pub fn run(self) -> RunResult {
        self.run_observed(|_| {})
    }

    /// Run every remaining step, handing each snapshot to `on_snapshot` as
    /// it is recorded.
    pub fn run_observed<F>(mut self, mut on_snapshot: F) -> RunResult
    where
        F: FnMut(&Snapshot),
    {
        let mut series = TimeSeries::default();
        while !self.is_finished() {
            let report = self.step();
            if self.is_snapshot_step(report.t) {
                let snap = self.snapshot(report.t);
                log::debug!(
                    "[{:4}] A={:.2} mean s={:.4} R_total={:.1} pruned={}",
                    snap.t,
                    snap.amplitude,
                    snap.mean_s,
                    snap.trace_total,
                    snap.prunes
                );
                on_snapshot(&snap);
                series.push(snap);
            }
        }

        RunResult {
            coherence: self.coherence,
            trace: self.trace,
            trace_total: self.trace_total,
            prunes: self.prunes,
            steps: self.t,
            series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriveSchedule;

    fn small(steps: usize) -> RunParams {
        RunParams {
            grid_size: 6,
            snap_every: 3,
            drive: DriveSchedule::Constant {
                amplitude: 0.65,
                steps,
            },
            ..RunParams::default()
        }
    }

    #[test]
    fn test_rejects_invalid_params() {
        let mut p = small(5);
        p.grid_size = 0;
        assert!(Simulator::new(p).is_err());
    }

    #[test]
    fn test_step_partitions_grid() {
        let mut sim = Simulator::new(small(8)).unwrap();
        for _ in 0..8 {
            let r = sim.step();
            assert_eq!(r.triggered + r.relaxed, 216);
            assert_eq!(
                sim.triggered_mask().iter().filter(|&&h| h).count(),
                r.triggered
            );
        }
    }

    #[test]
    fn test_first_step_has_zero_drive() {
        let mut sim = Simulator::new(small(2)).unwrap();
        let r = sim.step();
        assert_eq!(r.t, 0);
        assert_eq!(r.drive, 0.0);
    }

    #[test]
    fn test_high_threshold_never_triggers() {
        let mut p = small(5);
        p.eta_threshold = 1e9;
        let mut sim = Simulator::new(p).unwrap();
        for _ in 0..5 {
            let r = sim.step();
            assert_eq!(r.triggered, 0);
        }
        assert_eq!(sim.trace_total(), 0.0);
        assert_eq!(sim.prunes(), 0);
    }

    #[test]
    fn test_negative_threshold_always_triggers() {
        let mut p = small(3);
        p.eta_threshold = -1.0;
        p.drift_epsilon = 0.0;
        let mut sim = Simulator::new(p).unwrap();
        let r = sim.step();
        assert_eq!(r.relaxed, 0);
        // With no drift every cell is a fresh 0/1 collapse outcome.
        assert!(
            sim.coherence()
                .as_slice()
                .iter()
                .all(|&v| v == 0.0 || v == 1.0)
        );
        let expected = 216.0 * sim.params().trace_cost;
        assert!((sim.trace_total() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_cadence_includes_final_step() {
        let sim = Simulator::new(small(8)).unwrap();
        let result = sim.run();
        let ts: Vec<usize> = result.series.iter().map(|s| s.t).collect();
        assert_eq!(ts, vec![0, 3, 6, 7]);
        assert_eq!(result.steps, 8);
    }

    #[test]
    fn test_observer_sees_every_snapshot() {
        let sim = Simulator::new(small(7)).unwrap();
        let mut seen = Vec::new();
        let result = sim.run_observed(|s| seen.push(s.t));
        assert_eq!(seen, result.series.iter().map(|s| s.t).collect::<Vec<_>>());
    }

    #[test]
    fn test_snapshot_prunes_monotone() {
        let result = Simulator::new(small(10)).unwrap().run();
        let prunes: Vec<u64> = result.series.iter().map(|s| s.prunes).collect();
        assert!(prunes.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(result.series.last().map(|s| s.prunes), Some(result.prunes));
    }
}
