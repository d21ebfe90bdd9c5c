//! One complete run: simulate, measure, write.

use std::path::{Path, PathBuf};

use crate::config::{RunParams, run_tag};
use crate::error::Result;
use crate::labeling::{ComponentLabeler, FaceConnectedLabeler, UnavailableLabeler};
use crate::observables::FinalObservables;
use crate::output::{RunSummary, RunWriter};
use crate::simulator::{RunResult, Simulator, Snapshot};

/// A configured run waiting to execute.
pub struct Experiment {
    params: RunParams,
    output_base: PathBuf,
    tag: String,
    labeler: Box<dyn ComponentLabeler>,
}

/// What a finished run produced.
#[derive(Debug)]
pub struct ExperimentOutcome {
    pub run_dir: PathBuf,
    pub summary: RunSummary,
    pub result: RunResult,
    pub observables: FinalObservables,
    pub files: Vec<PathBuf>,
}

impl Experiment {
    /// `explicit_tag` is sanitized; an empty or absent tag is derived from
    /// the parameters.
    pub fn new(
        params: RunParams,
        output_base: impl AsRef<Path>,
        explicit_tag: Option<&str>,
    ) -> Self {
        let tag = run_tag(&params, explicit_tag);
        Self {
            params,
            output_base: output_base.as_ref().to_path_buf(),
            tag,
            labeler: Box::new(FaceConnectedLabeler),
        }
    }

    /// Switch halo finding off; the summary then records `LABELING_OK=false`.
    pub fn without_halos(mut self) -> Self {
        self.labeler = Box::new(UnavailableLabeler);
        self
    }

    pub fn with_labeler(mut self, labeler: Box<dyn ComponentLabeler>) -> Self {
        self.labeler = labeler;
        self
    }

    pub fn params(&self) -> &RunParams {
        &self.params
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn run_dir(&self) -> PathBuf {
        self.output_base.join(&self.tag)
    }

    pub fn execute(self) -> Result<ExperimentOutcome> {
        self.execute_observed(|_| {})
    }

    /// Execute, handing each time-series snapshot to `on_snapshot`.
    pub fn execute_observed<F>(self, on_snapshot: F) -> Result<ExperimentOutcome>
    where
        F: FnMut(&Snapshot),
    {
        let simulator = Simulator::new(self.params.clone())?;
        let writer = RunWriter::create(&self.output_base, &self.tag)?;
        log::info!(
            "run {}: N={} T={} seed={} labeler={}",
            self.tag,
            self.params.grid_size,
            self.params.total_steps(),
            self.params.seed,
            self.labeler.name()
        );

        let result = simulator.run_observed(on_snapshot);
        let observables =
            FinalObservables::compute(&result.coherence, &self.params, self.labeler.as_ref());
        let files = writer.write_all(&self.params, &result, &observables)?;
        let summary = RunSummary::new(
            &self.params,
            &result,
            observables.halos.labeling_available,
            writer.run_dir(),
        );

        Ok(ExperimentOutcome {
            run_dir: writer.run_dir().to_path_buf(),
            summary,
            result,
            observables,
            files,
        })
    }
}
