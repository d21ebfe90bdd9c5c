//! Run output folders: CSV tables plus `summary.json`.
//!
//! Each run writes into `<base>/<tag>/`. Files:
//!
//! ```text
//! pk.csv          k,Pk
//! kappa_ps.csv    k,Pkappa
//! kappa_map.csv   one row per x of the projected convergence map
//! hmf.csv         mass,counts          (only when halos were found)
//! timeseries.csv  t,A,mean_s,entropy,complexity,prunes,trace_total
//! hysteresis.csv  t,A,mean_s,prunes    (two-phase runs only)
//! summary.json
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use lattice_metrics::{GeometricHistogram, PowerSpectrum};
use serde::{Deserialize, Serialize};

use crate::config::{DriveSchedule, RunParams};
use crate::error::{LatticeError, Result, io_at};
use crate::observables::FinalObservables;
use crate::simulator::{RunResult, Snapshot};

pub const SUMMARY_FILE: &str = "summary.json";
pub const PK_FILE: &str = "pk.csv";
pub const KAPPA_PS_FILE: &str = "kappa_ps.csv";
pub const KAPPA_MAP_FILE: &str = "kappa_map.csv";
pub const HMF_FILE: &str = "hmf.csv";
pub const TIMESERIES_FILE: &str = "timeseries.csv";
pub const HYSTERESIS_FILE: &str = "hysteresis.csv";

/// Command that produces `summary.json`, named in missing-input errors.
const SUMMARY_PRODUCER: &str = "lattice run";

/// Contents of `summary.json`.
///
/// Key names match the environment variables that set each parameter so
/// sweep scripts can read them back directly. Fields that older summaries
/// may lack default on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(rename = "N")]
    pub grid_size: usize,
    #[serde(rename = "T")]
    pub steps: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(rename = "BETA")]
    pub beta: f64,
    #[serde(rename = "LAMBDA_R")]
    pub lambda_r: f64,
    #[serde(rename = "ETA_THRESH")]
    pub eta_threshold: f64,
    #[serde(rename = "DRIVE_A", default, skip_serializing_if = "Option::is_none")]
    pub drive_amplitude: Option<f64>,
    #[serde(rename = "DRIVE_W")]
    pub drive_frequency: f64,
    #[serde(rename = "NOISE_STD")]
    pub noise_std: f64,
    #[serde(rename = "PHASE1_A", default, skip_serializing_if = "Option::is_none")]
    pub phase1_amplitude: Option<f64>,
    #[serde(rename = "PHASE1_T", default, skip_serializing_if = "Option::is_none")]
    pub phase1_steps: Option<usize>,
    #[serde(rename = "PHASE2_A", default, skip_serializing_if = "Option::is_none")]
    pub phase2_amplitude: Option<f64>,
    #[serde(rename = "PHASE2_T", default, skip_serializing_if = "Option::is_none")]
    pub phase2_steps: Option<usize>,
    pub final_mean_s: f64,
    #[serde(rename = "total_trace_R", default)]
    pub total_trace: f64,
    pub total_prunes: u64,
    #[serde(rename = "LABELING_OK", alias = "SCIPY_OK", default)]
    pub labeling_ok: bool,
    #[serde(rename = "OUTDIR", default)]
    pub output_dir: String,
}

impl RunSummary {
    pub fn new(
        params: &RunParams,
        result: &RunResult,
        labeling_ok: bool,
        output_dir: &Path,
    ) -> Self {
        let (drive_amplitude, phases) = match params.drive {
            DriveSchedule::Constant { amplitude, .. } => (Some(amplitude), None),
            DriveSchedule::TwoPhase { first, second } => (None, Some((first, second))),
        };
        Self {
            grid_size: params.grid_size,
            steps: params.total_steps(),
            seed: params.seed,
            beta: params.beta,
            lambda_r: params.lambda_r,
            eta_threshold: params.eta_threshold,
            drive_amplitude,
            drive_frequency: params.drive_frequency,
            noise_std: params.noise_std,
            phase1_amplitude: phases.map(|(p, _)| p.amplitude),
            phase1_steps: phases.map(|(p, _)| p.steps),
            phase2_amplitude: phases.map(|(_, p)| p.amplitude),
            phase2_steps: phases.map(|(_, p)| p.steps),
            final_mean_s: result.final_mean(),
            total_trace: result.trace_total,
            total_prunes: result.prunes,
            labeling_ok,
            output_dir: output_dir.display().to_string(),
        }
    }

    pub fn is_hysteresis(&self) -> bool {
        self.phase1_amplitude.is_some() || self.phase2_amplitude.is_some()
    }
}

/// Writes the files of one run folder.
pub struct RunWriter {
    run_dir: PathBuf,
}

impl RunWriter {
    /// Create `base/tag`, including any missing parents.
    pub fn create(base: &Path, tag: &str) -> Result<Self> {
        let run_dir = base.join(tag);
        fs::create_dir_all(&run_dir).map_err(io_at(&run_dir))?;
        log::debug!("output folder {}", run_dir.display());
        Ok(Self { run_dir })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    fn csv(&self, name: &str, header: &str) -> Result<CsvFile> {
        let path = self.run_dir.join(name);
        let file = File::create(&path).map_err(io_at(&path))?;
        let mut csv = CsvFile {
            out: BufWriter::new(file),
            path,
        };
        csv.line(format_args!("{header}"))?;
        Ok(csv)
    }

    pub fn write_spectrum(
        &self,
        name: &str,
        value_column: &str,
        ps: &PowerSpectrum,
    ) -> Result<PathBuf> {
        let mut csv = self.csv(name, &format!("k,{value_column}"))?;
        for (k, p) in ps.rows() {
            csv.line(format_args!("{k},{p}"))?;
        }
        csv.finish()
    }

    /// One comma-separated row per x of an `n x n` row-major map.
    pub fn write_map(&self, name: &str, map: &[f64], n: usize) -> Result<PathBuf> {
        let path = self.run_dir.join(name);
        let file = File::create(&path).map_err(io_at(&path))?;
        let mut csv = CsvFile {
            out: BufWriter::new(file),
            path,
        };
        for row in map.chunks(n.max(1)) {
            let line = row
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",");
            csv.line(format_args!("{line}"))?;
        }
        csv.finish()
    }

    pub fn write_mass_function(&self, hist: &GeometricHistogram) -> Result<PathBuf> {
        let mut csv = self.csv(HMF_FILE, "mass,counts")?;
        for (m, c) in hist.centers.iter().zip(&hist.counts) {
            csv.line(format_args!("{m},{c}"))?;
        }
        csv.finish()
    }

    pub fn write_timeseries(&self, series: &[Snapshot]) -> Result<PathBuf> {
        let mut csv = self.csv(
            TIMESERIES_FILE,
            "t,A,mean_s,entropy,complexity,prunes,trace_total",
        )?;
        for s in series {
            csv.line(format_args!(
                "{},{},{},{},{},{},{}",
                s.t, s.amplitude, s.mean_s, s.entropy, s.complexity, s.prunes, s.trace_total
            ))?;
        }
        csv.finish()
    }

    pub fn write_hysteresis(&self, series: &[Snapshot]) -> Result<PathBuf> {
        let mut csv = self.csv(HYSTERESIS_FILE, "t,A,mean_s,prunes")?;
        for s in series {
            csv.line(format_args!(
                "{},{},{},{}",
                s.t, s.amplitude, s.mean_s, s.prunes
            ))?;
        }
        csv.finish()
    }

    pub fn write_summary(&self, summary: &RunSummary) -> Result<PathBuf> {
        let path = self.run_dir.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(summary).map_err(|source| LatticeError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(io_at(&path))?;
        Ok(path)
    }

    /// Write every file for a finished run. Returns the paths written.
    pub fn write_all(
        &self,
        params: &RunParams,
        result: &RunResult,
        observables: &FinalObservables,
    ) -> Result<Vec<PathBuf>> {
        let n = params.grid_size;
        let mut written = vec![
            self.write_spectrum(PK_FILE, "Pk", &observables.pk)?,
            self.write_spectrum(KAPPA_PS_FILE, "Pkappa", &observables.kappa_pk)?,
            self.write_map(KAPPA_MAP_FILE, &observables.kappa, n)?,
        ];
        if let Some(hist) = &observables.mass_function {
            written.push(self.write_mass_function(hist)?);
        }
        written.push(self.write_timeseries(result.series.as_slice())?);
        if params.drive.is_two_phase() {
            written.push(self.write_hysteresis(result.series.as_slice())?);
        }

        let summary = RunSummary::new(
            params,
            result,
            observables.halos.labeling_available,
            &self.run_dir,
        );
        written.push(self.write_summary(&summary)?);

        for path in &written {
            log::debug!("wrote {}", path.display());
        }
        Ok(written)
    }
}

struct CsvFile {
    out: BufWriter<File>,
    path: PathBuf,
}

impl CsvFile {
    fn line(&mut self, args: std::fmt::Arguments<'_>) -> Result<()> {
        writeln!(self.out, "{args}").map_err(io_at(&self.path))
    }

    fn finish(mut self) -> Result<PathBuf> {
        self.out.flush().map_err(io_at(&self.path))?;
        Ok(self.path)
    }
}

// ---------------------------------------------------------------------------
// Reading runs back
// ---------------------------------------------------------------------------

/// Load `run_dir/summary.json`.
pub fn load_summary(run_dir: &Path) -> Result<RunSummary> {
    let path = run_dir.join(SUMMARY_FILE);
    if !path.is_file() {
        return Err(LatticeError::MissingInput {
            path,
            producer: SUMMARY_PRODUCER,
        });
    }
    let raw = fs::read_to_string(&path).map_err(io_at(&path))?;
    serde_json::from_str(&raw).map_err(|source| LatticeError::Json { path, source })
}

/// Every immediate subfolder of `base` that holds a readable
/// `summary.json`, sorted by folder name. Folders with a missing or
/// malformed summary are skipped.
pub fn list_runs(base: &Path) -> Result<Vec<(PathBuf, RunSummary)>> {
    let entries = fs::read_dir(base).map_err(io_at(base))?;
    let mut runs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(io_at(base))?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        match load_summary(&dir) {
            Ok(summary) => runs.push((dir, summary)),
            Err(LatticeError::MissingInput { .. }) => {}
            Err(e) => log::warn!("skipping {}: {e}", dir.display()),
        }
    }
    runs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid3;
    use crate::simulator::TimeSeries;

    fn fake_result(params: &RunParams) -> RunResult {
        let mut series = TimeSeries::default();
        series.push(Snapshot {
            t: 0,
            amplitude: params.drive.amplitude_at(0),
            mean_s: 0.5,
            entropy: 0.4,
            complexity: 0.9,
            prunes: 3,
            trace_total: 2.0,
        });
        RunResult {
            coherence: Grid3::filled(2, 0.25),
            trace: Grid3::filled(2, 0.0),
            trace_total: 2.0,
            prunes: 3,
            steps: 1,
            series,
        }
    }

    #[test]
    fn test_summary_keys() {
        let params = RunParams::default();
        let summary = RunSummary::new(&params, &fake_result(&params), true, Path::new("out/x"));
        let v: serde_json::Value = serde_json::to_value(&summary).unwrap();
        for key in [
            "N",
            "T",
            "seed",
            "BETA",
            "LAMBDA_R",
            "ETA_THRESH",
            "DRIVE_A",
            "DRIVE_W",
            "NOISE_STD",
            "final_mean_s",
            "total_trace_R",
            "total_prunes",
            "LABELING_OK",
            "OUTDIR",
        ] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
        assert!(v.get("PHASE1_A").is_none());
        assert_eq!(v["total_prunes"], serde_json::json!(3));
        assert_eq!(v["final_mean_s"], serde_json::json!(0.25));
    }

    #[test]
    fn test_hysteresis_summary_keys() {
        let params = RunParams::hysteresis();
        let summary = RunSummary::new(&params, &fake_result(&params), false, Path::new("o"));
        let v: serde_json::Value = serde_json::to_value(&summary).unwrap();
        assert!(v.get("DRIVE_A").is_none());
        assert_eq!(v["PHASE1_T"], serde_json::json!(200));
        assert_eq!(v["T"], serde_json::json!(400));
        assert!(summary.is_hysteresis());
    }

    #[test]
    fn test_legacy_summary_loads() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = r#"{
            "N": 96, "T": 400,
            "PHASE1_A": 0.9, "PHASE1_T": 200, "PHASE2_A": 0.3, "PHASE2_T": 200,
            "BETA": 3.0, "LAMBDA_R": 0.2, "ETA_THRESH": 0.55,
            "DRIVE_W": 0.2094, "NOISE_STD": 0.35,
            "final_mean_s": 0.51, "total_prunes": 1234, "SCIPY_OK": true,
            "OUTDIR": "x"
        }"#;
        fs::write(dir.path().join(SUMMARY_FILE), legacy).unwrap();
        let s = load_summary(dir.path()).unwrap();
        assert_eq!(s.total_prunes, 1234);
        assert!(s.labeling_ok);
        assert_eq!(s.total_trace, 0.0);
        assert_eq!(s.drive_amplitude, None);
    }

    #[test]
    fn test_missing_summary_names_producer() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_summary(dir.path()).unwrap_err();
        assert!(matches!(err, LatticeError::MissingInput { .. }));
        assert!(err.to_string().contains("lattice run"));
    }

    #[test]
    fn test_malformed_summary() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SUMMARY_FILE), "{not json").unwrap();
        assert!(matches!(
            load_summary(dir.path()),
            Err(LatticeError::Json { .. })
        ));
    }

    #[test]
    fn test_write_map_rows() {
        let dir = tempfile::tempdir().unwrap();
        let w = RunWriter::create(dir.path(), "m").unwrap();
        let path = w.write_map(KAPPA_MAP_FILE, &[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text, "1,2\n3,4\n");
    }

    #[test]
    fn test_list_runs_skips_folders_without_summary() {
        let dir = tempfile::tempdir().unwrap();
        let params = RunParams::default();
        let result = fake_result(&params);
        for tag in ["b", "a"] {
            let w = RunWriter::create(dir.path(), tag).unwrap();
            w.write_summary(&RunSummary::new(&params, &result, true, w.run_dir()))
                .unwrap();
        }
        fs::create_dir(dir.path().join("empty")).unwrap();
        fs::write(dir.path().join("stray.txt"), "x").unwrap();

        let runs = list_runs(dir.path()).unwrap();
        let names: Vec<_> = runs
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
