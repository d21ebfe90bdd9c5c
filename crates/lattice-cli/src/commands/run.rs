//! `lattice run`: constant-drive simulation.

use lattice_core::{DriveSchedule, EnvOverrides, RunParams};

use super::{RunArgs, build_params, execute};

/// Run the run command.
pub fn run(args: &RunArgs, steps: usize, env: &EnvOverrides) {
    let params = params_for(args, steps, env);
    let outcome = execute(params, args, env);
    println!(
        "final <s>={:.4}  total R={:.1}  prunes={}",
        outcome.summary.final_mean_s, outcome.summary.total_trace, outcome.summary.total_prunes
    );
}

fn params_for(args: &RunArgs, steps: usize, env: &EnvOverrides) -> RunParams {
    let base = RunParams {
        drive: DriveSchedule::Constant {
            amplitude: RunParams::default().drive.amplitude_at(0),
            steps,
        },
        ..RunParams::default()
    };
    build_params(base, args, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_steps_flag_sets_constant_schedule() {
        let args = RunArgs {
            grid: 8,
            seed: 1,
            snap_every: 5,
            output: PathBuf::from("o"),
            no_halos: true,
        };
        let env = EnvOverrides {
            drive_amplitude: Some(0.4),
            phase1_steps: Some(99),
            ..EnvOverrides::default()
        };
        let p = params_for(&args, 25, &env);
        assert_eq!(p.total_steps(), 25);
        assert_eq!(p.drive.amplitude_at(24), 0.4);
    }

    #[test]
    fn test_run_writes_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let args = RunArgs {
            grid: 6,
            seed: 3,
            snap_every: 2,
            output: dir.path().to_path_buf(),
            no_halos: false,
        };
        let env = EnvOverrides {
            run_tag: Some("cli".to_string()),
            ..EnvOverrides::default()
        };
        let outcome = execute(params_for(&args, 4, &env), &args, &env);
        assert_eq!(outcome.run_dir, dir.path().join("cli"));
        assert!(outcome.run_dir.join("summary.json").is_file());
        assert!(!outcome.run_dir.join("hysteresis.csv").exists());
    }
}
