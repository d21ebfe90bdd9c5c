//! `lattice hysteresis`: strong drive then weak drive, to see whether the
//! lattice remembers the first phase.

use lattice_core::{EnvOverrides, RunParams};

use super::{RunArgs, build_params, execute};

/// Run the hysteresis command.
pub fn run(args: &RunArgs, env: &EnvOverrides) {
    let params = build_params(RunParams::hysteresis(), args, env);
    let outcome = execute(params, args, env);
    let s = &outcome.summary;
    println!(
        "phase 1: A={:.2} x {}  phase 2: A={:.2} x {}",
        s.phase1_amplitude.unwrap_or_default(),
        s.phase1_steps.unwrap_or_default(),
        s.phase2_amplitude.unwrap_or_default(),
        s.phase2_steps.unwrap_or_default()
    );
    println!("final <s>={:.4}  prunes={}", s.final_mean_s, s.total_prunes);
}
