pub mod hysteresis;
pub mod run;
pub mod runs;

use std::path::PathBuf;

use clap::Args;
use lattice_core::{
    DEFAULT_GRID_SIZE, DEFAULT_OUTPUT_BASE, DEFAULT_SEED, DEFAULT_SNAP_EVERY, EnvOverrides,
    Experiment, ExperimentOutcome, RunParams,
};

/// Flags shared by the simulation commands.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Lattice side length N (N^3 cells)
    #[arg(long, default_value_t = DEFAULT_GRID_SIZE)]
    pub grid: usize,

    /// RNG seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Record a time-series snapshot every K steps (the last step is always recorded)
    #[arg(long, default_value_t = DEFAULT_SNAP_EVERY)]
    pub snap_every: usize,

    /// Base output folder; each run writes into <output>/<RUN_TAG>
    #[arg(long, default_value = DEFAULT_OUTPUT_BASE)]
    pub output: PathBuf,

    /// Skip halo finding (summary records LABELING_OK=false)
    #[arg(long)]
    pub no_halos: bool,
}

/// Layer CLI flags, then environment overrides, onto `base`.
pub fn build_params(mut base: RunParams, args: &RunArgs, env: &EnvOverrides) -> RunParams {
    base.grid_size = args.grid;
    base.seed = args.seed;
    base.snap_every = args.snap_every;
    env.apply(&mut base);
    base
}

/// Run `params` to completion, printing progress and the files written.
/// Exits the process on failure.
pub fn execute(params: RunParams, args: &RunArgs, env: &EnvOverrides) -> ExperimentOutcome {
    let mut experiment = Experiment::new(params, &args.output, env.run_tag.as_deref());
    if args.no_halos {
        experiment = experiment.without_halos();
    }

    let p = experiment.params();
    println!(
        "Lattice {n}^3, T={t}, seed={seed}, β={beta}, λR={lr}, η*={eta}",
        n = p.grid_size,
        t = p.total_steps(),
        seed = p.seed,
        beta = p.beta,
        lr = p.lambda_r,
        eta = p.eta_threshold,
    );
    println!("Output: {}", experiment.run_dir().display());

    let outcome = match experiment.execute_observed(|snap| println!("{}", progress_line(snap))) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if !outcome.summary.labeling_ok {
        println!("Halo finding skipped.");
    } else if let Some(largest) = outcome.observables.halos.largest() {
        println!(
            "Halos: {} (largest {} cells)",
            outcome.observables.halos.len(),
            largest
        );
    } else {
        println!("Halos: none above mass cut");
    }
    for path in &outcome.files {
        println!("Wrote: {}", path.display());
    }
    println!("Done.");
    outcome
}

pub fn progress_line(snap: &lattice_core::Snapshot) -> String {
    format!(
        "[{:4}] mean s={:.4}  R_total={:.1}  pruned={}",
        snap.t, snap.mean_s, snap.trace_total, snap.prunes
    )
}

/// Shorten `s` to at most `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
