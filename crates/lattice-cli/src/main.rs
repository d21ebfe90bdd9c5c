//! CLI for the coherence lattice simulator.

mod commands;

use clap::{Parser, Subcommand};
use lattice_core::{DEFAULT_OUTPUT_BASE, ENV_KEYS, EnvOverrides};

use commands::RunArgs;

#[derive(Parser)]
#[command(name = "lattice")]
#[command(about = "lattice: seeded 3D coherence lattice simulator")]
#[command(version = lattice_core::VERSION)]
#[command(after_help = env_help())]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulator with a constant drive amplitude (DRIVE_A)
    Run {
        #[command(flatten)]
        args: RunArgs,

        /// Number of update steps
        #[arg(long, default_value_t = lattice_core::DEFAULT_STEPS)]
        steps: usize,
    },

    /// Two-phase hysteresis run: PHASE1_A for PHASE1_T steps, then
    /// PHASE2_A for PHASE2_T steps. Also writes hysteresis.csv.
    Hysteresis {
        #[command(flatten)]
        args: RunArgs,
    },

    /// List finished runs, or show one run's summary
    Runs {
        /// Folder holding run subfolders
        #[arg(default_value = DEFAULT_OUTPUT_BASE)]
        dir: String,

        /// Show a single run folder
        #[arg(long)]
        run: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { args, steps } => {
            let env = read_env();
            commands::run::run(&args, steps, &env);
        }
        Commands::Hysteresis { args } => {
            let env = read_env();
            commands::hysteresis::run(&args, &env);
        }
        Commands::Runs { dir, run } => commands::runs::run(&dir, run.as_deref()),
    }
}

fn env_help() -> String {
    format!(
        "Physics parameters are read from the environment: {}.",
        ENV_KEYS.join(", ")
    )
}

/// One pass over the environment; a malformed value aborts before any work.
fn read_env() -> EnvOverrides {
    match EnvOverrides::from_env() {
        Ok(env) => {
            log::debug!("environment overrides: {env:?}");
            env
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_lists_env_keys() {
        let help = Cli::command().render_long_help().to_string();
        for key in ENV_KEYS {
            assert!(help.contains(key), "help is missing {key}");
        }
    }
}
