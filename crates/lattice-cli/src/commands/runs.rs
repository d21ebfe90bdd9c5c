//! `lattice runs`: list finished runs and inspect one summary.

use std::path::{Path, PathBuf};

use lattice_core::{RunSummary, list_runs, load_summary};

use super::truncate;

/// Run the runs command.
pub fn run(dir: &str, run_path: Option<&str>) {
    if let Some(path) = run_path {
        let run_dir = PathBuf::from(path);
        match load_summary(&run_dir) {
            Ok(summary) => print!("{}", describe_run(&run_dir, &summary)),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    } else {
        list(dir);
    }
}

fn list(dir: &str) {
    let base = Path::new(dir);
    if !base.exists() {
        println!("No output folder found at {dir}");
        println!("Start a run first: lattice run");
        return;
    }

    let runs = match list_runs(base) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to read {dir}: {e}");
            std::process::exit(1);
        }
    };

    if runs.is_empty() {
        println!("No runs found in {dir}/");
        println!("Start a run first: lattice run");
        return;
    }

    println!("{}", table_header());
    println!("{}", "-".repeat(TABLE_WIDTH));
    for (path, summary) in &runs {
        println!("{}", table_row(path, summary));
    }
    println!("\n{} run(s) in {dir}/", runs.len());
}

const TABLE_WIDTH: usize = 92;

fn table_header() -> String {
    format!(
        "{:<40} {:>4} {:>5} {:>6} {:>6} {:>6} {:>9} {:>10}",
        "Run", "N", "T", "BETA", "LR", "ETA", "<s>", "prunes"
    )
}

fn table_row(path: &Path, s: &RunSummary) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    format!(
        "{:<40} {:>4} {:>5} {:>6.2} {:>6.2} {:>6.2} {:>9.4} {:>10}",
        truncate(&name, 40),
        s.grid_size,
        s.steps,
        s.beta,
        s.lambda_r,
        s.eta_threshold,
        s.final_mean_s,
        s.total_prunes
    )
}

fn describe_run(run_dir: &Path, s: &RunSummary) -> String {
    let mut out = format!("Run: {}\n", run_dir.display());
    out.push_str(&format!(
        "  Grid:         {}^3, T={}, seed={}\n",
        s.grid_size, s.steps, s.seed
    ));
    out.push_str(&format!(
        "  Collapse:     BETA={}  ETA_THRESH={}  NOISE_STD={}\n",
        s.beta, s.eta_threshold, s.noise_std
    ));
    out.push_str(&format!("  Relaxation:   LAMBDA_R={}\n", s.lambda_r));
    match (s.drive_amplitude, s.is_hysteresis()) {
        (_, true) => out.push_str(&format!(
            "  Drive:        A={} x {} then A={} x {}, W={}\n",
            fmt_opt(s.phase1_amplitude),
            fmt_opt(s.phase1_steps),
            fmt_opt(s.phase2_amplitude),
            fmt_opt(s.phase2_steps),
            s.drive_frequency
        )),
        (Some(a), false) => {
            out.push_str(&format!("  Drive:        A={a}, W={}\n", s.drive_frequency))
        }
        (None, false) => out.push_str(&format!("  Drive:        W={}\n", s.drive_frequency)),
    }
    out.push_str(&format!("  Final <s>:    {:.6}\n", s.final_mean_s));
    out.push_str(&format!("  Total R:      {:.3}\n", s.total_trace));
    out.push_str(&format!("  Prunes:       {}\n", s.total_prunes));
    out.push_str(&format!(
        "  Halos:        {}\n",
        if s.labeling_ok { "labelled" } else { "skipped" }
    ));
    out
}

fn fmt_opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map_or_else(|| "?".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_json(extra: &str) -> String {
        format!(
            r#"{{
                "N": 32, "T": 100, "seed": 123,
                "BETA": 3.0, "LAMBDA_R": 0.2, "ETA_THRESH": 0.55,
                "DRIVE_W": 0.2, "NOISE_STD": 0.35,
                "final_mean_s": 0.4875, "total_trace_R": 12.5,
                "total_prunes": 77, "LABELING_OK": true, "OUTDIR": "x"
                {extra}
            }}"#
        )
    }

    #[test]
    fn test_describe_constant_run() {
        let s: RunSummary = serde_json::from_str(&summary_json(r#", "DRIVE_A": 0.65"#)).unwrap();
        let text = describe_run(Path::new("out/a"), &s);
        assert!(text.contains("32^3, T=100, seed=123"));
        assert!(text.contains("A=0.65, W=0.2"));
        assert!(text.contains("Prunes:       77"));
    }

    #[test]
    fn test_describe_hysteresis_run() {
        let s: RunSummary = serde_json::from_str(&summary_json(
            r#", "PHASE1_A": 0.9, "PHASE1_T": 50, "PHASE2_A": 0.3, "PHASE2_T": 50"#,
        ))
        .unwrap();
        let text = describe_run(Path::new("out/h"), &s);
        assert!(text.contains("A=0.9 x 50 then A=0.3 x 50"));
    }

    #[test]
    fn test_table_row_columns() {
        let s: RunSummary = serde_json::from_str(&summary_json("")).unwrap();
        let row = table_row(Path::new("base/some_run"), &s);
        assert!(row.starts_with("some_run"));
        assert!(row.ends_with("77"));
        assert!(row.contains("0.4875"));
    }
}
