use std::path::PathBuf;

use clap::Parser;

use tells_bench::config::{BenchmarkConfig, ResolvedOutputs};
use tells_bench::logging::init_logging;
use tells_bench::telemetry::{append_highlights_to_markdown, write_summary_outputs};
use tells_bench::tournament::TournamentRunner;

/// Head-to-head benchmarking harness for memory engines.
#[derive(Debug, Parser)]
#[command(
    name = "tells-bench",
    author,
    version,
    about = "Deterministic engine-vs-engine match harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of matches to play.
    #[arg(long, value_name = "COUNT")]
    matches: Option<usize>,

    /// Override the RNG seed for match generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration (no match is played).
    #[arg(long)]
    validate_only: bool,

    /// Enable per-belief memory telemetry regardless of config (forces TELLS_MEMORY_DETAILS=1).
    #[arg(long)]
    log_memory_details: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(matches) = cli.matches {
        config.matches.count = matches;
    }

    if let Some(seed) = cli.seed {
        config.matches.seed = Some(seed);
    }

    if cli.log_memory_details {
        config.logging.memory_details = true;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let matches = config.matches.count;
    let names: Vec<&str> = config.agents.iter().map(|a| a.name.as_str()).collect();

    println!(
        "Loaded configuration '{run_id}': {} ({matches} match{})",
        names.join(" vs "),
        if matches == 1 { "" } else { "es" }
    );

    let runner = TournamentRunner::new(config.clone(), outputs.clone())?;

    if cli.validate_only {
        println!("Validation-only mode: match execution skipped.");
        return Ok(());
    }

    let logging_guard = init_logging(&config.logging, &outputs)?;
    let summary = runner.run()?;

    println!(
        "Run complete for '{run_id}': {} matches ({} drawn) → {} rows at {}",
        summary.matches_played,
        summary.draws,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    for agent in &summary.analytics.agents {
        println!(
            "  {}: {:.1}% wins, 95% CI [{:.3}, {:.3}], p = {:.3}",
            agent.name,
            agent.win_rate * 100.0,
            agent.ci95.0,
            agent.ci95.1,
            agent.p_value
        );
    }
    println!("Summary table: {}", summary.summary_path.display());

    // Dropping the guard flushes buffered events before they are summarised.
    let telemetry_path = logging_guard.map(|guard| guard.telemetry_path.clone());
    if let Some(path) = telemetry_path {
        println!("Telemetry log: {}", path.display());
        if let Some(telemetry) = write_summary_outputs(&path, &outputs.telemetry_dir())? {
            append_highlights_to_markdown(&summary.summary_path, &telemetry)?;
            println!("Telemetry summary (JSON): {}", telemetry.json_path.display());
            println!(
                "Telemetry summary (Markdown): {}",
                telemetry.markdown_path.display()
            );
            println!(
                "  Decisions: {} events, {} challenge responses",
                telemetry.summary.decisions.count, telemetry.summary.responses.count
            );
        }
    }

    Ok(())
}
