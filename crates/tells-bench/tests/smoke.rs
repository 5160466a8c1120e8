use std::fs;
use std::path::Path;

use tells_bench::config::BenchmarkConfig;
use tells_bench::tournament::TournamentRunner;
use tempfile::tempdir;

fn load_config(output_dir: &Path) -> BenchmarkConfig {
    let yaml = format!(
        r#"
run_id: "test_smoke"
matches:
  seed: 4242
  count: 6
  max_turns: 300
agents:
  - name: "steady"
    personality: "cautious"
  - name: "gambler"
    personality: "reckless"
    overrides:
      boast_doubt_probability: 0.9
outputs:
  jsonl: "{jsonl}"
  summary_md: "{summary}"
logging:
  enable_structured: false
"#,
        jsonl = output_dir.join("matches.jsonl").display(),
        summary = output_dir.join("summary.md").display(),
    );

    let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    cfg.validate().expect("config validates");
    cfg
}

/// Latency is the only field allowed to differ between identical runs.
fn normalized_rows(path: &Path) -> Vec<serde_json::Value> {
    let jsonl = fs::read_to_string(path).expect("jsonl readable");
    jsonl
        .lines()
        .map(|line| {
            let mut value: serde_json::Value =
                serde_json::from_str(line).expect("row decodes to JSON");
            if let Some(agents) = value.get_mut("agents").and_then(|a| a.as_array_mut()) {
                for agent in agents {
                    agent["speed_ms_turn"] = serde_json::json!(0.0);
                }
            }
            value
        })
        .collect()
}

fn run_once(dir: &Path) -> (tells_bench::tournament::RunSummary, Vec<serde_json::Value>) {
    let config = load_config(dir);
    let outputs = config.resolved_outputs();
    let runner = TournamentRunner::new(config, outputs).expect("runner created");
    let summary = runner.run().expect("matches complete");
    let rows = normalized_rows(&summary.jsonl_path);
    (summary, rows)
}

#[test]
fn smoke_run_writes_one_row_per_match() {
    let dir = tempdir().expect("temp dir");
    let (summary, rows) = run_once(dir.path());

    assert_eq!(summary.matches_played, 6);
    assert_eq!(summary.rows_written, 6);
    assert_eq!(rows.len(), 6);

    for (index, row) in rows.iter().enumerate() {
        assert_eq!(row["run_id"], "test_smoke");
        assert_eq!(row["match_index"], index as u64);
        let agents = row["agents"].as_array().expect("agents array");
        assert_eq!(agents.len(), 2);

        let expected_north = if index % 2 == 0 { "steady" } else { "gambler" };
        assert_eq!(row["seating"][0]["seat"], "north");
        assert_eq!(row["seating"][0]["bot"], expected_north);

        let winners = agents.iter().filter(|a| a["won"] == true).count();
        if row["finished"] == true {
            assert_eq!(winners, 1);
            assert!(row["winner"].is_string());
        } else {
            assert_eq!(winners, 0);
            assert!(row["winner"].is_null());
        }
        assert!(row["turns"].as_u64().expect("turns") <= 300);
    }

    let table = fs::read_to_string(&summary.summary_path).expect("summary markdown");
    assert!(table.contains("# Match Summary"));
    assert!(table.contains("| steady | cautious | 6 |"));
    assert!(table.contains("| gambler | reckless | 6 |"));

    let steady = summary.analytics.agent("steady").expect("steady report");
    let gambler = summary.analytics.agent("gambler").expect("gambler report");
    assert_eq!(
        steady.wins + gambler.wins + summary.draws,
        summary.matches_played
    );
    assert!((0.0..=1.0).contains(&steady.p_value));
}

#[test]
fn identical_configs_replay_identically() {
    let first_dir = tempdir().expect("temp dir");
    let second_dir = tempdir().expect("temp dir");

    let (_, first) = run_once(first_dir.path());
    let (_, second) = run_once(second_dir.path());

    assert_eq!(first, second, "same seed must yield the same match log");
}
