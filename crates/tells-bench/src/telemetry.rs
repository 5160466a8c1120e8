use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse telemetry JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize)]
pub struct TelemetrySummary {
    pub decisions: DecisionTelemetrySummary,
    pub responses: ResponseTelemetrySummary,
}

#[derive(Debug, Default, Serialize)]
pub struct DecisionTelemetrySummary {
    pub count: usize,
    pub avg_hidden_confidence: Option<f64>,
    pub avg_known_slots: Option<f64>,
    pub reason_counts: BTreeMap<String, usize>,
    pub personality_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Default, Serialize)]
pub struct ResponseTelemetrySummary {
    pub count: usize,
    pub avg_confidence: Option<f64>,
}

#[derive(Debug)]
struct Average {
    sum: f64,
    count: usize,
}

impl Average {
    fn new() -> Self {
        Self { sum: 0.0, count: 0 }
    }

    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Aggregate the engine's decide/respond events out of a JSON tracing log.
pub fn summarise_telemetry(path: &Path) -> Result<TelemetrySummary, TelemetryError> {
    if !path.exists() {
        return Ok(TelemetrySummary::default());
    }

    let file = File::open(path).map_err(|source| TelemetryError::Io {
        context: "opening telemetry log",
        source,
    })?;
    let reader = BufReader::new(file);

    let mut decisions = DecisionTelemetrySummary::default();
    let mut hidden_confidence = Average::new();
    let mut known_slots = Average::new();

    let mut responses = ResponseTelemetrySummary::default();
    let mut response_confidence = Average::new();

    for line in reader.lines() {
        let line = line.map_err(|source| TelemetryError::Io {
            context: "reading telemetry line",
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let payload: Value = serde_json::from_str(&line)?;
        let target = payload
            .get("target")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let fields = payload
            .get("fields")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        match target {
            "tells_bot::decide" => {
                decisions.count += 1;
                if let Some(value) = fields
                    .get("mean_hidden_confidence")
                    .and_then(Value::as_f64)
                {
                    hidden_confidence.add(value);
                }
                if let Some(known) = fields
                    .get("known")
                    .and_then(Value::as_i64)
                    .filter(|v| *v >= 0)
                {
                    known_slots.add(known as f64);
                }
                *decisions
                    .reason_counts
                    .entry(label(&fields, "reason"))
                    .or_insert(0) += 1;
                *decisions
                    .personality_counts
                    .entry(label(&fields, "personality"))
                    .or_insert(0) += 1;
            }
            "tells_bot::respond" => {
                responses.count += 1;
                if let Some(value) = fields.get("confidence").and_then(Value::as_f64) {
                    response_confidence.add(value);
                }
            }
            _ => {}
        }
    }

    decisions.avg_hidden_confidence = hidden_confidence.mean();
    decisions.avg_known_slots = known_slots.mean();
    responses.avg_confidence = response_confidence.mean();

    Ok(TelemetrySummary {
        decisions,
        responses,
    })
}

fn label(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("<unset>")
        .to_string()
}

pub fn write_summary_outputs(
    telemetry_path: &Path,
    output_dir: &Path,
) -> Result<Option<TelemetryOutputs>, TelemetryError> {
    if !telemetry_path.exists() {
        return Ok(None);
    }

    let summary = summarise_telemetry(telemetry_path)?;
    let json_path = output_dir.join("telemetry_summary.json");
    let md_path = output_dir.join("telemetry_summary.md");

    std::fs::write(&json_path, serde_json::to_vec_pretty(&summary)?).map_err(|source| {
        TelemetryError::Io {
            context: "writing telemetry summary json",
            source,
        }
    })?;

    let markdown = render_markdown(&summary, telemetry_path);
    std::fs::write(&md_path, markdown).map_err(|source| TelemetryError::Io {
        context: "writing telemetry summary markdown",
        source,
    })?;

    Ok(Some(TelemetryOutputs {
        summary,
        json_path,
        markdown_path: md_path,
    }))
}

pub fn append_highlights_to_markdown(
    summary_path: &Path,
    outputs: &TelemetryOutputs,
) -> Result<(), TelemetryError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(summary_path)
        .map_err(|source| TelemetryError::Io {
            context: "opening summary markdown for telemetry append",
            source,
        })?;

    let mut section = String::new();
    section.push_str("\n## Telemetry Highlights\n");
    let decisions = &outputs.summary.decisions;
    section.push_str(&format!("- Decision events captured: {}\n", decisions.count));
    if let Some(value) = decisions.avg_hidden_confidence {
        section.push_str(&format!("- Avg hidden-slot confidence: {:.3}\n", value));
    }
    if let Some(value) = decisions.avg_known_slots {
        section.push_str(&format!("- Avg remembered slots: {:.2}\n", value));
    }
    let responses = &outputs.summary.responses;
    section.push_str(&format!("- Challenge responses: {}\n", responses.count));

    section.push_str("\n### Decision Reasons\n");
    if decisions.reason_counts.is_empty() {
        section.push_str("- <none>\n");
    } else {
        for (label, count) in &decisions.reason_counts {
            section.push_str(&format!("- {}: {}\n", label, count));
        }
    }

    write!(file, "{section}").map_err(|source| TelemetryError::Io {
        context: "writing telemetry highlights",
        source,
    })?;

    Ok(())
}

fn render_markdown(summary: &TelemetrySummary, telemetry_path: &Path) -> String {
    let mut output = String::new();
    output.push_str("# Telemetry Summary\n\n");
    output.push_str(&format!("- Source: `{}`\n", telemetry_path.display()));
    output.push('\n');

    output.push_str("## Decisions\n");
    output.push_str(&format!("- Events: {}\n", summary.decisions.count));
    if let Some(value) = summary.decisions.avg_hidden_confidence {
        output.push_str(&format!("- Avg hidden-slot confidence: {:.3}\n", value));
    }
    if let Some(value) = summary.decisions.avg_known_slots {
        output.push_str(&format!("- Avg remembered slots: {:.2}\n", value));
    }
    if !summary.decisions.reason_counts.is_empty() {
        output.push_str("- Reasons:\n");
        for (label, count) in &summary.decisions.reason_counts {
            output.push_str(&format!("  - {}: {}\n", label, count));
        }
    }
    if !summary.decisions.personality_counts.is_empty() {
        output.push_str("- Personalities:\n");
        for (label, count) in &summary.decisions.personality_counts {
            output.push_str(&format!("  - {}: {}\n", label, count));
        }
    }
    output.push('\n');

    output.push_str("## Challenge Responses\n");
    output.push_str(&format!("- Events: {}\n", summary.responses.count));
    if let Some(value) = summary.responses.avg_confidence {
        output.push_str(&format!("- Avg confidence on challenged slot: {:.3}\n", value));
    }
    output
}

#[derive(Debug)]
pub struct TelemetryOutputs {
    pub summary: TelemetrySummary,
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}
