use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::BenchmarkConfig;
use crate::tournament::{MatchOutcome, SeatResult};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI
const EVEN_ODDS: f64 = 0.5;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub struct AnalyticsCollector {
    run_id: String,
    agents: HashMap<String, AgentAccumulator>,
    agent_order: Vec<String>,
    draws: usize,
    matches: usize,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Self {
        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(
                agent.name.clone(),
                AgentAccumulator::new(agent.name.clone(), agent.personality.as_str()),
            );
            order.push(agent.name.clone());
        }

        Self {
            run_id: config.run_id.clone(),
            agents,
            agent_order: order,
            draws: 0,
            matches: 0,
        }
    }

    pub fn record_match(&mut self, outcome: &MatchOutcome) -> Result<(), AnalyticsError> {
        self.matches += 1;
        if outcome.winner.is_none() {
            self.draws += 1;
        }

        for seat in &outcome.seat_results {
            let acc = self
                .agents
                .get_mut(&seat.agent_name)
                .ok_or_else(|| AnalyticsError::UnknownAgent(seat.agent_name.clone()))?;
            acc.record_match(seat, outcome.winner.is_none());
        }

        Ok(())
    }

    pub fn finalize(mut self) -> AnalyticsSummary {
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report());
            }
        }

        AnalyticsSummary {
            run_id: self.run_id,
            matches: self.matches,
            draws: self.draws,
            agents: reports,
        }
    }
}

struct AgentAccumulator {
    name: String,
    preset: &'static str,
    matches: u32,
    wins: u32,
    draws: u32,
    total_score: u64,
    challenges: u32,
    challenges_won: u32,
    answers: u32,
    answers_correct: u32,
    boasts: u32,
    boasts_upheld: u32,
    total_latency_ms: f64,
    total_decisions: u64,
}

impl AgentAccumulator {
    fn new(name: String, preset: &'static str) -> Self {
        Self {
            name,
            preset,
            matches: 0,
            wins: 0,
            draws: 0,
            total_score: 0,
            challenges: 0,
            challenges_won: 0,
            answers: 0,
            answers_correct: 0,
            boasts: 0,
            boasts_upheld: 0,
            total_latency_ms: 0.0,
            total_decisions: 0,
        }
    }

    fn record_match(&mut self, seat: &SeatResult, drawn: bool) {
        self.matches += 1;
        if seat.won {
            self.wins += 1;
        }
        if drawn {
            self.draws += 1;
        }
        self.total_score += u64::from(seat.score);
        self.challenges += seat.tally.challenges;
        self.challenges_won += seat.tally.challenges_won;
        self.answers += seat.tally.answers;
        self.answers_correct += seat.tally.answers_correct;
        self.boasts += seat.tally.boasts;
        self.boasts_upheld += seat.tally.boasts_upheld;
        self.total_latency_ms += seat.metrics.total_ms;
        self.total_decisions += u64::from(seat.metrics.decisions);
    }

    fn into_report(self) -> AgentReport {
        let matches = self.matches as usize;
        let win_rate = ratio(self.wins, self.matches).unwrap_or(0.0);
        let avg_latency = if self.total_decisions == 0 {
            0.0
        } else {
            self.total_latency_ms / self.total_decisions as f64
        };
        let avg_score = if matches == 0 {
            0.0
        } else {
            self.total_score as f64 / matches as f64
        };

        AgentReport {
            name: self.name,
            preset: self.preset.to_string(),
            matches,
            wins: self.wins as usize,
            draws: self.draws as usize,
            win_rate,
            ci95: win_rate_interval(self.wins, self.matches),
            p_value: even_odds_p_value(self.wins, self.matches),
            avg_score,
            challenge_accuracy: ratio(self.challenges_won, self.challenges),
            answer_accuracy: ratio(self.answers_correct, self.answers),
            boast_success: ratio(self.boasts_upheld, self.boasts),
            average_ms_per_decision: avg_latency,
        }
    }
}

fn ratio(hits: u32, total: u32) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(f64::from(hits) / f64::from(total))
    }
}

/// Normal-approximation interval on a win rate, clamped to [0, 1].
fn win_rate_interval(wins: u32, matches: u32) -> (f64, f64) {
    let Some(rate) = ratio(wins, matches) else {
        return (0.0, 0.0);
    };
    let std_error = (rate * (1.0 - rate) / f64::from(matches)).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    ((rate - margin).max(0.0), (rate + margin).min(1.0))
}

/// Two-sided z-test of the win rate against even odds.
fn even_odds_p_value(wins: u32, matches: u32) -> f64 {
    let Some(rate) = ratio(wins, matches) else {
        return 1.0;
    };
    let std_error = (EVEN_ODDS * (1.0 - EVEN_ODDS) / f64::from(matches)).sqrt();
    let z = ((rate - EVEN_ODDS) / std_error).abs();
    match Normal::new(0.0, 1.0) {
        Ok(normal) => (2.0 * (1.0 - normal.cdf(z))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub run_id: String,
    pub matches: usize,
    pub draws: usize,
    pub agents: Vec<AgentReport>,
}

impl AnalyticsSummary {
    pub fn agent(&self, name: &str) -> Option<&AgentReport> {
        self.agents.iter().find(|agent| agent.name == name)
    }

    pub fn render_markdown(&self) -> String {
        let mut rows = String::new();
        rows.push_str("# Match Summary\n\n");
        rows.push_str(&format!(
            "Run `{}`: {} matches, {} drawn at the turn limit\n\n",
            self.run_id, self.matches, self.draws
        ));
        rows.push_str("| Agent | Preset | Matches | Wins | Win % | 95% CI | p-value | Avg score | Challenge acc. | Answer acc. | Boast success | Avg ms/decision |\n");
        rows.push_str("|-------|--------|---------|------|-------|--------|---------|-----------|----------------|-------------|---------------|------------------|\n");

        for agent in &self.agents {
            rows.push_str(&format!(
                "| {name} | {preset} | {matches} | {wins} | {win:.1}% | [{ci_low:.3}, {ci_high:.3}] | {pval:.3} | {score:.2} | {challenge} | {answer} | {boast} | {latency:.3} |\n",
                name = agent.name,
                preset = agent.preset,
                matches = agent.matches,
                wins = agent.wins,
                win = agent.win_rate * 100.0,
                ci_low = agent.ci95.0,
                ci_high = agent.ci95.1,
                pval = agent.p_value,
                score = agent.avg_score,
                challenge = percent(agent.challenge_accuracy),
                answer = percent(agent.answer_accuracy),
                boast = percent(agent.boast_success),
                latency = agent.average_ms_per_decision,
            ));
        }

        rows
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        fs::write(path.as_ref(), self.render_markdown()).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }
}

fn percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub preset: String,
    pub matches: usize,
    pub wins: usize,
    pub draws: usize,
    pub win_rate: f64,
    pub ci95: (f64, f64),
    pub p_value: f64,
    pub avg_score: f64,
    pub challenge_accuracy: Option<f64>,
    pub answer_accuracy: Option<f64>,
    pub boast_success: Option<f64>,
    pub average_ms_per_decision: f64,
}
