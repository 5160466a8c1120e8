use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tells_bot::{Personality, PersonalityKind, ProfileError, ThinkingDelay};
use tells_core::game::match_state::DEFAULT_TARGET_SCORE;
use thiserror::Error;
use tracing::Level;

const DEFAULT_MAX_TURNS: usize = 400;
const MAX_PACING_MS: u64 = 10_000;
const REQUIRED_AGENTS: usize = 2;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root benchmark configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub matches: MatchConfig,
    pub agents: Vec<AgentConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
}

impl BenchmarkConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.matches.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        self.pacing.validate()?;
        validate_agents(&self.agents)?;
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }
}

/// Match scheduling block.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MatchConfig {
    pub seed: Option<u64>,
    pub count: usize,
    #[serde(default = "default_target_score")]
    pub target_score: u8,
    /// Actions allowed before a match is abandoned as a draw.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Swap which agent sits North (and so moves first) on every other match.
    #[serde(default = "default_alternate_seats")]
    pub alternate_seats: bool,
}

impl MatchConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::InvalidField {
                field: "matches.count".to_string(),
                message: "number of matches must be greater than zero".to_string(),
            });
        }

        if self.target_score == 0 {
            return Err(ValidationError::InvalidField {
                field: "matches.target_score".to_string(),
                message: "target score must be at least 1".to_string(),
            });
        }

        if self.max_turns == 0 {
            return Err(ValidationError::InvalidField {
                field: "matches.max_turns".to_string(),
                message: "turn limit must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

fn default_target_score() -> u8 {
    DEFAULT_TARGET_SCORE
}

fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

fn default_alternate_seats() -> bool {
    true
}

/// One of the two engines in the run.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default = "default_personality")]
    pub personality: PersonalityKind,
    #[serde(default)]
    pub overrides: PersonalityOverrides,
}

fn default_personality() -> PersonalityKind {
    PersonalityKind::Balanced
}

impl AgentConfig {
    /// The preset with any configured overrides applied, validated.
    pub fn resolve_personality(&self) -> Result<Personality, ProfileError> {
        let mut personality = Personality::preset(self.personality);
        self.overrides.apply(&mut personality);
        personality.validate()?;
        Ok(personality)
    }
}

/// Field-level adjustments on top of a personality preset.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PersonalityOverrides {
    pub retention: Option<f32>,
    pub swap_confusion_penalty: Option<f32>,
    pub challenge_confidence_threshold: Option<f32>,
    pub allow_blind_challenge: Option<bool>,
    pub boast_doubt_probability: Option<f32>,
    pub boast_confidence: Option<f32>,
    #[serde(default)]
    pub action_weights: WeightOverrides,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WeightOverrides {
    pub place: Option<f32>,
    pub swap: Option<f32>,
    pub challenge: Option<f32>,
    pub peek: Option<f32>,
}

impl PersonalityOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply(&self, personality: &mut Personality) {
        if let Some(value) = self.retention {
            personality.retention = value;
        }
        if let Some(value) = self.swap_confusion_penalty {
            personality.swap_confusion_penalty = value;
        }
        if let Some(value) = self.challenge_confidence_threshold {
            personality.challenge_confidence_threshold = value;
        }
        if let Some(value) = self.allow_blind_challenge {
            personality.allow_blind_challenge = value;
        }
        if let Some(value) = self.boast_doubt_probability {
            personality.boast_doubt_probability = value;
        }
        if let Some(value) = self.boast_confidence {
            personality.boast_confidence = value;
        }

        let weights = &mut personality.action_weights;
        if let Some(value) = self.action_weights.place {
            weights.place = value;
        }
        if let Some(value) = self.action_weights.swap {
            weights.swap = value;
        }
        if let Some(value) = self.action_weights.challenge {
            weights.challenge = value;
        }
        if let Some(value) = self.action_weights.peek {
            weights.peek = value;
        }
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    /// Per-belief memory dumps (forces `TELLS_MEMORY_DETAILS=1`).
    #[serde(default)]
    pub memory_details: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            memory_details: false,
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

/// Thinking delay applied to every engine decision. Off by default.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PacingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub min_ms: u64,
    #[serde(default)]
    pub max_ms: u64,
}

impl PacingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }

        if self.min_ms > self.max_ms {
            return Err(ValidationError::InvalidField {
                field: "pacing.min_ms".to_string(),
                message: format!(
                    "minimum delay {} ms exceeds maximum {} ms",
                    self.min_ms, self.max_ms
                ),
            });
        }

        if self.max_ms > MAX_PACING_MS {
            return Err(ValidationError::InvalidField {
                field: "pacing.max_ms".to_string(),
                message: format!("delay may not exceed {MAX_PACING_MS} ms"),
            });
        }

        Ok(())
    }

    pub fn delay(&self) -> ThinkingDelay {
        if self.enabled {
            ThinkingDelay::between(self.min_ms, self.max_ms)
        } else {
            ThinkingDelay::NONE
        }
    }
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_agents(agents: &[AgentConfig]) -> Result<(), ValidationError> {
    if agents.len() != REQUIRED_AGENTS {
        return Err(ValidationError::InvalidField {
            field: "agents".to_string(),
            message: format!(
                "exactly {REQUIRED_AGENTS} agents are required, found {}",
                agents.len()
            ),
        });
    }

    let mut seen = HashSet::new();
    for agent in agents {
        if agent.name.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "agents.name".to_string(),
                message: "agent name must not be empty".to_string(),
            });
        }

        if !agent.name.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
            return Err(ValidationError::InvalidField {
                field: format!("agents[{}].name", agent.name),
                message: "agent name contains invalid characters".to_string(),
            });
        }

        if !seen.insert(agent.name.as_str()) {
            return Err(ValidationError::InvalidField {
                field: "agents".to_string(),
                message: format!("agent name '{}' defined more than once", agent.name),
            });
        }

        agent
            .resolve_personality()
            .map_err(|err| ValidationError::InvalidField {
                field: format!("agents[{}].overrides", agent.name),
                message: err.to_string(),
            })?;
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

impl ResolvedOutputs {
    /// Directory that receives telemetry next to the summary table.
    pub fn telemetry_dir(&self) -> PathBuf {
        self.summary_md
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_YAML: &str = r#"
run_id: "memory_smoke"
matches:
  seed: 123
  count: 16
agents:
  - name: "steady"
    personality: "cautious"
  - name: "gambler"
    personality: "reckless"
    overrides:
      retention: 0.7
      action_weights:
        challenge: 3.0
outputs:
  jsonl: "bench/out/{run_id}/matches.jsonl"
  summary_md: "bench/out/{run_id}/summary.md"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    fn parse(yaml: &str) -> BenchmarkConfig {
        serde_yaml::from_str(yaml).expect("parse yaml")
    }

    fn field_of(err: ValidationError) -> String {
        match err {
            ValidationError::InvalidField { field, .. } => field,
        }
    }

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg = parse(BASIC_YAML);
        cfg.validate().expect("validate");

        assert_eq!(cfg.matches.target_score, DEFAULT_TARGET_SCORE);
        assert_eq!(cfg.matches.max_turns, DEFAULT_MAX_TURNS);
        assert!(cfg.matches.alternate_seats);
        assert!(cfg.logging.enable_structured);
        assert!(!cfg.pacing.enabled);
        assert_eq!(cfg.pacing.delay(), ThinkingDelay::NONE);

        let outputs = cfg.resolved_outputs();
        assert_eq!(
            outputs.jsonl,
            PathBuf::from("bench/out/memory_smoke/matches.jsonl")
        );
        assert_eq!(
            outputs.telemetry_dir(),
            PathBuf::from("bench/out/memory_smoke")
        );
    }

    #[test]
    fn overrides_layer_on_top_of_preset() {
        let cfg = parse(BASIC_YAML);
        let gambler = cfg.agents[1].resolve_personality().expect("valid profile");
        let reckless = Personality::reckless();

        assert!((gambler.retention - 0.7).abs() < 1e-6);
        assert!((gambler.action_weights.challenge - 3.0).abs() < 1e-6);
        assert_eq!(gambler.action_weights.swap, reckless.action_weights.swap);
        assert_eq!(gambler.allow_blind_challenge, reckless.allow_blind_challenge);

        let steady = cfg.agents[0].resolve_personality().expect("valid profile");
        assert!(cfg.agents[0].overrides.is_empty());
        assert_eq!(steady, Personality::cautious());
    }

    #[test]
    fn rejects_out_of_range_override() {
        let yaml = BASIC_YAML.replace("retention: 0.7", "retention: 1.5");
        let mut cfg = parse(&yaml);
        let err = cfg.validate().expect_err("retention above one");
        assert_eq!(field_of(err), "agents[gambler].overrides");
    }

    #[test]
    fn rejects_unknown_override_field() {
        let yaml = BASIC_YAML.replace("retention: 0.7", "memory: 0.7");
        assert!(serde_yaml::from_str::<BenchmarkConfig>(&yaml).is_err());
    }

    #[test]
    fn requires_exactly_two_agents() {
        let yaml = BASIC_YAML.replace(
            "  - name: \"steady\"\n    personality: \"cautious\"\n",
            "",
        );
        let mut cfg = parse(&yaml);
        assert_eq!(cfg.agents.len(), 1);
        let err = cfg.validate().expect_err("single agent");
        assert_eq!(field_of(err), "agents");
    }

    #[test]
    fn rejects_duplicate_agents() {
        let yaml = BASIC_YAML.replace("gambler", "steady");
        let mut cfg = parse(&yaml);
        let err = cfg.validate().expect_err("duplicate agents should fail");
        assert_eq!(field_of(err), "agents");
    }

    #[test]
    fn rejects_invalid_run_id() {
        let yaml = BASIC_YAML.replace("memory_smoke", "memory smoke");
        let mut cfg = parse(&yaml);
        let err = cfg.validate().expect_err("invalid run id");
        assert_eq!(field_of(err), "run_id");
    }

    #[test]
    fn rejects_zero_matches() {
        let yaml = BASIC_YAML.replace("count: 16", "count: 0");
        let mut cfg = parse(&yaml);
        let err = cfg.validate().expect_err("zero matches");
        assert_eq!(field_of(err), "matches.count");
    }

    #[test]
    fn pacing_bounds_are_checked_only_when_enabled() {
        let yaml = format!("{BASIC_YAML}pacing:\n  enabled: false\n  min_ms: 90\n  max_ms: 10\n");
        let mut cfg = parse(&yaml);
        cfg.validate().expect("disabled pacing is not checked");

        cfg.pacing.enabled = true;
        let err = cfg.validate().expect_err("reversed bounds");
        assert_eq!(field_of(err), "pacing.min_ms");

        cfg.pacing.min_ms = 5;
        cfg.pacing.max_ms = 20;
        cfg.validate().expect("valid pacing");
        assert_eq!(cfg.pacing.delay(), ThinkingDelay::between(5, 20));
    }

    #[test]
    fn defaults_missing_personality_to_balanced() {
        let yaml = BASIC_YAML.replace("    personality: \"cautious\"\n", "");
        let cfg = parse(&yaml);
        assert_eq!(cfg.agents[0].personality, PersonalityKind::Balanced);
    }
}
