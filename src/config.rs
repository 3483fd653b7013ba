use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, anyhow};
use jsonschema::{JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::director::policy::{AlmostCompleteMode, ReschedulePolicy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub r#loop: AgentLoopConfig,
    #[serde(default)]
    pub director: DirectorConfig,
    #[serde(default)]
    pub reactive: ReactiveConfig,
    pub backend: BackendConfig,
}

fn default_enabled_true() -> bool {
    true
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs/volition")
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

fn default_logging_retention_days() -> usize {
    14
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_warn_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TickMissedBehavior {
    Skip,
    Delay,
    Burst,
}

fn default_inbound_queue_capacity() -> usize {
    64
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_tick_missed_behavior() -> TickMissedBehavior {
    TickMissedBehavior::Skip
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentLoopConfig {
    #[serde(default = "default_inbound_queue_capacity")]
    pub inbound_queue_capacity: usize,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_tick_missed_behavior")]
    pub tick_missed_behavior: TickMissedBehavior,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            inbound_queue_capacity: default_inbound_queue_capacity(),
            tick_interval_ms: default_tick_interval_ms(),
            tick_missed_behavior: default_tick_missed_behavior(),
        }
    }
}

fn default_boot_timeout_ms() -> u64 {
    5_000
}

fn default_response_timeout_ms() -> u64 {
    2_000
}

fn default_max_backend_tries() -> u32 {
    3
}

fn default_almost_complete_threshold() -> f64 {
    0.75
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorConfig {
    #[serde(default = "default_boot_timeout_ms")]
    pub boot_timeout_ms: u64,
    #[serde(default)]
    pub expected_peers: Vec<String>,
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    #[serde(default = "default_max_backend_tries")]
    pub max_backend_tries: u32,
    #[serde(default)]
    pub reschedule_policy: ReschedulePolicy,
    #[serde(default = "default_almost_complete_threshold")]
    pub almost_complete_threshold: f64,
    #[serde(default)]
    pub almost_complete_policy: AlmostCompleteMode,
    #[serde(default = "default_enabled_true")]
    pub check_precondition: bool,
    #[serde(default = "default_enabled_true")]
    pub check_context: bool,
    /// Abort once reported time passes `factor × estimated deadline`.
    #[serde(default)]
    pub deadline_abort_factor: Option<f64>,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            boot_timeout_ms: default_boot_timeout_ms(),
            expected_peers: Vec::new(),
            response_timeout_ms: default_response_timeout_ms(),
            max_backend_tries: default_max_backend_tries(),
            reschedule_policy: ReschedulePolicy::default(),
            almost_complete_threshold: default_almost_complete_threshold(),
            almost_complete_policy: AlmostCompleteMode::default(),
            check_precondition: true,
            check_context: true,
            deadline_abort_factor: None,
        }
    }
}

impl DirectorConfig {
    pub fn boot_timeout(&self) -> Duration {
        Duration::from_millis(self.boot_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms.max(1))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReactiveConfig {
    /// JSON5 rule file; no file means the rule engine stays idle.
    #[serde(default)]
    pub rules_path: Option<PathBuf>,
}

fn default_time_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub domain_path: PathBuf,
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config_value: Value = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        let schema_path = resolve_schema_path(config_base, &config_value)?;
        validate_against_schema(&config_value, &schema_path)?;

        let mut config: Config =
            serde_json::from_value(config_value).context("failed to deserialize config")?;

        if !config.backend.domain_path.is_absolute() {
            config.backend.domain_path = config_base.join(&config.backend.domain_path);
        }
        if let Some(rules_path) = config.reactive.rules_path.as_mut() {
            if !rules_path.is_absolute() {
                *rules_path = config_base.join(&rules_path);
            }
        }
        if !config.logging.dir.is_absolute() {
            config.logging.dir = config_base.join(&config.logging.dir);
        }

        Ok(config)
    }
}

fn resolve_schema_path(config_base: &Path, config_value: &Value) -> Result<PathBuf> {
    if let Some(path_text) = config_value.get("$schema").and_then(|value| value.as_str()) {
        let configured = PathBuf::from(path_text);
        if configured.is_absolute() {
            return Ok(configured);
        }
        return Ok(config_base.join(&configured));
    }

    let local_default = config_base.join("volition.schema.json");
    if local_default.exists() {
        return Ok(local_default);
    }

    Err(anyhow!(
        "unable to resolve schema path: expected $schema in config or volition.schema.json"
    ))
}

fn validate_against_schema(config_value: &Value, schema_path: &Path) -> Result<()> {
    let schema_content = fs::read_to_string(schema_path)
        .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
    let schema: Value = serde_json::from_str(&schema_content)
        .with_context(|| format!("failed to parse schema {}", schema_path.display()))?;

    let compiled =
        JSONSchema::compile(&schema).map_err(|e| anyhow!("failed to compile schema: {e}"))?;

    match compiled.validate(config_value) {
        Ok(()) => Ok(()),
        Err(errors_iter) => {
            let validation_errors: Vec<ValidationError> = errors_iter.collect();
            let messages: Vec<String> = validation_errors
                .into_iter()
                .map(|error| error.to_string())
                .collect();
            Err(anyhow!("config validation failed: {}", messages.join("; ")))
        }
    }
}
