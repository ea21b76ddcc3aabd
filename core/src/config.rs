use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use jsonschema::{JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    arbitration::ArbitrationConfig,
    router::{RouterConfig, RouterModeSetting},
    router_node::RouterNodeConfig,
};

const BUILTIN_SCHEMA: &str = include_str!("../chainproof.schema.json");

pub const ROUTER_URL_ENV: &str = "CORTENSOR_ROUTER_URL";
pub const SIMULATION_MODE_ENV: &str = "CHAINPROOF_SIMULATION_MODE";
pub const ALERT_WEBHOOK_ENV: &str = "ALERT_WEBHOOK_URL";
pub const NODE_MODEL_ENV: &str = "MODEL_NAME";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub arbitration: ArbitrationConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub router_node: RouterNodeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_enabled_true() -> bool {
    true
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs/chainproof")
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_stderr_level() -> String {
    "warn".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

fn default_logging_retention_days() -> usize {
    14
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
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
    /// Per-target levels layered over `filter`, keyed by tracing target.
    #[serde(default)]
    pub targets: BTreeMap<String, String>,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_enabled: bool,
    #[serde(default = "default_stderr_level")]
    pub stderr_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            targets: BTreeMap::new(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_enabled: true,
            stderr_level: default_stderr_level(),
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config_value: Value = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        let schema = resolve_schema(config_base, &config_value)?;
        validate_against_schema(&config_value, &schema)?;

        let mut config: Config =
            serde_json::from_value(config_value).context("failed to deserialize config")?;

        if !config.logging.dir.is_absolute() {
            config.logging.dir = config_base.join(&config.logging.dir);
        }
        config.apply_env_overrides(|key| env::var(key).ok());

        Ok(config)
    }

    /// Loads `config_path` when it exists, otherwise starts from defaults.
    /// Env overrides apply in both cases.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }

        let mut config = Config::default();
        config.apply_env_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(endpoint) = non_empty(ROUTER_URL_ENV) {
            self.router.endpoint = endpoint;
        }
        if let Some(flag) = non_empty(SIMULATION_MODE_ENV)
            && is_truthy(&flag)
        {
            self.router.mode = RouterModeSetting::Simulated;
        }
        if let Some(webhook_url) = non_empty(ALERT_WEBHOOK_ENV) {
            self.alerts.webhook_url = Some(webhook_url);
        }
        if let Some(model_name) = non_empty(NODE_MODEL_ENV) {
            self.router_node.model_name = model_name;
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

enum SchemaSource {
    File(PathBuf),
    Builtin,
}

fn resolve_schema(config_base: &Path, config_value: &Value) -> Result<SchemaSource> {
    if let Some(path_text) = config_value.get("$schema").and_then(|value| value.as_str()) {
        let configured = PathBuf::from(path_text);
        if configured.is_absolute() {
            return Ok(SchemaSource::File(configured));
        }
        return Ok(SchemaSource::File(config_base.join(&configured)));
    }

    let root_default = config_base.join("core/chainproof.schema.json");
    if root_default.exists() {
        return Ok(SchemaSource::File(root_default));
    }

    let local_default = config_base.join("chainproof.schema.json");
    if local_default.exists() {
        return Ok(SchemaSource::File(local_default));
    }

    Ok(SchemaSource::Builtin)
}

fn load_schema(source: &SchemaSource) -> Result<Value> {
    match source {
        SchemaSource::File(schema_path) => {
            let schema_content = fs::read_to_string(schema_path)
                .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
            serde_json::from_str(&schema_content)
                .with_context(|| format!("failed to parse schema {}", schema_path.display()))
        }
        SchemaSource::Builtin => {
            serde_json::from_str(BUILTIN_SCHEMA).context("failed to parse built-in config schema")
        }
    }
}

fn validate_against_schema(config_value: &Value, source: &SchemaSource) -> Result<()> {
    let schema = load_schema(source)?;
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
