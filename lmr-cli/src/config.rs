//! CLI-specific configuration structures for TOML-based configuration.

use color_eyre::eyre::{Context, Result};
use lmr_core::config::RuntimeConfig;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

/// Deep merge JSON values - override takes precedence over base.
/// For objects, recursively merge; for arrays and primitives, override replaces base.
fn merge_json_values(base: &mut JsonValue, override_val: JsonValue) {
    match (base, override_val) {
        (JsonValue::Object(base_map), JsonValue::Object(override_map)) => {
            for (key, value) in override_map {
                if let Some(base_value) = base_map.get_mut(&key) {
                    merge_json_values(base_value, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base_val, override_val) => {
            *base_val = override_val;
        }
    }
}

/// Custom deserializer to handle both single string and array of strings for include.
fn deserialize_include_optional<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrVec {
        String(String),
        Vec(Vec<String>),
    }

    let opt: Option<StringOrVec> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(Vec::new()),
        Some(StringOrVec::String(s)) => Ok(vec![s]),
        Some(StringOrVec::Vec(v)) => Ok(v),
    }
}

/// Complete CLI configuration bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Optional path(s) to other config file(s) to include (relative to this
    /// config's directory). Supports a single string or an array of strings.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_include_optional")]
    pub include: Vec<String>,

    /// DSP/trunking/protocol configuration consumed by `lmr-core`.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Terminal interface configuration.
    #[serde(default)]
    pub terminal: TerminalConfig,

    /// P25 Phase 2 scrambler keys. Required for the P25P2 framer to emit
    /// any frames at all (`P25P2Framer::set_keys` must be called before
    /// descrambling can start); left unset, P25P2 decoding is skipped even
    /// if `runtime.protocols.p25_phase2` is enabled.
    #[serde(default)]
    pub p25p2_keys: Option<P25P2KeysConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct P25P2KeysConfig {
    pub wacn: u32,
    pub sysid: u16,
    pub nac: u16,
}

/// Terminal interface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Input IQ/audio WAV file. A mono file is treated as a real-valued
    /// discriminator/baseband stream; a stereo file is treated as
    /// interleaved I/Q.
    #[serde(default)]
    pub input: Option<PathBuf>,

    /// Samples processed per DSP block.
    #[serde(default = "default_block_len")]
    pub block_len: usize,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Telemetry sampling interval in seconds.
    #[serde(default = "default_telemetry_interval")]
    pub telemetry_interval_secs: f64,

    /// Directory the persisted CC-candidate cache lives in. Defaults to
    /// `lmr_core::cache::default_cache_dir()` when unset.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

fn default_telemetry_interval() -> f64 {
    1.0
}

fn default_block_len() -> usize {
    960
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            input: None,
            block_len: default_block_len(),
            logging: LoggingConfig::default(),
            telemetry_interval_secs: default_telemetry_interval(),
            cache_dir: None,
        }
    }
}

/// Logging output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log output target.
    #[serde(default = "default_log_target")]
    pub target: LogTarget,

    /// Log file path (if target is File).
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Log format.
    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// Log level filter.
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

fn default_log_target() -> LogTarget {
    LogTarget::Stdout
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            target: default_log_target(),
            file_path: None,
            format: default_log_format(),
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Converts the CLI's logging config into the core's subsystem
    /// `LogConfig`, used only for the `enable_*` filters the core logger
    /// consults -- the CLI's own `StructuredLogger` handles rendering.
    pub fn to_core_log_config(&self) -> lmr_core::logging::LogConfig {
        use lmr_core::logging::{LogConfig as CoreLogConfig, LogLevel as CoreLogLevel};

        let level = match self.level {
            LogLevel::Debug => CoreLogLevel::Debug,
            LogLevel::Info => CoreLogLevel::Info,
            LogLevel::Warn => CoreLogLevel::Warn,
            LogLevel::Error => CoreLogLevel::Error,
        };

        CoreLogConfig { level, enable_timing: true, enable_carrier: true, enable_framing: true, enable_fec: true, max_entries: 1000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Logfmt,
    Pretty,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self { include: Vec::new(), runtime: RuntimeConfig::default(), terminal: TerminalConfig::default(), p25p2_keys: None }
    }
}

impl CliConfig {
    /// Loads configuration from a TOML file, recursively resolving
    /// `include` directives relative to each file's own directory and deep
    /// merging them in order (later entries, and the file itself, win).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let config_toml: toml::Value = toml::from_str(&content).wrap_err("Failed to parse TOML configuration")?;
        let mut config_json = serde_json::to_value(&config_toml).wrap_err("Failed to convert TOML to JSON")?;

        let includes = match config_json.get("include") {
            Some(JsonValue::String(s)) => vec![s.clone()],
            Some(JsonValue::Array(arr)) => arr.iter().filter_map(|v| v.as_str().map(String::from)).collect(),
            _ => Vec::new(),
        };

        if let JsonValue::Object(ref mut map) = config_json {
            map.remove("include");
        }

        let mut base_json = serde_json::to_value(Self::default()).wrap_err("Failed to create default config")?;

        for include_path in &includes {
            let include_full_path = if Path::new(include_path).is_absolute() {
                PathBuf::from(include_path)
            } else {
                path.parent().unwrap_or_else(|| Path::new(".")).join(include_path)
            };

            let included_config =
                Self::from_file(&include_full_path).wrap_err_with(|| format!("Failed to load included config: {}", include_full_path.display()))?;
            let included_json = serde_json::to_value(&included_config).wrap_err("Failed to convert included config to JSON")?;
            merge_json_values(&mut base_json, included_json);
        }

        merge_json_values(&mut base_json, config_json);

        let config: CliConfig = serde_json::from_value(base_json).wrap_err("Failed to parse final configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes_and_round_trips() {
        let cfg = CliConfig::default();
        let json = serde_json::to_value(&cfg).unwrap();
        let back: CliConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.terminal.block_len, cfg.terminal.block_len);
    }

    #[test]
    fn merge_json_values_prefers_override_for_scalars() {
        let mut base = serde_json::json!({"a": 1, "b": {"c": 2, "d": 3}});
        let over = serde_json::json!({"b": {"c": 9}});
        merge_json_values(&mut base, over);
        assert_eq!(base["a"], 1);
        assert_eq!(base["b"]["c"], 9);
        assert_eq!(base["b"]["d"], 3);
    }

    #[test]
    fn include_string_or_array_both_parse() {
        #[derive(Deserialize)]
        struct Wrap {
            #[serde(deserialize_with = "deserialize_include_optional")]
            include: Vec<String>,
        }
        let single: Wrap = serde_json::from_value(serde_json::json!({"include": "base.toml"})).unwrap();
        assert_eq!(single.include, vec!["base.toml".to_string()]);
        let many: Wrap = serde_json::from_value(serde_json::json!({"include": ["a.toml", "b.toml"]})).unwrap();
        assert_eq!(many.include, vec!["a.toml".to_string(), "b.toml".to_string()]);
    }
}
