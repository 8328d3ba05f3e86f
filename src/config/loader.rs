//! Flat `key=value` text configuration format: one option per line,
//! `#`-prefixed comments (including section-header comments), validated
//! against [`crate::config::schema::SCHEMA`] on load and on every set.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::schema::{all_specs, find, OptionRange, OptionSpec, OptionType};

#[derive(Debug)]
pub enum ConfigError {
    UnknownOption(String),
    InvalidValue { key: String, value: String, reason: String },
    OutOfRange { key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownOption(k) => write!(f, "unknown option: {}", k),
            ConfigError::InvalidValue { key, value, reason } => {
                write!(f, "invalid value for {}: '{}' ({})", key, value, reason)
            }
            ConfigError::OutOfRange { key, value } => {
                write!(f, "value for {} out of range: {}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// A fully resolved configuration: every schema option's value, as text,
/// defaulted from [`schema::SCHEMA`] and then overridden by whatever was
/// loaded or set.
#[derive(Debug, Clone)]
pub struct Config {
    values: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut values = BTreeMap::new();
        for spec in all_specs() {
            values.insert(spec.name.to_string(), spec.default.to_string());
        }
        Config { values }
    }
}

impl Config {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn get_float(&self, key: &str) -> f64 {
        self.get(key).and_then(|v| v.parse().ok()).unwrap_or(0.0)
    }

    pub fn get_int(&self, key: &str) -> i64 {
        self.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
    }

    pub fn get_bool(&self, key: &str) -> bool {
        matches!(self.get(key), Some("true") | Some("True"))
    }

    /// Sets `key` to `value`, validating it against the schema first.
    /// Unknown keys ignored with a diagnostic, per loading behavior below.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let spec = find(key).ok_or_else(|| ConfigError::UnknownOption(key.to_string()))?;
        validate(&spec, value)?;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Parses `text` as `key=value` lines, applying each to a fresh default
    /// configuration. Blank lines and `#`-prefixed lines (including section
    /// headers written as comments) are skipped. Every per-line validation
    /// failure — unknown key, wrong type, or out-of-range value — is logged
    /// and the affected option is left at its previous (default) value;
    /// nothing about a single bad line fails the whole load.
    pub fn from_text(text: &str) -> Result<Self, ConfigError> {
        let mut cfg = Config::default();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                tracing::warn!(line = lineno + 1, "ignoring malformed config line");
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            match cfg.set(key, value) {
                Ok(()) => {}
                Err(ConfigError::UnknownOption(_)) => {
                    tracing::warn!(key, "ignoring unknown config option");
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "ignoring invalid config value, keeping previous value");
                }
            }
        }
        Ok(cfg)
    }

    /// Serializes back to the flat `key=value` format, grouped by section
    /// with a `# Section` comment header, in schema order.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let mut last_section: Option<&str> = None;
        for spec in all_specs() {
            if last_section != Some(spec.section) {
                if last_section.is_some() {
                    out.push('\n');
                }
                out.push_str(&format!("# {}\n", spec.section));
                last_section = Some(spec.section);
            }
            let value = self.values.get(spec.name).cloned().unwrap_or_default();
            out.push_str(&format!("{}={}\n", spec.name, value));
        }
        out
    }
}

fn validate(spec: &OptionSpec, value: &str) -> Result<(), ConfigError> {
    match spec.kind {
        OptionType::Bool => {
            if !matches!(value, "true" | "True" | "false" | "False") {
                return Err(ConfigError::InvalidValue {
                    key: spec.name.to_string(),
                    value: value.to_string(),
                    reason: "expected true/True/false/False".to_string(),
                });
            }
        }
        OptionType::Int => {
            let n: i64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: spec.name.to_string(),
                value: value.to_string(),
                reason: "expected an integer".to_string(),
            })?;
            if let OptionRange::IntRange(lo, hi) = spec.range {
                if n < lo || n > hi {
                    return Err(ConfigError::OutOfRange { key: spec.name.to_string(), value: value.to_string() });
                }
            }
        }
        OptionType::Float => {
            let x: f64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: spec.name.to_string(),
                value: value.to_string(),
                reason: "expected a number".to_string(),
            })?;
            if let OptionRange::FloatRange(lo, hi) = spec.range {
                if x < lo || x > hi {
                    return Err(ConfigError::OutOfRange { key: spec.name.to_string(), value: value.to_string() });
                }
            }
        }
        OptionType::Enum => {
            if let OptionRange::Enum(options) = spec.range {
                if !options.contains(&value) {
                    return Err(ConfigError::InvalidValue {
                        key: spec.name.to_string(),
                        value: value.to_string(),
                        reason: format!("expected one of {:?}", options),
                    });
                }
            }
        }
    }
    Ok(())
}
