//! Compiles `config/gesture.toml` into the Rust constants the detector is built with.
//!
//! The root crate calls [`generate_from_path`] from its build script; the replay tool
//! uses [`parse_gesture_str`] + [`validate_config`] to load alternative timings at runtime.

use std::{fmt, fs, path::Path};

use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GestureConfig {
    pub pattern: PatternConfig,
    pub swipe: SwipeConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternConfig {
    pub max_period_ms: u64,
    pub target_swipe_count: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwipeConfig {
    pub max_interval_ms: u64,
    pub min_period_ms: u64,
    pub max_period_ms: u64,
}

#[derive(Debug)]
pub enum ConfigCompilerError {
    Io(String),
    Parse(String),
    Validation(String),
}

impl fmt::Display for ConfigCompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "io error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigCompilerError {}

pub fn parse_gesture_file(path: &Path) -> Result<GestureConfig, ConfigCompilerError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| ConfigCompilerError::Io(format!("{}: {e}", path.display())))?;
    parse_gesture_str(&raw)
        .map_err(|e| match e {
            ConfigCompilerError::Parse(msg) => {
                ConfigCompilerError::Parse(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
}

pub fn parse_gesture_str(raw: &str) -> Result<GestureConfig, ConfigCompilerError> {
    toml::from_str(raw).map_err(|e| ConfigCompilerError::Parse(e.to_string()))
}

pub fn validate_config(config: &GestureConfig) -> Result<(), ConfigCompilerError> {
    let pattern = &config.pattern;
    let swipe = &config.swipe;

    if swipe.max_interval_ms == 0 {
        return Err(ConfigCompilerError::Validation(
            "swipe.max_interval_ms must be > 0".into(),
        ));
    }
    if swipe.min_period_ms <= swipe.max_interval_ms {
        return Err(ConfigCompilerError::Validation(
            "swipe.min_period_ms must be > swipe.max_interval_ms".into(),
        ));
    }
    if swipe.max_period_ms < swipe.min_period_ms {
        return Err(ConfigCompilerError::Validation(
            "swipe.max_period_ms must be >= swipe.min_period_ms".into(),
        ));
    }
    if pattern.target_swipe_count == 0 {
        return Err(ConfigCompilerError::Validation(
            "pattern.target_swipe_count must be >= 1".into(),
        ));
    }

    // Every swipe and every rest between two swipes lasts at least min_period_ms.
    let segments = 2 * pattern.target_swipe_count as u64 - 1;
    let shortest_pattern_ms = swipe.min_period_ms.checked_mul(segments).ok_or_else(|| {
        ConfigCompilerError::Validation("swipe.min_period_ms is too large".into())
    })?;
    if pattern.max_period_ms < shortest_pattern_ms {
        return Err(ConfigCompilerError::Validation(format!(
            "pattern.max_period_ms must be >= {shortest_pattern_ms} to fit {} swipes",
            pattern.target_swipe_count
        )));
    }

    Ok(())
}

pub fn render_generated_config(config: &GestureConfig) -> String {
    let mut out = String::new();
    out.push_str("// @generated by gesture_config_compiler. Do not edit.\n");
    out.push_str("pub const DEFAULT_GESTURE_TIMING: GestureTiming = GestureTiming {\n");
    out.push_str(&format!(
        "    pattern_max_period: Duration::from_millis({}),\n",
        config.pattern.max_period_ms
    ));
    out.push_str(&format!(
        "    swipe_max_interval: Duration::from_millis({}),\n",
        config.swipe.max_interval_ms
    ));
    out.push_str(&format!(
        "    swipe_min_period: Duration::from_millis({}),\n",
        config.swipe.min_period_ms
    ));
    out.push_str(&format!(
        "    swipe_max_period: Duration::from_millis({}),\n",
        config.swipe.max_period_ms
    ));
    out.push_str(&format!(
        "    target_swipe_count: {},\n",
        config.pattern.target_swipe_count
    ));
    out.push_str("};\n");
    out
}

pub fn generate_from_path(path: &Path) -> Result<String, ConfigCompilerError> {
    let config = parse_gesture_file(path)?;
    validate_config(&config)?;
    Ok(render_generated_config(&config))
}
