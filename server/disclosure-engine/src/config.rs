//! Engine configuration with sane defaults, overridable from the environment.

use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_RULES_PATH: &str = "rules-config.yaml";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Forensic score weights. A document starts at `max_score` and loses the
/// weight of each flag's severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
  pub max_score: u8,
  /// Deduction per high-severity flag.
  pub high_weight: u32,
  pub medium_weight: u32,
  pub low_weight: u32,
}

impl Default for ScoringConfig {
  fn default() -> Self {
    Self {
      max_score: 100,
      high_weight: 20,
      medium_weight: 10,
      low_weight: 5,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
  pub rules_path: PathBuf,
  /// Fallback filter when `RUST_LOG` is unset.
  pub log_level: String,
  pub scoring: ScoringConfig,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      rules_path: PathBuf::from(DEFAULT_RULES_PATH),
      log_level: DEFAULT_LOG_LEVEL.to_string(),
      scoring: ScoringConfig::default(),
    }
  }
}

impl EngineConfig {
  /// Defaults overlaid with `RULES_CONFIG_PATH`, `LOG_LEVEL`,
  /// `MAX_FORENSIC_SCORE` and `SEVERITY_WEIGHT_{HIGH,MEDIUM,LOW}`.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// Same as [`from_env`](Self::from_env) with an injectable variable source.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let mut cfg = Self::default();
    if let Some(path) = lookup("RULES_CONFIG_PATH").filter(|p| !p.trim().is_empty()) {
      cfg.rules_path = PathBuf::from(path.trim());
    }
    if let Some(level) = lookup("LOG_LEVEL").filter(|l| !l.trim().is_empty()) {
      cfg.log_level = level.trim().to_string();
    }
    if let Some(max) = parse_var(&lookup, "MAX_FORENSIC_SCORE")? {
      cfg.scoring.max_score = max;
    }
    if let Some(w) = parse_var(&lookup, "SEVERITY_WEIGHT_HIGH")? {
      cfg.scoring.high_weight = w;
    }
    if let Some(w) = parse_var(&lookup, "SEVERITY_WEIGHT_MEDIUM")? {
      cfg.scoring.medium_weight = w;
    }
    if let Some(w) = parse_var(&lookup, "SEVERITY_WEIGHT_LOW")? {
      cfg.scoring.low_weight = w;
    }
    Ok(cfg)
  }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
  T: std::str::FromStr,
  T::Err: std::fmt::Display,
  F: Fn(&str) -> Option<String>,
{
  match lookup(name) {
    None => Ok(None),
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map(Some)
      .map_err(|e| ConfigError::invalid_env(name, e.to_string())),
  }
}
