//! Structured error types for the disclosure engine.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal problems loading configuration or a rule file.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("read {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("yaml: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("rule file has no `rules` list")]
  MissingRules,

  #[error("env {name}: {reason}")]
  InvalidEnv { name: String, reason: String },
}

impl ConfigError {
  pub fn invalid_env(name: &str, reason: impl Into<String>) -> Self {
    Self::InvalidEnv {
      name: name.to_string(),
      reason: reason.into(),
    }
  }
}

/// A single rule definition that cannot be evaluated. Never fatal: the rule is
/// skipped and the rest of the set still loads.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
  #[error("rule has no name")]
  EmptyName,

  #[error("{rule}: malformed definition: {reason}")]
  Malformed { rule: String, reason: String },

  #[error("{rule}: unknown rule type '{kind}'")]
  UnknownKind { rule: String, kind: String },

  #[error("{rule}: missing required field '{field}'")]
  MissingField { rule: String, field: String },

  #[error("{rule}: invalid pattern in '{field}': {reason}")]
  InvalidPattern {
    rule: String,
    field: String,
    reason: String,
  },

  #[error("{rule}: pattern in '{field}' must capture a value group")]
  MissingCaptureGroup { rule: String, field: String },

  #[error("{rule}: invalid operator '{operator}', expected one of > < >= <= ==")]
  InvalidOperator { rule: String, operator: String },

  #[error("{rule}: invalid logic '{logic}', expected AND or OR")]
  InvalidLogic { rule: String, logic: String },

  #[error("{rule}: invalid {field} '{value}'")]
  InvalidValue {
    rule: String,
    field: String,
    value: String,
  },
}

impl RuleError {
  pub fn missing(rule: &str, field: &str) -> Self {
    Self::MissingField {
      rule: rule.to_string(),
      field: field.to_string(),
    }
  }

  pub fn invalid_value(rule: &str, field: &str, value: &str) -> Self {
    Self::InvalidValue {
      rule: rule.to_string(),
      field: field.to_string(),
      value: value.to_string(),
    }
  }
}

/// Unexpected failure inside one evaluator; isolated to that rule.
#[derive(Debug, Error)]
pub enum EvalError {
  #[error("{rule}: match for '{field}' has no captured value")]
  MissingCapture { rule: String, field: String },

  #[error("{rule}: evaluator panicked: {reason}")]
  Panicked { rule: String, reason: String },
}

impl EvalError {
  pub fn missing_capture(rule: &str, field: &str) -> Self {
    Self::MissingCapture {
      rule: rule.to_string(),
      field: field.to_string(),
    }
  }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
  #[error("invalid log level/filter '{value}': {source}")]
  EnvFilter {
    value: String,
    #[source]
    source: tracing_subscriber::filter::ParseError,
  },

  #[error("subscriber: {0}")]
  Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rule_errors_name_the_rule_and_field() {
    let err = RuleError::missing("excessive_origination", "threshold");
    let msg = err.to_string();
    assert!(msg.contains("excessive_origination"));
    assert!(msg.contains("threshold"));
  }

  #[test]
  fn io_error_mentions_path() {
    let err = ConfigError::Io {
      path: PathBuf::from("/nope/rules.yaml"),
      source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
    };
    assert!(err.to_string().contains("/nope/rules.yaml"));
  }
}
