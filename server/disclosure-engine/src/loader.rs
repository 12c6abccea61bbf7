//! Rule-file loading. A bad rule is skipped with a warning; a bad file is a
//! [`ConfigError`].

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ConfigError, RuleError};
use crate::rule::{RawRule, Rule};

/// An immutable, ordered set of validated rules. Reloading builds a new set.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
  rules: Vec<Rule>,
  skipped: Vec<RuleError>,
  digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RulesSummary {
  pub total_rules: usize,
  pub enabled_rules: usize,
  pub disabled_rules: usize,
  pub skipped_rules: usize,
  pub rule_types: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
  pub valid: bool,
  pub errors: Vec<String>,
  pub warnings: Vec<String>,
}

impl RuleSet {
  pub fn empty() -> Self {
    Self {
      digest: digest(&[]),
      ..Self::default()
    }
  }

  /// Build from already-parsed definitions, in order. Invalid entries are
  /// recorded in [`skipped`](Self::skipped).
  pub fn from_raw(raw: &[RawRule]) -> Self {
    let entries: Vec<Value> = raw
      .iter()
      .filter_map(|r| serde_json::to_value(r).ok())
      .collect();
    Self::from_entries(entries)
  }

  pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
    let doc: Value = serde_yaml::from_str(source)?;
    Ok(Self::from_entries(rule_entries(doc)?))
  }

  pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
    let doc: Value = serde_json::from_str(source)?;
    Ok(Self::from_entries(rule_entries(doc)?))
  }

  /// Load a rule file; `.json` files are JSON, anything else YAML.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    let is_json = path
      .extension()
      .and_then(|e| e.to_str())
      .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let set = if is_json {
      Self::from_json_str(&source)?
    } else {
      Self::from_yaml_str(&source)?
    };
    info!(
      path = %path.display(),
      loaded = set.rules.len(),
      skipped = set.skipped.len(),
      digest = %set.digest,
      "rules loaded"
    );
    Ok(set)
  }

  /// Like [`load`](Self::load), but a broken or missing file yields an empty
  /// set so analysis can still run.
  pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
    let path = path.as_ref();
    Self::load(path).unwrap_or_else(|e| {
      warn!(path = %path.display(), error = %e, "rule file unusable; running with no rules");
      Self::empty()
    })
  }

  fn from_entries(entries: Vec<Value>) -> Self {
    let digest = digest(&entries);
    let mut rules = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();

    for (index, entry) in entries.into_iter().enumerate() {
      match parse_entry(index, entry) {
        Ok(rule) => rules.push(rule),
        Err(e) => {
          warn!(error = %e, "skipping rule");
          skipped.push(e);
        }
      }
    }

    Self {
      rules,
      skipped,
      digest,
    }
  }

  pub fn rules(&self) -> &[Rule] {
    &self.rules
  }

  pub fn skipped(&self) -> &[RuleError] {
    &self.skipped
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  /// Identifies the rule definitions this set was built from.
  pub fn digest(&self) -> &str {
    &self.digest
  }

  pub fn summary(&self) -> RulesSummary {
    let enabled_rules = self.rules.iter().filter(|r| r.enabled).count();
    let mut rule_types = BTreeMap::new();
    for rule in &self.rules {
      *rule_types.entry(rule.kind.type_name().to_string()).or_insert(0) += 1;
    }
    RulesSummary {
      total_rules: self.rules.len() + self.skipped.len(),
      enabled_rules,
      disabled_rules: self.rules.len() - enabled_rules,
      skipped_rules: self.skipped.len(),
      rule_types,
    }
  }

  /// Skipped rules are errors; suspicious but usable rules are warnings.
  pub fn validate(&self) -> Validation {
    let errors: Vec<String> = self.skipped.iter().map(ToString::to_string).collect();
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();
    for rule in &self.rules {
      if rule.message.trim().is_empty() {
        warnings.push(format!("{}: empty message", rule.name));
      }
      if !seen.insert(rule.name.as_str()) {
        warnings.push(format!(
          "{}: duplicate name; only the first triggered definition can flag",
          rule.name
        ));
      }
    }
    Validation {
      valid: errors.is_empty(),
      errors,
      warnings,
    }
  }
}

/// Accepts `{ rules: [...] }` or a bare list.
fn rule_entries(doc: Value) -> Result<Vec<Value>, ConfigError> {
  match doc {
    Value::Array(entries) => Ok(entries),
    Value::Object(mut map) => match map.remove("rules") {
      Some(Value::Array(entries)) => Ok(entries),
      Some(Value::Null) => Ok(Vec::new()),
      _ => Err(ConfigError::MissingRules),
    },
    _ => Err(ConfigError::MissingRules),
  }
}

fn parse_entry(index: usize, entry: Value) -> Result<Rule, RuleError> {
  let label = entry
    .get("name")
    .and_then(Value::as_str)
    .map(str::to_string)
    .unwrap_or_else(|| format!("rules[{}]", index));
  let raw: RawRule = serde_json::from_value(entry).map_err(|e| RuleError::Malformed {
    rule: label,
    reason: e.to_string(),
  })?;
  Rule::try_from(&raw)
}

/// blake3 over the canonical JSON of each entry, first 32 hex chars.
fn digest(entries: &[Value]) -> String {
  let mut hasher = blake3::Hasher::new();
  for entry in entries {
    hasher.update(entry.to_string().as_bytes());
    hasher.update(b"|");
  }
  let hex = hasher.finalize().to_hex();
  hex[..32].to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  const RULES: &str = r#"
rules:
  - name: excessive_closing_costs
    type: numeric_threshold
    pattern: 'Total Closing Costs.*?\$([0-9,]+\.\d{2})'
    threshold: 5000
    message: "Closing costs of ${value} are excessive"
  - name: no_escrow
    type: regex_absence
    pattern: 'escrow account'
    enabled: false
    message: "No escrow account"
  - name: mystery
    type: vibes_check
    message: "?"
  - name: no_threshold
    type: numeric_threshold
    pattern: 'Fee \$([0-9]+)'
    message: "fee"
  - type: regex_presence
    pattern: 'x'
    message: "nameless"
  - name: bad_threshold
    type: regex_amount
    pattern: 'Fee \$([0-9]+)'
    threshold: "lots"
    message: "fee"
"#;

  #[test]
  fn bad_rules_are_skipped_not_fatal() {
    let set = RuleSet::from_yaml_str(RULES).unwrap();
    let names: Vec<_> = set.rules().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["excessive_closing_costs", "no_escrow"]);
    assert_eq!(set.skipped().len(), 4);
    assert!(set
      .skipped()
      .iter()
      .any(|e| matches!(e, RuleError::UnknownKind { kind, .. } if kind == "vibes_check")));
    assert!(set
      .skipped()
      .iter()
      .any(|e| matches!(e, RuleError::Malformed { rule, .. } if rule == "bad_threshold")));
  }

  #[test]
  fn summary_counts_kinds_and_state() {
    let summary = RuleSet::from_yaml_str(RULES).unwrap().summary();
    assert_eq!(summary.total_rules, 6);
    assert_eq!(summary.enabled_rules, 1);
    assert_eq!(summary.disabled_rules, 1);
    assert_eq!(summary.skipped_rules, 4);
    assert_eq!(summary.rule_types.get("regex_absence"), Some(&1));
  }

  #[test]
  fn validation_reports_errors_and_warnings() {
    let v = RuleSet::from_yaml_str(RULES).unwrap().validate();
    assert!(!v.valid);
    assert_eq!(v.errors.len(), 4);

    let dupes = r#"
- name: same
  type: regex_presence
  pattern: a
  message: ""
- name: same
  type: regex_absence
  pattern: b
  message: "b"
"#;
    let v = RuleSet::from_yaml_str(dupes).unwrap().validate();
    assert!(v.valid);
    assert_eq!(v.warnings.len(), 2);
  }

  #[test]
  fn yaml_and_json_share_a_digest() {
    let yaml = "rules:\n  - name: a\n    type: regex_presence\n    pattern: x\n    message: m\n";
    let json = r#"{"rules": [{"message": "m", "name": "a", "pattern": "x", "type": "regex_presence"}]}"#;
    let a = RuleSet::from_yaml_str(yaml).unwrap();
    let b = RuleSet::from_json_str(json).unwrap();
    assert_eq!(a.digest(), b.digest());
    assert_eq!(a.digest().len(), 32);
    assert_ne!(a.digest(), RuleSet::empty().digest());
  }

  #[test]
  fn missing_rules_key_is_a_config_error() {
    assert!(matches!(
      RuleSet::from_yaml_str("version: 2\n"),
      Err(ConfigError::MissingRules)
    ));
    assert!(matches!(RuleSet::from_json_str("{"), Err(ConfigError::Json(_))));
  }

  #[test]
  fn missing_file_degrades_to_empty() {
    let err = RuleSet::load("/definitely/not/here.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(RuleSet::load_or_empty("/definitely/not/here.yaml").is_empty());
  }
}
