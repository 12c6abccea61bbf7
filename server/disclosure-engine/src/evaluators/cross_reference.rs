use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::Candidate;
use crate::error::EvalError;
use crate::extract::first_hit;
use crate::rule::{Rule, Secondary};

static ALL_CAPS_TOKEN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\b[A-Z]{2,}\b").expect("static pattern compiles"));

/// `cross_reference_pattern`: does a named party (builder, seller) reappear in
/// other fields (lender, title company)? One candidate naming every service
/// that matched.
pub fn evaluate(
  rule: &Rule,
  primary: &Regex,
  secondaries: &[Secondary],
  fuzzy: bool,
  text: &str,
) -> Result<Vec<Candidate>, EvalError> {
  let Some(hit) = first_hit(primary, text) else {
    return Ok(Vec::new());
  };
  let primary_value = hit
    .value
    .map(normalize)
    .ok_or_else(|| EvalError::missing_capture(&rule.name, "primary_pattern"))?;
  let keywords = keywords(&primary_value);

  let mut services = Vec::new();
  for secondary in secondaries {
    let Some(hit) = first_hit(&secondary.pattern, text) else {
      continue;
    };
    let value = hit
      .value
      .map(normalize)
      .ok_or_else(|| EvalError::missing_capture(&rule.name, "secondary_patterns[].pattern"))?;

    let matched = if fuzzy {
      keywords.iter().any(|k| value.contains(k.as_str()))
    } else {
      value == primary_value
    };
    if matched {
      services.push(secondary.service.as_str());
    }
  }

  if services.is_empty() {
    return Ok(Vec::new());
  }
  let services = services.join(", ");
  let message = rule
    .message
    .replace("{primary}", &primary_value)
    .replace("{services}", &services);
  let snippet = format!("Primary: {} | Matched services: {}", primary_value, services);
  Ok(vec![Candidate { message, snippet }])
}

fn normalize(raw: &str) -> String {
  raw.trim().to_uppercase()
}

/// All-caps tokens of two or more letters; failing that, any word longer
/// than two characters.
fn keywords(value: &str) -> BTreeSet<String> {
  let caps: BTreeSet<String> = ALL_CAPS_TOKEN
    .find_iter(value)
    .map(|m| m.as_str().to_string())
    .collect();
  if !caps.is_empty() {
    return caps;
  }
  value
    .split_whitespace()
    .filter(|w| w.chars().count() > 2)
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::rule::{RawRule, RuleKind};

  fn captive(fuzzy: bool) -> Rule {
    let yaml = format!(
      r#"
name: builder_affiliated_lender
type: cross_reference_pattern
primary_pattern: '(?m)Seller\s*:\s*([A-Za-z ]+?)\s*$'
fuzzy_match: {}
secondary_patterns:
  - pattern: '(?m)Lender\s*:\s*([A-Za-z ]+?)\s*$'
    service: lender
  - pattern: '(?m)Title Company\s*:\s*([A-Za-z ]+?)\s*$'
    service: title
message: "{{primary}} is tied to your {{services}}"
"#,
      fuzzy
    );
    let raw: RawRule = serde_yaml::from_str(&yaml).unwrap();
    Rule::try_from(&raw).unwrap()
  }

  fn run(rule: &Rule, text: &str) -> Result<Vec<Candidate>, EvalError> {
    match &rule.kind {
      RuleKind::CrossReference {
        primary,
        secondaries,
        fuzzy,
      } => evaluate(rule, primary, secondaries, *fuzzy, text),
      other => panic!("unexpected kind {}", other.type_name()),
    }
  }

  #[test]
  fn shared_keyword_links_builder_and_lender() {
    let r = captive(true);
    let text = "Seller: ABC Builder Corporation\nLender: ABC Mortgage Solutions\n";
    let found = run(&r, text).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].message, "ABC BUILDER CORPORATION is tied to your lender");
    assert_eq!(
      found[0].snippet,
      "Primary: ABC BUILDER CORPORATION | Matched services: lender"
    );
  }

  #[test]
  fn unrelated_lender_is_not_flagged() {
    let r = captive(true);
    let text = "Seller: ABC Builder Corporation\nLender: Unrelated Bank\n";
    assert!(run(&r, text).unwrap().is_empty());
  }

  #[test]
  fn exact_mode_needs_identical_names() {
    let r = captive(false);
    let partial = "Seller: ABC Builder Corporation\nLender: ABC Mortgage Solutions\n";
    assert!(run(&r, partial).unwrap().is_empty());
    let same = "Seller: ABC Homes\nLender: abc homes\nTitle Company: ABC Homes\n";
    let found = run(&r, same).unwrap();
    assert_eq!(found[0].snippet, "Primary: ABC HOMES | Matched services: lender, title");
  }

  #[test]
  fn keywords_fall_back_to_long_words() {
    assert_eq!(
      keywords("A 1 22 BUILDER").into_iter().collect::<Vec<_>>(),
      vec!["BUILDER".to_string()]
    );
    let fallback = keywords("A1 B2C3 Ö");
    assert!(fallback.contains("B2C3"));
    assert!(!fallback.contains("A1"));
  }
}
