use regex::Regex;

use super::Candidate;
use crate::extract::{self, NOT_FOUND_SNIPPET, SNIPPET_RADIUS};
use crate::rule::Rule;

/// `regex_presence`: one candidate per match, message used verbatim.
pub fn found(rule: &Rule, pattern: &Regex, text: &str) -> Vec<Candidate> {
  pattern
    .find_iter(text)
    .map(|m| Candidate {
      message: rule.message.clone(),
      snippet: extract::snippet(text, m.start(), m.end(), SNIPPET_RADIUS),
    })
    .collect()
}

/// `regex_absence`: a single candidate when the pattern never matches.
pub fn absent(rule: &Rule, pattern: &Regex, text: &str) -> Vec<Candidate> {
  if pattern.is_match(text) {
    return Vec::new();
  }
  vec![Candidate {
    message: rule.message.clone(),
    snippet: NOT_FOUND_SNIPPET.to_string(),
  }]
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::rule::{RawRule, RuleKind};

  fn pattern_rule(kind: &str, pattern: &str) -> Rule {
    let raw = RawRule {
      name: "p".into(),
      kind: kind.into(),
      message: "Prepayment penalty present".into(),
      enabled: true,
      priority: 1,
      pattern: Some(pattern.into()),
      ..RawRule::default()
    };
    Rule::try_from(&raw).unwrap()
  }

  fn regex_of(rule: &Rule) -> &Regex {
    match &rule.kind {
      RuleKind::RegexPresence { pattern } | RuleKind::RegexAbsence { pattern } => pattern,
      other => panic!("unexpected kind {}", other.type_name()),
    }
  }

  #[test]
  fn presence_flags_each_match_case_insensitively() {
    let r = pattern_rule("regex_presence", "prepayment penalty");
    let found = found(&r, regex_of(&r), "PREPAYMENT PENALTY: Yes. prepayment penalty applies");
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].message, "Prepayment penalty present");
  }

  #[test]
  fn presence_spans_lines() {
    let r = pattern_rule("regex_presence", r"Broker \(B\).*?N/A");
    assert_eq!(found(&r, regex_of(&r), "Broker (B)\n\nN/A").len(), 1);
  }

  #[test]
  fn absence_flags_only_when_missing() {
    let r = pattern_rule("regex_absence", "Loan Estimate");
    assert!(absent(&r, regex_of(&r), "see loan estimate").is_empty());
    let missing = absent(&r, regex_of(&r), "nothing here");
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].snippet, NOT_FOUND_SNIPPET);
  }
}
