//! Checks of the document against what the buyer was told to expect.

use regex::Regex;

use super::{amount, promises, Candidate};
use crate::extract::{self, first_hit, format_currency, SNIPPET_RADIUS};
use crate::rule::{Comparison, Rule};
use crate::types::UserContext;

pub fn compare(rule: &Rule, comparison: &Comparison, text: &str, ctx: &UserContext) -> Vec<Candidate> {
  match comparison {
    Comparison::PurchasePrice {
      pattern,
      tolerance_percentage,
    } => expectation(rule, pattern, *tolerance_percentage, ctx.expected_purchase_price, text),
    Comparison::LoanAmount {
      pattern,
      tolerance_percentage,
    } => expectation(rule, pattern, *tolerance_percentage, ctx.expected_loan_amount, text),
    Comparison::BrokenPromise(promise) => promises::broken(rule, promise, ctx, text),
    Comparison::UnexpectedCharge { pattern } => pattern
      .find(text)
      .map(|m| Candidate {
        message: rule.message.clone(),
        snippet: extract::snippet(text, m.start(), m.end(), SNIPPET_RADIUS),
      })
      .into_iter()
      .collect(),
  }
}

/// Flags when the document amount strays from the expected one by strictly
/// more than `tolerance` percent. Expectations that are absent or not
/// positive are skipped.
fn expectation(
  rule: &Rule,
  pattern: &Regex,
  tolerance: f64,
  expected: Option<f64>,
  text: &str,
) -> Vec<Candidate> {
  let Some(expected) = expected.filter(|e| *e > 0.0) else {
    return Vec::new();
  };
  let Some(hit) = first_hit(pattern, text) else {
    return Vec::new();
  };
  let Some((actual, _)) = amount(&rule.name, &hit) else {
    return Vec::new();
  };

  let difference = (actual - expected).abs() * 100.0 / expected;
  if difference <= tolerance {
    return Vec::new();
  }

  let message = extract::render(
    &rule.message,
    &[
      ("{expected}", format_currency(expected)),
      ("{actual}", format_currency(actual)),
      ("{difference}", format!("{:.1}%", difference)),
    ],
  );
  vec![Candidate {
    message,
    snippet: extract::snippet(text, hit.start, hit.end, SNIPPET_RADIUS),
  }]
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::rule::{RawRule, RuleKind};

  fn comparison_rule(comparison_type: &str) -> Rule {
    let raw = RawRule {
      name: format!("{}_mismatch", comparison_type),
      kind: "context_comparison".into(),
      message: "Expected {expected}, document shows {actual} ({difference} off)".into(),
      enabled: true,
      priority: 1,
      comparison_type: Some(comparison_type.into()),
      ..RawRule::default()
    };
    Rule::try_from(&raw).unwrap()
  }

  fn run(rule: &Rule, text: &str, ctx: &UserContext) -> Vec<Candidate> {
    match &rule.kind {
      RuleKind::ContextComparison(c) => compare(rule, c, text, ctx),
      other => panic!("unexpected kind {}", other.type_name()),
    }
  }

  fn expecting_price(price: f64) -> UserContext {
    UserContext {
      expected_purchase_price: Some(price),
      ..UserContext::default()
    }
  }

  #[test]
  fn exact_tolerance_boundary_does_not_flag() {
    let r = comparison_rule("purchase_price");
    let ctx = expecting_price(400_000.0);
    assert!(run(&r, "Sale Price $420,000.00", &ctx).is_empty());
  }

  #[test]
  fn beyond_tolerance_flags_with_amounts() {
    let r = comparison_rule("purchase_price");
    let ctx = expecting_price(400_000.0);
    assert_eq!(run(&r, "Sale Price $421,000.00", &ctx).len(), 1);
    let found = run(&r, "Sale Price $421,500.00", &ctx);
    assert_eq!(
      found[0].message,
      "Expected $400,000.00, document shows $421,500.00 (5.4% off)"
    );
  }

  #[test]
  fn lower_amounts_count_too() {
    let r = comparison_rule("loan_amount");
    let ctx = UserContext {
      expected_loan_amount: Some(300_000.0),
      ..UserContext::default()
    };
    assert_eq!(run(&r, "Loan Amount $270,000", &ctx).len(), 1);
  }

  #[test]
  fn missing_expectation_is_skipped() {
    let r = comparison_rule("purchase_price");
    assert!(run(&r, "Sale Price $900,000.00", &UserContext::default()).is_empty());
    assert!(run(&r, "Sale Price $900,000.00", &expecting_price(0.0)).is_empty());
  }

  #[test]
  fn unexpected_charge_flags_first_match() {
    let raw = RawRule {
      name: "junk_fee".into(),
      kind: "context_comparison".into(),
      message: "Unexpected courier fee".into(),
      comparison_type: Some("unexpected_charge".into()),
      pattern: Some("Courier Fee".into()),
      ..RawRule::default()
    };
    let r = Rule::try_from(&raw).unwrap();
    let found = run(&r, "Courier Fee $50 ... Courier Fee $50", &UserContext::default());
    assert_eq!(found.len(), 1);
  }
}
