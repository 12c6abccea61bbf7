//! Threshold comparisons on extracted amounts.

use regex::Regex;
use tracing::debug;

use super::{amount, Candidate};
use crate::extract::{self, all_hits, first_hit, SNIPPET_RADIUS};
use crate::rule::{Operator, Rule, Threshold};

const PERCENTAGE_SNIPPET_RADIUS: usize = 30;

/// `numeric_threshold` and `regex_amount`: every match whose value satisfies
/// the operator becomes a candidate.
pub fn threshold(rule: &Rule, t: &Threshold, text: &str) -> Vec<Candidate> {
  all_hits(&t.pattern, text)
    .filter_map(|hit| {
      let (value, raw) = amount(&rule.name, &hit)?;
      if !t.operator.compare(value, t.threshold) {
        return None;
      }
      Some(Candidate {
        message: extract::render(
          &rule.message,
          &[
            ("${value}", format!("${}", raw)),
            ("{value}", value.to_string()),
            ("{value_str}", raw),
          ],
        ),
        snippet: extract::snippet(text, hit.start, hit.end, SNIPPET_RADIUS),
      })
    })
    .collect()
}

/// `calculated_percentage`: first numerator match over first denominator match.
pub fn percentage(
  rule: &Rule,
  numerator: &Regex,
  denominator: &Regex,
  threshold: f64,
  operator: Operator,
  text: &str,
) -> Vec<Candidate> {
  let Some(num_hit) = first_hit(numerator, text) else {
    return Vec::new();
  };
  let Some((num, num_raw)) = amount(&rule.name, &num_hit) else {
    return Vec::new();
  };
  let Some(den_hit) = first_hit(denominator, text) else {
    return Vec::new();
  };
  let Some((den, den_raw)) = amount(&rule.name, &den_hit) else {
    return Vec::new();
  };

  if den == 0.0 {
    debug!(rule = %rule.name, "denominator is zero; no percentage");
    return Vec::new();
  }

  let pct = num / den * 100.0;
  if !operator.compare(pct, threshold) {
    return Vec::new();
  }

  let snippet = format!(
    "Numerator: {} | Denominator: {}",
    extract::snippet(text, num_hit.start, num_hit.end, PERCENTAGE_SNIPPET_RADIUS),
    extract::snippet(text, den_hit.start, den_hit.end, PERCENTAGE_SNIPPET_RADIUS),
  );
  let message = extract::render(
    &rule.message,
    &[
      ("{percentage}", format!("{:.2}", pct)),
      ("{numerator}", format!("${}", num_raw)),
      ("{denominator}", format!("${}", den_raw)),
    ],
  );
  vec![Candidate { message, snippet }]
}
