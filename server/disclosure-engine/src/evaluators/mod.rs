//! One evaluator per rule kind. Each is a pure function of (rule, text,
//! context) returning zero or more candidate findings; the orchestrator keeps
//! the first.

mod compound;
mod context;
mod cross_reference;
mod numeric;
mod presence;
mod promises;

use tracing::debug;

use crate::error::EvalError;
use crate::extract::{self, Hit};
use crate::rule::{Rule, RuleKind};
use crate::types::UserContext;

/// A finding before severity classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
  pub message: String,
  pub snippet: String,
}

/// Dispatch a rule to its evaluator.
///
/// With a context, a named promise check may supply the single message for the
/// rule; otherwise the rule kind decides.
pub fn evaluate(
  rule: &Rule,
  text: &str,
  context: Option<&UserContext>,
) -> Result<Vec<Candidate>, EvalError> {
  if let Some(ctx) = context {
    if let Some(candidate) = promises::enhanced(rule, text, ctx) {
      return Ok(vec![candidate]);
    }
  }

  let candidates = match &rule.kind {
    RuleKind::NumericThreshold(t) | RuleKind::RegexAmount(t) => numeric::threshold(rule, t, text),
    RuleKind::RegexPresence { pattern } => presence::found(rule, pattern, text),
    RuleKind::RegexAbsence { pattern } => presence::absent(rule, pattern, text),
    RuleKind::CalculatedPercentage {
      numerator,
      denominator,
      threshold,
      operator,
    } => numeric::percentage(rule, numerator, denominator, *threshold, *operator, text),
    RuleKind::Compound { conditions, logic } => compound::evaluate(rule, conditions, *logic, text),
    RuleKind::CrossReference {
      primary,
      secondaries,
      fuzzy,
    } => cross_reference::evaluate(rule, primary, secondaries, *fuzzy, text)?,
    RuleKind::ContextComparison(comparison) => match context {
      Some(ctx) => context::compare(rule, comparison, text, ctx),
      None => Vec::new(),
    },
  };
  Ok(candidates)
}

/// Parsed value of a hit plus its separator-free digits. Unparseable values
/// are skipped, not errors.
fn amount(rule: &str, hit: &Hit<'_>) -> Option<(f64, String)> {
  let raw = hit.raw_digits()?;
  match extract::parse_number(&raw) {
    Some(value) => Some((value, raw)),
    None => {
      debug!(rule, raw = %raw, "skipping unparseable amount");
      None
    }
  }
}
