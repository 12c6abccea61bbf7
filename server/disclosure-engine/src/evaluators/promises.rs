//! Promises the buyer was given, checked against what the document charges.
//!
//! Two entry points: [`broken`] serves `context_comparison` rules with a
//! `promise_type`, and [`enhanced`] replaces the message of a few well-known
//! rule names when the context shows the buyer was promised otherwise.

use std::sync::LazyLock;

use regex::Regex;

use super::{amount, Candidate};
use crate::extract::{self, all_hits, compile, first_hit, SNIPPET_RADIUS};
use crate::rule::{Promise, Rule, CLOSING_COSTS_PATTERN};
use crate::types::UserContext;

/// Closing costs above this break a zero-closing-costs promise regardless of
/// any percentage tolerance.
pub const ZERO_COST_FLOOR: f64 = 500.0;

pub const ZERO_CLOSING_COSTS_RULE: &str = "zero_closing_costs_deception";
pub const CAPTIVE_SERVICES_RULE: &str = "builder_captive_services";
pub const BUYER_REPRESENTATION_RULE: &str = "missing_buyer_representation";

const REPRESENTATION_SNIPPET: &str = "Real Estate Broker (B): N/A";

static CLOSING_COSTS: LazyLock<Regex> =
  LazyLock::new(|| compile(CLOSING_COSTS_PATTERN, false).expect("static pattern compiles"));
static LENDER_NAME: LazyLock<Regex> =
  LazyLock::new(|| compile(r"Lender\b.*?([A-Z][A-Z ]+)", false).expect("static pattern compiles"));
static BUYER_BROKER_MISSING: LazyLock<Regex> =
  LazyLock::new(|| compile(r"Real Estate Broker \(B\).*?N/A", true).expect("static pattern compiles"));

/// `broken_promise` comparisons. Only promises the context says were made
/// are checked. Closing costs must exceed [`ZERO_COST_FLOOR`]; a title or
/// escrow charge breaks its promise as soon as it appears, whatever the amount.
pub fn broken(rule: &Rule, promise: &Promise, ctx: &UserContext, text: &str) -> Vec<Candidate> {
  let charge = match promise {
    Promise::ZeroClosingCosts { pattern } if ctx.promised_zero_closing_costs => {
      first_charge_above(&rule.name, pattern, ZERO_COST_FLOOR, text)
        .map(|(value, raw, snippet)| (value.to_string(), raw, snippet))
    }
    Promise::TitleFees { pattern } if ctx.builder_promised_to_cover_title_fees => {
      first_charge(pattern, text)
    }
    Promise::EscrowFees { pattern } if ctx.builder_promised_to_cover_escrow_fees => {
      first_charge(pattern, text)
    }
    _ => None,
  };

  charge
    .map(|(value, raw, snippet)| Candidate {
      message: extract::render(
        &rule.message,
        &[("${amount}", format!("${}", raw)), ("{amount}", value)],
      ),
      snippet,
    })
    .into_iter()
    .collect()
}

/// Context-specific message for the named rules, or `None` to let the rule
/// kind decide.
pub fn enhanced(rule: &Rule, text: &str, ctx: &UserContext) -> Option<Candidate> {
  match rule.name.as_str() {
    ZERO_CLOSING_COSTS_RULE if ctx.promised_zero_closing_costs => {
      let (_, raw, snippet) = first_charge_above(&rule.name, &CLOSING_COSTS, ZERO_COST_FLOOR, text)?;
      Some(Candidate {
        message: format!(
          "🚨 BROKEN PROMISE: You were specifically promised ZERO closing costs but are paying ${}",
          raw
        ),
        snippet,
      })
    }
    CAPTIVE_SERVICES_RULE if ctx.used_builders_preferred_lender => captive_lender(ctx, text),
    BUYER_REPRESENTATION_RULE if ctx.has_buyer_agent_representation => {
      if !BUYER_BROKER_MISSING.is_match(text) {
        return None;
      }
      let agent = ctx
        .buyer_agent_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("your agent");
      Some(Candidate {
        message: format!(
          "🚨 REPRESENTATION FRAUD: You thought {} was your buyer's agent but document shows N/A - you had no independent representation",
          agent
        ),
        snippet: REPRESENTATION_SNIPPET.to_string(),
      })
    }
    _ => None,
  }
}

fn captive_lender(ctx: &UserContext, text: &str) -> Option<Candidate> {
  let builder = ctx
    .builder_name
    .as_deref()
    .map(|b| b.trim().to_uppercase())
    .filter(|b| !b.is_empty())?;
  let lender = LENDER_NAME
    .captures(text)?
    .get(1)
    .map(|m| m.as_str().trim().to_uppercase())?;

  let shared = builder
    .split_whitespace()
    .filter(|w| w.chars().count() > 2)
    .any(|w| lender.contains(w));
  if !shared {
    return None;
  }
  Some(Candidate {
    message: format!(
      "🚨 CAPTIVE LENDER CONFIRMED: You used {}'s preferred lender ({}) - you likely paid inflated rates",
      builder, lender
    ),
    snippet: format!("Builder: {} | Lender: {}", builder, lender),
  })
}

/// First match of a charge pattern, parsed or not: (amount, raw digits, snippet).
fn first_charge(pattern: &Regex, text: &str) -> Option<(String, String, String)> {
  let hit = first_hit(pattern, text)?;
  let raw = hit.raw_digits().unwrap_or_default();
  let value = extract::parse_number(&raw).map_or_else(|| raw.clone(), |v| v.to_string());
  Some((value, raw, extract::snippet(text, hit.start, hit.end, SNIPPET_RADIUS)))
}

/// First amount strictly above `floor`: (value, raw digits, snippet).
fn first_charge_above(
  rule: &str,
  pattern: &Regex,
  floor: f64,
  text: &str,
) -> Option<(f64, String, String)> {
  all_hits(pattern, text).find_map(|hit| {
    let (value, raw) = amount(rule, &hit)?;
    (value > floor).then(|| {
      (value, raw, extract::snippet(text, hit.start, hit.end, SNIPPET_RADIUS))
    })
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::rule::RawRule;

  fn named(name: &str) -> Rule {
    let raw = RawRule {
      name: name.into(),
      kind: "regex_presence".into(),
      message: "generic".into(),
      enabled: true,
      pattern: Some("closing".into()),
      ..RawRule::default()
    };
    Rule::try_from(&raw).unwrap()
  }

  #[test]
  fn zero_cost_promise_uses_floor() {
    let rule = named(ZERO_CLOSING_COSTS_RULE);
    let ctx = UserContext {
      promised_zero_closing_costs: true,
      ..UserContext::default()
    };
    assert!(enhanced(&rule, "Total Closing Costs $450.00", &ctx).is_none());

    let found = enhanced(&rule, "Total Closing Costs $450.00\nTotal Closing Costs $7,850.00", &ctx)
      .unwrap();
    assert_eq!(
      found.message,
      "🚨 BROKEN PROMISE: You were specifically promised ZERO closing costs but are paying $7850.00"
    );
  }

  #[test]
  fn enhancement_needs_the_promise() {
    let rule = named(ZERO_CLOSING_COSTS_RULE);
    assert!(enhanced(&rule, "Total Closing Costs $7,850.00", &UserContext::default()).is_none());
  }

  #[test]
  fn captive_lender_shares_builder_word() {
    let rule = named(CAPTIVE_SERVICES_RULE);
    let ctx = UserContext {
      used_builders_preferred_lender: true,
      builder_name: Some("Lennar Homes".into()),
      ..UserContext::default()
    };
    let found = enhanced(&rule, "Lender: Lennar Mortgage LLC\nLoan Term 30 years", &ctx).unwrap();
    assert!(found.message.starts_with("🚨 CAPTIVE LENDER CONFIRMED: You used LENNAR HOMES's"));
    assert_eq!(found.snippet, "Builder: LENNAR HOMES | Lender: LENNAR MORTGAGE LLC");

    let other = enhanced(&rule, "Lender: First National Bank", &ctx);
    assert!(other.is_none());
  }

  #[test]
  fn representation_fraud_names_agent() {
    let rule = named(BUYER_REPRESENTATION_RULE);
    let ctx = UserContext {
      has_buyer_agent_representation: true,
      buyer_agent_name: Some("Pat Doe".into()),
      ..UserContext::default()
    };
    let text = "Real Estate Broker (B)\nName N/A";
    let found = enhanced(&rule, text, &ctx).unwrap();
    assert!(found.message.contains("You thought Pat Doe was your buyer's agent"));
    assert_eq!(found.snippet, REPRESENTATION_SNIPPET);

    assert!(enhanced(&rule, text, &UserContext::default()).is_none());
  }

  #[test]
  fn broken_title_promise_flags_any_charge() {
    let raw = RawRule {
      name: "title_fee_promise".into(),
      kind: "context_comparison".into(),
      message: "Builder promised title fees but you paid ${amount}".into(),
      comparison_type: Some("broken_promise".into()),
      promise_type: Some("title_fees".into()),
      ..RawRule::default()
    };
    let rule = Rule::try_from(&raw).unwrap();
    let promise = match &rule.kind {
      crate::rule::RuleKind::ContextComparison(crate::rule::Comparison::BrokenPromise(p)) => p.clone(),
      other => panic!("unexpected kind {}", other.type_name()),
    };
    let ctx = UserContext {
      builder_promised_to_cover_title_fees: true,
      ..UserContext::default()
    };
    let text = "Title - Owner's Title Policy $1,250.00";
    let found = broken(&rule, &promise, &ctx, text);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].message, "Builder promised title fees but you paid $1250.00");
    assert!(broken(&rule, &promise, &UserContext::default(), text).is_empty());

    let waived = broken(&rule, &promise, &ctx, "Owner's Title Insurance (optional) $0.00");
    assert_eq!(waived.len(), 1);
    assert_eq!(waived[0].message, "Builder promised title fees but you paid $0.00");
  }
}
