//! Rule definitions: the raw wire shape from rule files and the typed,
//! validated form the evaluators consume.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::extract;

/// Closing-costs amount used by the zero-closing-costs promise when the rule
/// does not supply its own pattern.
pub const CLOSING_COSTS_PATTERN: &str =
  r"(?:Total Closing Costs|closing costs?).*?\$([0-9,]+(?:\.[0-9]{2})?)";
const PURCHASE_PRICE_PATTERN: &str =
  r"(?:Sale Price|Purchase Price).*?\$([0-9,]+(?:\.[0-9]{2})?)";
const LOAN_AMOUNT_PATTERN: &str = r"Loan Amount.*?\$([0-9,]+(?:\.[0-9]{2})?)";
const TITLE_FEES_PATTERN: &str =
  r"(?:Owner.*?Title Insurance|Title.*?Policy).*?\$([0-9,]+(?:\.[0-9]{2})?)";
const ESCROW_FEES_PATTERN: &str = r"(?:Escrow|Settlement).*?Fee.*?\$([0-9,]+(?:\.[0-9]{2})?)";

const DEFAULT_TOLERANCE_PERCENTAGE: f64 = 5.0;

// ---------------------------------------------------------------------------
// Raw rule (rule file contract)
// ---------------------------------------------------------------------------

/// One rule exactly as written in the rule file. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRule {
  #[serde(default)]
  pub name: String,
  #[serde(default, rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub message: String,
  #[serde(default = "default_enabled")]
  pub enabled: bool,
  #[serde(default = "default_priority")]
  pub priority: i32,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pattern: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub threshold: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub operator: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub numerator_pattern: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub denominator_pattern: Option<String>,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub conditions: Vec<RawCondition>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub logic: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub primary_pattern: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub secondary_patterns: Vec<RawSecondary>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fuzzy_match: Option<bool>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub comparison_type: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub promise_type: Option<String>,
  #[serde(
    default,
    alias = "tolerance_percent",
    skip_serializing_if = "Option::is_none"
  )]
  pub tolerance_percentage: Option<f64>,
}

fn default_enabled() -> bool {
  true
}

fn default_priority() -> i32 {
  1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCondition {
  #[serde(default, rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub pattern: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub threshold: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub operator: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSecondary {
  #[serde(default)]
  pub pattern: String,
  #[serde(default = "default_service")]
  pub service: String,
}

fn default_service() -> String {
  "service".to_string()
}

// ---------------------------------------------------------------------------
// Typed rule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
  Gt,
  Lt,
  Ge,
  Le,
  Eq,
}

impl Operator {
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim() {
      ">" => Some(Self::Gt),
      "<" => Some(Self::Lt),
      ">=" => Some(Self::Ge),
      "<=" => Some(Self::Le),
      "==" => Some(Self::Eq),
      _ => None,
    }
  }

  pub fn compare(self, value: f64, threshold: f64) -> bool {
    match self {
      Self::Gt => value > threshold,
      Self::Lt => value < threshold,
      Self::Ge => value >= threshold,
      Self::Le => value <= threshold,
      Self::Eq => value == threshold,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
  And,
  Or,
}

/// Pattern with one numeric capture compared against a threshold.
#[derive(Debug, Clone)]
pub struct Threshold {
  pub pattern: Regex,
  pub threshold: f64,
  pub operator: Operator,
}

#[derive(Debug, Clone)]
pub enum Condition {
  Presence(Regex),
  Absence(Regex),
  Numeric(Threshold),
}

#[derive(Debug, Clone)]
pub struct Secondary {
  pub pattern: Regex,
  pub service: String,
}

#[derive(Debug, Clone)]
pub enum Promise {
  ZeroClosingCosts { pattern: Regex },
  TitleFees { pattern: Regex },
  EscrowFees { pattern: Regex },
}

#[derive(Debug, Clone)]
pub enum Comparison {
  PurchasePrice { pattern: Regex, tolerance_percentage: f64 },
  LoanAmount { pattern: Regex, tolerance_percentage: f64 },
  BrokenPromise(Promise),
  UnexpectedCharge { pattern: Regex },
}

/// Closed set of rule kinds, each carrying only the configuration it needs.
#[derive(Debug, Clone)]
pub enum RuleKind {
  NumericThreshold(Threshold),
  RegexPresence {
    pattern: Regex,
  },
  RegexAbsence {
    pattern: Regex,
  },
  RegexAmount(Threshold),
  CalculatedPercentage {
    numerator: Regex,
    denominator: Regex,
    threshold: f64,
    operator: Operator,
  },
  Compound {
    conditions: Vec<Condition>,
    logic: Logic,
  },
  CrossReference {
    primary: Regex,
    secondaries: Vec<Secondary>,
    fuzzy: bool,
  },
  ContextComparison(Comparison),
}

impl RuleKind {
  /// Name used in rule files and summaries.
  pub fn type_name(&self) -> &'static str {
    match self {
      Self::NumericThreshold(_) => "numeric_threshold",
      Self::RegexPresence { .. } => "regex_presence",
      Self::RegexAbsence { .. } => "regex_absence",
      Self::RegexAmount(_) => "regex_amount",
      Self::CalculatedPercentage { .. } => "calculated_percentage",
      Self::Compound { .. } => "compound_rule",
      Self::CrossReference { .. } => "cross_reference_pattern",
      Self::ContextComparison(_) => "context_comparison",
    }
  }
}

#[derive(Debug, Clone)]
pub struct Rule {
  pub name: String,
  pub message: String,
  pub enabled: bool,
  pub priority: i32,
  pub kind: RuleKind,
}

impl TryFrom<&RawRule> for Rule {
  type Error = RuleError;

  fn try_from(raw: &RawRule) -> Result<Self, RuleError> {
    let name = raw.name.trim();
    if name.is_empty() {
      return Err(RuleError::EmptyName);
    }
    let b = Builder { rule: name };

    let kind = match raw.kind.trim() {
      "numeric_threshold" => RuleKind::NumericThreshold(b.threshold(raw)?),
      "regex_amount" => RuleKind::RegexAmount(b.threshold(raw)?),
      "regex_presence" => RuleKind::RegexPresence {
        pattern: b.pattern("pattern", raw.pattern.as_deref(), true)?,
      },
      "regex_absence" => RuleKind::RegexAbsence {
        pattern: b.pattern("pattern", raw.pattern.as_deref(), false)?,
      },
      "calculated_percentage" => RuleKind::CalculatedPercentage {
        numerator: b.captures("numerator_pattern", raw.numerator_pattern.as_deref())?,
        denominator: b.captures("denominator_pattern", raw.denominator_pattern.as_deref())?,
        threshold: raw
          .threshold
          .ok_or_else(|| RuleError::missing(name, "threshold"))?,
        operator: b.operator(raw.operator.as_deref())?,
      },
      "compound_rule" => b.compound(raw)?,
      "cross_reference_pattern" => b.cross_reference(raw)?,
      "context_comparison" => RuleKind::ContextComparison(b.comparison(raw)?),
      other => {
        return Err(RuleError::UnknownKind {
          rule: name.to_string(),
          kind: other.to_string(),
        })
      }
    };

    Ok(Rule {
      name: name.to_string(),
      message: raw.message.clone(),
      enabled: raw.enabled,
      priority: raw.priority,
      kind,
    })
  }
}

/// Field-level validation helpers bound to one rule name for error context.
struct Builder<'a> {
  rule: &'a str,
}

impl Builder<'_> {
  fn pattern(&self, field: &str, raw: Option<&str>, dot_all: bool) -> Result<Regex, RuleError> {
    let source = raw
      .map(str::trim)
      .filter(|p| !p.is_empty())
      .ok_or_else(|| RuleError::missing(self.rule, field))?;
    extract::compile(source, dot_all).map_err(|e| RuleError::InvalidPattern {
      rule: self.rule.to_string(),
      field: field.to_string(),
      reason: e.to_string(),
    })
  }

  /// Pattern that must expose capture group 1 (the value).
  fn captures(&self, field: &str, raw: Option<&str>) -> Result<Regex, RuleError> {
    let re = self.pattern(field, raw, false)?;
    if re.captures_len() < 2 {
      return Err(RuleError::MissingCaptureGroup {
        rule: self.rule.to_string(),
        field: field.to_string(),
      });
    }
    Ok(re)
  }

  fn captures_or(&self, field: &str, raw: Option<&str>, fallback: &str) -> Result<Regex, RuleError> {
    let source = raw.filter(|p| !p.trim().is_empty()).unwrap_or(fallback);
    self.captures(field, Some(source))
  }

  fn operator(&self, raw: Option<&str>) -> Result<Operator, RuleError> {
    match raw {
      None => Ok(Operator::Gt),
      Some(op) => Operator::parse(op).ok_or_else(|| RuleError::InvalidOperator {
        rule: self.rule.to_string(),
        operator: op.to_string(),
      }),
    }
  }

  fn threshold(&self, raw: &RawRule) -> Result<Threshold, RuleError> {
    Ok(Threshold {
      pattern: self.captures("pattern", raw.pattern.as_deref())?,
      threshold: raw
        .threshold
        .ok_or_else(|| RuleError::missing(self.rule, "threshold"))?,
      operator: self.operator(raw.operator.as_deref())?,
    })
  }

  fn compound(&self, raw: &RawRule) -> Result<RuleKind, RuleError> {
    if raw.conditions.is_empty() {
      return Err(RuleError::missing(self.rule, "conditions"));
    }
    let logic = match raw.logic.as_deref().map(|l| l.trim().to_ascii_uppercase()) {
      None => Logic::And,
      Some(l) if l == "AND" => Logic::And,
      Some(l) if l == "OR" => Logic::Or,
      Some(l) => {
        return Err(RuleError::InvalidLogic {
          rule: self.rule.to_string(),
          logic: l,
        })
      }
    };

    let conditions = raw
      .conditions
      .iter()
      .map(|c| -> Result<Condition, RuleError> {
        let field = "conditions[].pattern";
        match c.kind.trim() {
          "regex_presence" => Ok(Condition::Presence(self.pattern(field, Some(&c.pattern), true)?)),
          "regex_absence" => Ok(Condition::Absence(self.pattern(field, Some(&c.pattern), false)?)),
          "numeric_threshold" => Ok(Condition::Numeric(Threshold {
            pattern: self.captures(field, Some(&c.pattern))?,
            threshold: c.threshold.unwrap_or(0.0),
            operator: self.operator(c.operator.as_deref())?,
          })),
          other => Err(RuleError::invalid_value(self.rule, "conditions[].type", other)),
        }
      })
      .collect::<Result<Vec<_>, RuleError>>()?;

    Ok(RuleKind::Compound { conditions, logic })
  }

  fn cross_reference(&self, raw: &RawRule) -> Result<RuleKind, RuleError> {
    let primary = self.captures("primary_pattern", raw.primary_pattern.as_deref())?;
    if raw.secondary_patterns.is_empty() {
      return Err(RuleError::missing(self.rule, "secondary_patterns"));
    }
    let secondaries = raw
      .secondary_patterns
      .iter()
      .map(|s| -> Result<Secondary, RuleError> {
        Ok(Secondary {
          pattern: self.captures("secondary_patterns[].pattern", Some(&s.pattern))?,
          service: s.service.clone(),
        })
      })
      .collect::<Result<Vec<_>, RuleError>>()?;

    Ok(RuleKind::CrossReference {
      primary,
      secondaries,
      fuzzy: raw.fuzzy_match.unwrap_or(true),
    })
  }

  fn comparison(&self, raw: &RawRule) -> Result<Comparison, RuleError> {
    let tolerance_percentage = raw
      .tolerance_percentage
      .unwrap_or(DEFAULT_TOLERANCE_PERCENTAGE);
    let pattern = raw.pattern.as_deref();

    let comparison_type = raw
      .comparison_type
      .as_deref()
      .map(str::trim)
      .ok_or_else(|| RuleError::missing(self.rule, "comparison_type"))?;

    match comparison_type {
      "purchase_price" | "price_mismatch" => Ok(Comparison::PurchasePrice {
        pattern: self.captures_or("pattern", pattern, PURCHASE_PRICE_PATTERN)?,
        tolerance_percentage,
      }),
      "loan_amount" | "loan_amount_mismatch" => Ok(Comparison::LoanAmount {
        pattern: self.captures_or("pattern", pattern, LOAN_AMOUNT_PATTERN)?,
        tolerance_percentage,
      }),
      "broken_promise" => {
        let promise_type = raw
          .promise_type
          .as_deref()
          .map(str::trim)
          .ok_or_else(|| RuleError::missing(self.rule, "promise_type"))?;
        let promise = match promise_type {
          "zero_closing_costs" => Promise::ZeroClosingCosts {
            pattern: self.captures_or("pattern", pattern, CLOSING_COSTS_PATTERN)?,
          },
          "title_fees" => Promise::TitleFees {
            pattern: self.captures_or("pattern", pattern, TITLE_FEES_PATTERN)?,
          },
          "escrow_fees" => Promise::EscrowFees {
            pattern: self.captures_or("pattern", pattern, ESCROW_FEES_PATTERN)?,
          },
          other => return Err(RuleError::invalid_value(self.rule, "promise_type", other)),
        };
        Ok(Comparison::BrokenPromise(promise))
      }
      "unexpected_charge" => Ok(Comparison::UnexpectedCharge {
        pattern: self.pattern("pattern", pattern, false)?,
      }),
      other => Err(RuleError::invalid_value(self.rule, "comparison_type", other)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn raw(kind: &str) -> RawRule {
    RawRule {
      name: "r1".into(),
      kind: kind.into(),
      message: "m".into(),
      enabled: true,
      priority: 1,
      ..RawRule::default()
    }
  }

  #[test]
  fn operator_defaults_to_greater_than() {
    let mut r = raw("numeric_threshold");
    r.pattern = Some(r"Fee \$([0-9,.]+)".into());
    r.threshold = Some(10.0);
    let rule = Rule::try_from(&r).unwrap();
    match rule.kind {
      RuleKind::NumericThreshold(t) => assert_eq!(t.operator, Operator::Gt),
      other => panic!("unexpected kind {:?}", other.type_name()),
    }
  }

  #[test]
  fn operator_comparisons() {
    assert!(Operator::Gt.compare(5000.01, 5000.0));
    assert!(!Operator::Gt.compare(5000.0, 5000.0));
    assert!(Operator::Ge.compare(5000.0, 5000.0));
    assert!(Operator::Lt.compare(1.0, 2.0));
    assert!(Operator::Le.compare(2.0, 2.0));
    assert!(Operator::Eq.compare(2.0, 2.0));
    assert_eq!(Operator::parse("=>"), None);
  }

  #[test]
  fn unknown_kind_is_rejected() {
    let err = Rule::try_from(&raw("vibes_check")).unwrap_err();
    assert!(matches!(err, RuleError::UnknownKind { .. }));
  }

  #[test]
  fn empty_name_is_rejected() {
    let mut r = raw("regex_presence");
    r.name = "  ".into();
    r.pattern = Some("x".into());
    assert_eq!(Rule::try_from(&r).unwrap_err(), RuleError::EmptyName);
  }

  #[test]
  fn threshold_rule_requires_capture_group() {
    let mut r = raw("numeric_threshold");
    r.pattern = Some(r"Total Closing Costs".into());
    r.threshold = Some(1.0);
    let err = Rule::try_from(&r).unwrap_err();
    assert!(matches!(err, RuleError::MissingCaptureGroup { .. }));
  }

  #[test]
  fn missing_pattern_is_rejected() {
    let mut r = raw("regex_absence");
    r.pattern = Some("   ".into());
    let err = Rule::try_from(&r).unwrap_err();
    assert_eq!(err, RuleError::missing("r1", "pattern"));
  }

  #[test]
  fn invalid_regex_is_rejected() {
    let mut r = raw("regex_presence");
    r.pattern = Some("(unclosed".into());
    assert!(matches!(
      Rule::try_from(&r).unwrap_err(),
      RuleError::InvalidPattern { .. }
    ));
  }

  #[test]
  fn compound_logic_parses_case_insensitively() {
    let mut r = raw("compound_rule");
    r.logic = Some("or".into());
    r.conditions = vec![RawCondition {
      kind: "regex_presence".into(),
      pattern: "foo".into(),
      ..RawCondition::default()
    }];
    match Rule::try_from(&r).unwrap().kind {
      RuleKind::Compound { logic, conditions } => {
        assert_eq!(logic, Logic::Or);
        assert_eq!(conditions.len(), 1);
      }
      other => panic!("unexpected kind {:?}", other.type_name()),
    }
  }

  #[test]
  fn comparison_falls_back_to_builtin_pattern() {
    let mut r = raw("context_comparison");
    r.comparison_type = Some("purchase_price".into());
    match Rule::try_from(&r).unwrap().kind {
      RuleKind::ContextComparison(Comparison::PurchasePrice {
        tolerance_percentage,
        ..
      }) => assert_eq!(tolerance_percentage, 5.0),
      other => panic!("unexpected kind {:?}", other.type_name()),
    }
  }

  #[test]
  fn raw_rule_parses_from_yaml() {
    let yaml = r#"
name: excessive_closing_costs
type: numeric_threshold
pattern: 'Total Closing Costs.*?\$([0-9,]+\.\d{2})'
threshold: 5000
message: "Closing costs of ${value} are excessive"
"#;
    let r: RawRule = serde_yaml::from_str(yaml).unwrap();
    assert!(r.enabled);
    assert_eq!(r.priority, 1);
    assert_eq!(r.threshold, Some(5000.0));
    assert!(Rule::try_from(&r).is_ok());
  }
}
