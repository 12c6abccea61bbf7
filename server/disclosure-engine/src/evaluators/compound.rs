use super::{amount, Candidate};
use crate::extract::{self, first_hit, MULTIPLE_CONDITIONS_SNIPPET, SNIPPET_RADIUS};
use crate::rule::{Condition, Logic, Rule};

/// `compound_rule`: sub-conditions combined with AND/OR. Every condition is
/// checked; the snippet comes from the first satisfied one with a location.
pub fn evaluate(rule: &Rule, conditions: &[Condition], logic: Logic, text: &str) -> Vec<Candidate> {
  let mut location: Option<(usize, usize)> = None;
  let mut satisfied = Vec::with_capacity(conditions.len());

  for condition in conditions {
    let (ok, at) = check(rule, condition, text);
    if ok && location.is_none() {
      location = at;
    }
    satisfied.push(ok);
  }

  let fires = match logic {
    Logic::And => satisfied.iter().all(|&ok| ok),
    Logic::Or => satisfied.iter().any(|&ok| ok),
  };
  if !fires {
    return Vec::new();
  }

  let snippet = match location {
    Some((start, end)) => extract::snippet(text, start, end, SNIPPET_RADIUS),
    None => MULTIPLE_CONDITIONS_SNIPPET.to_string(),
  };
  vec![Candidate {
    message: rule.message.clone(),
    snippet,
  }]
}

fn check(rule: &Rule, condition: &Condition, text: &str) -> (bool, Option<(usize, usize)>) {
  match condition {
    Condition::Presence(re) => match re.find(text) {
      Some(m) => (true, Some((m.start(), m.end()))),
      None => (false, None),
    },
    Condition::Absence(re) => (!re.is_match(text), None),
    Condition::Numeric(t) => {
      let Some(hit) = first_hit(&t.pattern, text) else {
        return (false, None);
      };
      match amount(&rule.name, &hit) {
        Some((value, _)) if t.operator.compare(value, t.threshold) => {
          (true, Some((hit.start, hit.end)))
        }
        _ => (false, None),
      }
    }
  }
}
