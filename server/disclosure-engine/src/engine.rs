//! Orchestrator: runs an ordered rule list over one document and turns the
//! first candidate of each rule into a flag.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error, info};

use crate::config::ScoringConfig;
use crate::error::EvalError;
use crate::evaluators;
use crate::loader::RuleSet;
use crate::rule::Rule;
use crate::score;
use crate::severity::{KeywordClassifier, SeverityClassifier};
use crate::types::{Analysis, Flag, UserContext};

/// Shared analysis front end. The rule set is swapped whole on reload;
/// analyses in flight keep the snapshot they started with.
pub struct Engine {
  rules: RwLock<Arc<RuleSet>>,
  scoring: ScoringConfig,
  classifier: Box<dyn SeverityClassifier>,
}

impl Engine {
  pub fn new(rules: RuleSet, scoring: ScoringConfig) -> Self {
    Self {
      rules: RwLock::new(Arc::new(rules)),
      scoring,
      classifier: Box::new(KeywordClassifier),
    }
  }

  /// No rules, default scoring.
  pub fn with_defaults() -> Self {
    Self::new(RuleSet::empty(), ScoringConfig::default())
  }

  pub fn with_classifier(mut self, classifier: impl SeverityClassifier + 'static) -> Self {
    self.classifier = Box::new(classifier);
    self
  }

  /// Current rule set.
  pub fn rules(&self) -> Arc<RuleSet> {
    let guard = self.rules.read().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(&guard)
  }

  /// Install a new rule set and return the one it replaced.
  pub fn replace_rules(&self, rules: RuleSet) -> Arc<RuleSet> {
    let next = Arc::new(rules);
    let mut guard = self.rules.write().unwrap_or_else(PoisonError::into_inner);
    info!(
      rules = next.len(),
      digest = %next.digest(),
      previous = %guard.digest(),
      "rule set replaced"
    );
    std::mem::replace(&mut *guard, next)
  }

  pub fn analyze(&self, text: &str, context: Option<&UserContext>) -> Analysis {
    let rules = self.rules();
    let flags = analyze_with(text, rules.rules(), context, self.classifier.as_ref());
    let analytics = score::analytics(&flags, &self.scoring);
    debug!(
      flags = analytics.total_flags,
      score = analytics.forensic_score,
      "analysis complete"
    );
    Analysis {
      flags,
      analytics,
      rules_digest: rules.digest().to_string(),
    }
  }
}

impl Default for Engine {
  fn default() -> Self {
    Self::with_defaults()
  }
}

/// Evaluate `rules` in order with the keyword severity classifier.
pub fn analyze(text: &str, rules: &[Rule], context: Option<&UserContext>) -> Vec<Flag> {
  analyze_with(text, rules, context, &KeywordClassifier)
}

/// At most one flag per rule name: once a name has flagged, later rules with
/// the same name are not evaluated. A failing rule is logged and skipped.
pub fn analyze_with(
  text: &str,
  rules: &[Rule],
  context: Option<&UserContext>,
  classifier: &dyn SeverityClassifier,
) -> Vec<Flag> {
  let mut flagged: HashSet<&str> = HashSet::new();
  let mut flags = Vec::new();

  for rule in rules {
    if !rule.enabled || flagged.contains(rule.name.as_str()) {
      continue;
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
      evaluators::evaluate(rule, text, context)
    }))
    .unwrap_or_else(|payload| {
      Err(EvalError::Panicked {
        rule: rule.name.clone(),
        reason: panic_reason(payload.as_ref()),
      })
    });

    let candidates = match outcome {
      Ok(candidates) => candidates,
      Err(e) => {
        error!(rule = %rule.name, kind = rule.kind.type_name(), error = %e, "rule evaluation failed");
        continue;
      }
    };

    if let Some(first) = candidates.into_iter().next() {
      let severity = classifier.classify(&first.message);
      flags.push(Flag {
        rule: rule.name.clone(),
        message: first.message,
        snippet: first.snippet,
        severity,
      });
      flagged.insert(rule.name.as_str());
    }
  }

  flags
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    s.to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic".to_string()
  }
}
