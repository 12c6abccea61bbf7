//! Severity from the rendered message text.
//!
//! Rules do not declare a severity; it is inferred from marker words in the
//! message. The classifier sits behind a trait so a rule-declared severity can
//! replace it without touching the evaluators.

use crate::types::Severity;

pub trait SeverityClassifier: Send + Sync {
  fn classify(&self, message: &str) -> Severity;
}

const HIGH_MARKERS: &[&str] = &["🚨", "critical", "error", "fraud"];
const MEDIUM_MARKERS: &[&str] = &["⚠️", "warning", "dangerous", "excessive"];

/// Case-insensitive substring match against fixed marker sets. High is
/// checked before medium; anything else is low.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl SeverityClassifier for KeywordClassifier {
  fn classify(&self, message: &str) -> Severity {
    let lowered = message.to_lowercase();
    let has_any = |markers: &[&str]| markers.iter().any(|m| lowered.contains(m));
    if has_any(HIGH_MARKERS) {
      Severity::High
    } else if has_any(MEDIUM_MARKERS) {
      Severity::Medium
    } else {
      Severity::Low
    }
  }
}
