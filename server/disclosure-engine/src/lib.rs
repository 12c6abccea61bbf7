//! Closing-disclosure rule engine: deterministic, rule-based.
//!
//! Runs a configurable list of pattern rules over the extracted text of a
//! mortgage closing disclosure, optionally against what the buyer was
//! promised, and emits flags plus a 0-100 forensic score.
//!
//! No AI, no DB, no network; pure computation over an immutable rule set.

pub mod config;
pub mod engine;
pub mod error;
mod evaluators;
pub mod extract;
pub mod loader;
pub mod rule;
pub mod score;
pub mod severity;
pub mod telemetry;
pub mod types;

pub use config::{EngineConfig, ScoringConfig};
pub use engine::{analyze, analyze_with, Engine};
pub use error::{ConfigError, EvalError, RuleError, TelemetryError};
pub use loader::{RuleSet, RulesSummary, Validation};
pub use rule::{RawRule, Rule, RuleKind};
pub use severity::{KeywordClassifier, SeverityClassifier};
pub use types::{AnalyzeInput, Analysis, Analytics, Flag, RiskLevel, Severity, UserContext};
